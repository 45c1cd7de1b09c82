//! Refresh state machine behind the ticket columns.
//!
//! `Loading → Ready ↔ Failed`, driven by poll results. The session never
//! schedules anything itself: the owner calls [`TriageSession::begin_poll`]
//! when it starts a fetch and hands the outcome back to
//! [`TriageSession::apply`]. Outcomes are tagged with the [`PollSeq`] so a slow
//! response can never overwrite a newer one.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arrivals::mark_arrivals;
use crate::bounded::{bound, BoundedView};
use crate::categorize::{categorize_at, Buckets};
use crate::error::FetchError;
use crate::model::{Snapshot, Ticket, TrackedTicket};

/// Tickets shown per column unless configured otherwise.
pub const DEFAULT_CAPACITY: i64 = 5;

/// What a failed poll does to the last good board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Drop the board and show the failure.
    #[default]
    Clear,
    /// Keep showing the last good board; the failure is only logged.
    KeepLastGood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Column capacity passed to [`bound`].
    pub capacity: i64,
    pub failure_policy: FailurePolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            failure_policy: FailurePolicy::Clear,
        }
    }
}

/// The three bounded columns derived from one snapshot.
pub type TriageBoard = Buckets<BoundedView<TrackedTicket>>;

/// Diagnostic detail of a failed poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Read-only view handed to the display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TriageView {
    #[default]
    Loading,
    Ready(TriageBoard),
    Failed(FailureInfo),
}

impl TriageView {
    pub fn board(&self) -> Option<&TriageBoard> {
        match self {
            TriageView::Ready(board) => Some(board),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureInfo> {
        match self {
            TriageView::Failed(info) => Some(info),
            _ => None,
        }
    }
}

/// Sequence number of a started poll. Later polls compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollSeq(u64);

impl PollSeq {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Result of handing a poll outcome to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The view was updated.
    Applied,
    /// A newer poll was already applied, or the sequence was never issued.
    Discarded,
    /// The session was closed; nothing changes any more.
    Closed,
}

#[derive(Debug)]
pub struct TriageSession {
    settings: SessionSettings,
    view: TriageView,
    current: Option<Snapshot>,
    next_seq: u64,
    last_applied: Option<PollSeq>,
    closed: bool,
}

impl TriageSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            view: TriageView::Loading,
            current: None,
            next_seq: 0,
            last_applied: None,
            closed: false,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn view(&self) -> &TriageView {
        &self.view
    }

    /// Snapshot the next arrival comparison will run against.
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// Registers a new poll and returns its sequence number.
    pub fn begin_poll(&mut self) -> PollSeq {
        let seq = PollSeq(self.next_seq);
        self.next_seq += 1;
        seq
    }

    /// Applies a poll outcome using the local clock for "today".
    pub fn apply(
        &mut self,
        seq: PollSeq,
        result: Result<Vec<Ticket>, FetchError>,
    ) -> ApplyOutcome {
        self.apply_at(seq, result, &Local::now())
    }

    /// Applies a poll outcome as seen at `now`.
    pub fn apply_at<Tz: TimeZone>(
        &mut self,
        seq: PollSeq,
        result: Result<Vec<Ticket>, FetchError>,
        now: &DateTime<Tz>,
    ) -> ApplyOutcome {
        if self.closed {
            debug!(seq = seq.0, "session closed; dropping poll result");
            return ApplyOutcome::Closed;
        }
        let superseded = self.last_applied.is_some_and(|last| seq <= last);
        if superseded || seq.0 >= self.next_seq {
            debug!(seq = seq.0, last_applied = ?self.last_applied, "discarding stale poll result");
            return ApplyOutcome::Discarded;
        }
        self.last_applied = Some(seq);

        match result {
            Ok(tickets) => self.accept(Snapshot::new(seq.0, tickets), now),
            Err(err) => self.reject(&err),
        }
        ApplyOutcome::Applied
    }

    /// Stops accepting results. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn accept<Tz: TimeZone>(&mut self, snapshot: Snapshot, now: &DateTime<Tz>) {
        let previous = self.current.take();
        let tracked = mark_arrivals(previous.as_ref(), &snapshot);
        let capacity = self.settings.capacity;
        let board = categorize_at(&tracked, now).map(|column| bound(column, capacity));

        debug!(
            seq = snapshot.seq(),
            tickets = snapshot.len(),
            arrivals = tracked.iter().filter(|t| t.is_new_arrival).count(),
            "snapshot applied"
        );
        self.view = TriageView::Ready(board);
        self.current = Some(snapshot);
    }

    fn reject(&mut self, err: &FetchError) {
        if self.settings.failure_policy == FailurePolicy::KeepLastGood
            && matches!(self.view, TriageView::Ready(_))
        {
            debug!(error = %err, "poll failed; keeping last good board");
            return;
        }
        debug!(error = %err, "poll failed; clearing board");
        self.current = None;
        self.view = TriageView::Failed(err.failure_info());
    }
}

impl Default for TriageSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded::Overflow;
    use crate::model::TicketStatus;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().unwrap()
    }

    fn open(id: u64, updated_at: &str) -> Ticket {
        Ticket {
            id,
            status: TicketStatus::Open,
            updated_at: updated_at.parse().unwrap(),
        }
    }

    fn unavailable() -> FetchError {
        FetchError::Status {
            status: 503,
            status_text: Some("Service Unavailable".into()),
        }
    }

    fn poll(session: &mut TriageSession, result: Result<Vec<Ticket>, FetchError>) -> ApplyOutcome {
        let seq = session.begin_poll();
        session.apply_at(seq, result, &now())
    }

    #[test]
    fn starts_loading() {
        let session = TriageSession::default();
        assert_eq!(session.view(), &TriageView::Loading);
        assert!(session.current_snapshot().is_none());
    }

    #[test]
    fn loading_to_failed_on_first_error() {
        let mut session = TriageSession::default();
        assert_eq!(poll(&mut session, Err(unavailable())), ApplyOutcome::Applied);
        assert_eq!(session.view().failure().and_then(|f| f.status), Some(503));
    }

    #[test]
    fn later_poll_flags_arrivals_against_previous() {
        let mut session = TriageSession::default();
        poll(&mut session, Ok(vec![open(1, "2024-03-01T09:00:00Z")]));
        poll(
            &mut session,
            Ok(vec![
                open(1, "2024-03-01T09:00:00Z"),
                open(2, "2024-03-01T11:00:00Z"),
            ]),
        );

        let board = session.view().board().unwrap();
        let flags: Vec<_> = board
            .open
            .items
            .iter()
            .map(|t| (t.ticket.id, t.is_new_arrival))
            .collect();
        assert_eq!(flags, vec![(1, false), (2, true)]);
    }

    #[test]
    fn older_response_never_overwrites_newer() {
        let mut session = TriageSession::default();
        let slow = session.begin_poll();
        let fast = session.begin_poll();

        let applied = session.apply_at(fast, Ok(vec![open(2, "2024-03-01T09:00:00Z")]), &now());
        assert_eq!(applied, ApplyOutcome::Applied);

        let late = session.apply_at(slow, Err(unavailable()), &now());
        assert_eq!(late, ApplyOutcome::Discarded);
        assert_eq!(session.view().board().unwrap().open.items[0].ticket.id, 2);
    }

    #[test]
    fn unissued_sequence_is_discarded() {
        let mut session = TriageSession::default();
        let outcome = session.apply_at(PollSeq(7), Ok(vec![]), &now());
        assert_eq!(outcome, ApplyOutcome::Discarded);
        assert_eq!(session.view(), &TriageView::Loading);
    }

    #[test]
    fn closed_session_ignores_results() {
        let mut session = TriageSession::default();
        let seq = session.begin_poll();
        session.close();
        assert_eq!(
            session.apply_at(seq, Ok(vec![open(1, "2024-03-01T09:00:00Z")]), &now()),
            ApplyOutcome::Closed
        );
        assert_eq!(session.view(), &TriageView::Loading);
    }

    #[test]
    fn keep_last_good_policy_retains_board_and_arrival_baseline() {
        let mut session = TriageSession::new(SessionSettings {
            failure_policy: FailurePolicy::KeepLastGood,
            ..SessionSettings::default()
        });
        poll(&mut session, Ok(vec![open(1, "2024-03-01T09:00:00Z")]));
        poll(&mut session, Err(unavailable()));

        assert!(session.view().board().is_some());
        assert!(session.current_snapshot().is_some());

        poll(
            &mut session,
            Ok(vec![
                open(1, "2024-03-01T09:00:00Z"),
                open(2, "2024-03-01T11:30:00Z"),
            ]),
        );
        let board = session.view().board().unwrap();
        let flags: Vec<_> = board.open.items.iter().map(|t| t.is_new_arrival).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn keep_last_good_still_fails_without_a_board() {
        let mut session = TriageSession::new(SessionSettings {
            failure_policy: FailurePolicy::KeepLastGood,
            ..SessionSettings::default()
        });
        poll(&mut session, Err(FetchError::Transport("refused".into())));
        assert!(session.view().failure().is_some());
    }

    #[test]
    fn capacity_is_applied_per_column() {
        let mut session = TriageSession::new(SessionSettings {
            capacity: 2,
            ..SessionSettings::default()
        });
        poll(
            &mut session,
            Ok((1..=4).map(|id| open(id, "2024-03-01T09:00:00Z")).collect()),
        );
        let board = session.view().board().unwrap();
        assert_eq!(board.open.len(), 2);
        assert_eq!(board.open.overflow, Overflow::Count(2));
        assert_eq!(board.pending.overflow, Overflow::None);
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let mut session = TriageSession::default();
        poll(&mut session, Ok(vec![open(1, "2024-03-01T09:00:00Z")]));
        let value = serde_json::to_value(session.view()).unwrap();
        assert_eq!(value["state"], "ready");
        assert_eq!(value["open"]["overflow"], 0);
        assert_eq!(value["open"]["items"][0]["id"], 1);
        assert!(value["solvedToday"]["items"].as_array().unwrap().is_empty());

        poll(&mut session, Err(unavailable()));
        let value = serde_json::to_value(session.view()).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["status"], 503);
    }
}
