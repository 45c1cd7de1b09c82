//! Timer-driven refresh loop around [`TriageSession`].
//!
//! Every tick starts one fetch on its own task; results come back through a
//! `JoinSet` and are applied by the loop alone, so the session is never touched
//! concurrently. Stale results are dropped by the session's sequence check,
//! and fetches overtaken by a newer applied result are aborted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use info_screen_core::{
    ApplyOutcome, FetchError, PollSeq, SessionSettings, Ticket, TriageSession, TriageView,
};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::source::TicketSource;

type PollResult = (PollSeq, Result<Vec<Ticket>, FetchError>);

/// Owned handle to a running session. Stopping (or dropping) it cancels the
/// timer and any in-flight fetch.
#[derive(Debug)]
pub struct SessionHandle {
    view: watch::Receiver<TriageView>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Receiver that sees one update per completed cycle.
    pub fn subscribe(&self) -> watch::Receiver<TriageView> {
        self.view.clone()
    }

    pub fn view(&self) -> TriageView {
        self.view.borrow().clone()
    }

    /// Stops the session and waits for the loop to exit. No view update is
    /// published after this returns.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "triage session task ended abnormally");
        }
    }
}

/// Starts polling `source` every `every`, first poll immediately.
///
/// # Panics
///
/// Panics if `every` is zero, or when called outside a tokio runtime.
pub fn start<S: TicketSource>(source: S, settings: SessionSettings, every: Duration) -> SessionHandle {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let (view_tx, view_rx) = watch::channel(TriageView::Loading);
    let (stop_tx, stop_rx) = watch::channel(false);
    let session = TriageSession::new(settings);
    let task = tokio::spawn(run(Arc::new(source), session, tick, view_tx, stop_rx));
    SessionHandle {
        view: view_rx,
        stop: stop_tx,
        task,
    }
}

async fn run<S: TicketSource>(
    source: Arc<S>,
    mut session: TriageSession,
    mut tick: Interval,
    view_tx: watch::Sender<TriageView>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut in_flight: JoinSet<PollResult> = JoinSet::new();
    let mut pending: BTreeMap<PollSeq, AbortHandle> = BTreeMap::new();

    info!(
        every_secs = tick.period().as_secs(),
        capacity = session.settings().capacity,
        "triage session started"
    );
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            Some(joined) = in_flight.join_next() => match joined {
                Ok((seq, result)) => {
                    pending.remove(&seq);
                    if let Err(err) = &result {
                        warn!(seq = seq.get(), error = %err, "ticket poll failed");
                    }
                    if session.apply(seq, result) == ApplyOutcome::Applied {
                        view_tx.send_replace(session.view().clone());
                        abort_older(&mut pending, seq);
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!(error = %e, "ticket poll task failed"),
            },
            _ = tick.tick() => {
                let seq = session.begin_poll();
                let source = Arc::clone(&source);
                let handle = in_flight.spawn(async move { (seq, source.poll_tickets().await) });
                pending.insert(seq, handle);
                debug!(seq = seq.get(), in_flight = in_flight.len(), "ticket poll started");
            }
        }
    }

    session.close();
    in_flight.abort_all();
    info!("triage session stopped");
}

/// Aborts fetches started before `applied`; their results would be discarded.
fn abort_older(pending: &mut BTreeMap<PollSeq, AbortHandle>, applied: PollSeq) {
    let newer = pending.split_off(&applied);
    for (seq, handle) in std::mem::replace(pending, newer) {
        debug!(seq = seq.get(), "aborting superseded ticket poll");
        handle.abort();
    }
}
