//! Partitioning of a snapshot into the three display columns.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::{Ticket, TicketStatus};

/// Column a ticket is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// `new` or `open`.
    Open,
    /// `pending`.
    Pending,
    /// `solved`, last updated on the current local calendar day.
    SolvedToday,
}

/// The three columns, each holding a `C` (a plain list or a bounded view).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buckets<C> {
    pub open: C,
    pub pending: C,
    pub solved_today: C,
}

impl<C> Buckets<C> {
    /// Applies `f` to every column, keeping column identity.
    pub fn map<D>(self, mut f: impl FnMut(C) -> D) -> Buckets<D> {
        Buckets {
            open: f(self.open),
            pending: f(self.pending),
            solved_today: f(self.solved_today),
        }
    }

    pub fn get(&self, bucket: Bucket) -> &C {
        match bucket {
            Bucket::Open => &self.open,
            Bucket::Pending => &self.pending,
            Bucket::SolvedToday => &self.solved_today,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut C {
        match bucket {
            Bucket::Open => &mut self.open,
            Bucket::Pending => &mut self.pending,
            Bucket::SolvedToday => &mut self.solved_today,
        }
    }
}

impl<T> Buckets<Vec<T>> {
    /// Number of tickets across all columns.
    pub fn total(&self) -> usize {
        self.open.len() + self.pending.len() + self.solved_today.len()
    }
}

/// Column for `ticket` as seen at `now`, or `None` when it is not displayed.
///
/// "Today" is the calendar date of `now` in `now`'s own time zone; the ticket's
/// timestamp is converted into that zone before comparing dates.
pub fn bucket_of<Tz: TimeZone>(ticket: &Ticket, now: &DateTime<Tz>) -> Option<Bucket> {
    match ticket.status {
        TicketStatus::New | TicketStatus::Open => Some(Bucket::Open),
        TicketStatus::Pending => Some(Bucket::Pending),
        TicketStatus::Solved => {
            let updated = ticket.updated_at.with_timezone(&now.timezone());
            (updated.date_naive() == now.date_naive()).then_some(Bucket::SolvedToday)
        }
        TicketStatus::Hold | TicketStatus::Unknown => None,
    }
}

/// Partitions `tickets` using the local clock for "today".
pub fn categorize<T>(tickets: &[T]) -> Buckets<Vec<T>>
where
    T: AsRef<Ticket> + Clone,
{
    categorize_at(tickets, &Local::now())
}

/// Stable partition of `tickets` into columns as seen at `now`.
pub fn categorize_at<T, Tz>(tickets: &[T], now: &DateTime<Tz>) -> Buckets<Vec<T>>
where
    T: AsRef<Ticket> + Clone,
    Tz: TimeZone,
{
    let mut buckets: Buckets<Vec<T>> = Buckets::default();
    for item in tickets {
        if let Some(bucket) = bucket_of(item.as_ref(), now) {
            buckets.get_mut(bucket).push(item.clone());
        }
    }
    buckets
}
