use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket id as assigned by the ticket backend.
pub type TicketId = u64;

/// Status of a support ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Open,
    Pending,
    Hold,
    Solved,
    /// Any status string the backend sends that is not listed above.
    #[serde(other)]
    Unknown,
}

/// One support ticket as returned by a poll.
///
/// Fields beyond these three are ignored when decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub status: TicketStatus,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// `(id, updated_at)` pair identifying one logical revision of a ticket.
    pub fn revision(&self) -> (TicketId, DateTime<Utc>) {
        (self.id, self.updated_at)
    }
}

impl AsRef<Ticket> for Ticket {
    fn as_ref(&self) -> &Ticket {
        self
    }
}

/// A ticket from the newest snapshot together with its arrival flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    #[serde(rename = "isNewArrival")]
    pub is_new_arrival: bool,
}

impl TrackedTicket {
    /// Wraps a ticket that is known from the previous snapshot.
    pub fn settled(ticket: Ticket) -> Self {
        Self {
            ticket,
            is_new_arrival: false,
        }
    }

    /// Wraps a ticket that changed or appeared since the previous snapshot.
    pub fn arrived(ticket: Ticket) -> Self {
        Self {
            ticket,
            is_new_arrival: true,
        }
    }
}

impl AsRef<Ticket> for TrackedTicket {
    fn as_ref(&self) -> &Ticket {
        &self.ticket
    }
}

/// One complete poll result.
///
/// A snapshot replaces its predecessor wholesale. `seq` is the request sequence
/// number of the poll that produced it and doubles as its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    seq: u64,
    tickets: Vec<Ticket>,
}

impl Snapshot {
    pub fn new(seq: u64, tickets: Vec<Ticket>) -> Self {
        Self { seq, tickets }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
