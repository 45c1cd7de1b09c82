#![forbid(unsafe_code)]

//! Ticket triage for the info screen: categorization, bounded columns,
//! arrival tracking and the refresh state machine.
//!
//! Everything in this crate is synchronous and free of I/O. The daemon owns the
//! timers and HTTP calls and feeds results into [`session::TriageSession`].

pub mod arrivals;
pub mod bounded;
pub mod categorize;
pub mod error;
pub mod model;
pub mod session;

pub use arrivals::mark_arrivals;
pub use bounded::{bound, BoundedView, Overflow};
pub use categorize::{bucket_of, categorize, categorize_at, Bucket, Buckets};
pub use error::FetchError;
pub use model::{Snapshot, Ticket, TicketId, TicketStatus, TrackedTicket};
pub use session::{
    ApplyOutcome, FailureInfo, FailurePolicy, PollSeq, SessionSettings, TriageBoard,
    TriageSession, TriageView, DEFAULT_CAPACITY,
};
