use std::collections::HashSet;

use crate::model::{Snapshot, TrackedTicket};

/// Flags every ticket in `current` whose `(id, updated_at)` revision is absent
/// from `previous`.
///
/// Without a previous snapshot nothing is flagged. A status change that did not
/// bump `updated_at` is not an arrival.
pub fn mark_arrivals(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<TrackedTicket> {
    let Some(previous) = previous else {
        return current
            .tickets()
            .iter()
            .cloned()
            .map(TrackedTicket::settled)
            .collect();
    };

    let known: HashSet<_> = previous.tickets().iter().map(|t| t.revision()).collect();
    current
        .tickets()
        .iter()
        .map(|t| TrackedTicket {
            is_new_arrival: !known.contains(&t.revision()),
            ticket: t.clone(),
        })
        .collect()
}
