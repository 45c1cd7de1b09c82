//! Booking-count poller. The counts are echoed as-is; failed polls keep the
//! last known values.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::feed::Feed;

/// Payload of the bookings endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCounts {
    pub daily_bookings: u64,
    pub yesterday_bookings: u64,
}

/// What the display gets for the booking panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingBoard {
    #[serde(flatten)]
    pub counts: BookingCounts,
    /// Last successful poll.
    pub updated_at: Option<DateTime<Utc>>,
    /// When today's count last changed to a non-zero value. The display runs
    /// its celebration effect for a while after this.
    pub celebrate_since: Option<DateTime<Utc>>,
}

impl BookingBoard {
    /// Records a successful poll. Returns true when it starts a celebration.
    pub fn record(&mut self, counts: BookingCounts, at: DateTime<Utc>) -> bool {
        let celebrate =
            counts.daily_bookings > 0 && counts.daily_bookings != self.counts.daily_bookings;
        if celebrate {
            self.celebrate_since = Some(at);
        }
        self.counts = counts;
        self.updated_at = Some(at);
        celebrate
    }
}

pub async fn fetch_booking_counts(client: &Client, url: &str) -> Result<BookingCounts> {
    let counts = client
        .get(url)
        .send()
        .await
        .context("bookings request")?
        .error_for_status()
        .context("bookings status")?
        .json::<BookingCounts>()
        .await
        .context("bookings decode")?;
    Ok(counts)
}

/// Polls `url` every `every` (first poll immediately) until `shutdown` flips.
pub fn spawn_booking_poller(
    client: Client,
    url: String,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Feed<BookingBoard> {
    let (tx, rx) = watch::channel(BookingBoard::default());
    let task = tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tick.tick() => {}
            }
            let fetched = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                res = fetch_booking_counts(&client, &url) => res,
            };
            match fetched {
                Ok(counts) => {
                    tx.send_modify(|board| {
                        if board.record(counts, Utc::now()) {
                            info!(daily = counts.daily_bookings, "booking count changed");
                        }
                    });
                }
                Err(e) => warn!("booking poll failed; keeping last counts: {e:#}"),
            }
        }
        debug!("booking poller stopped");
    });
    Feed::new(rx, task)
}
