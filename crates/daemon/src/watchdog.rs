//! Redeployment watchdog: HEAD-probes a deployed display asset and bumps a
//! generation counter whenever its fingerprint changes. The display reloads
//! itself when it sees a new generation.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_LENGTH, ETAG, LAST_MODIFIED};
use reqwest::Client;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::feed::Feed;

/// Identity of one deployed version of an asset, strongest header first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    ETag(String),
    LastModified(String),
    Length(u64),
}

pub fn fingerprint(headers: &HeaderMap) -> Option<Fingerprint> {
    let text = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    if let Some(etag) = text(ETAG) {
        return Some(Fingerprint::ETag(etag));
    }
    if let Some(modified) = text(LAST_MODIFIED) {
        return Some(Fingerprint::LastModified(modified));
    }
    text(CONTENT_LENGTH)
        .and_then(|len| len.parse().ok())
        .map(Fingerprint::Length)
}

#[derive(Debug, Default)]
pub struct AssetTracker {
    baseline: Option<Fingerprint>,
    generation: u64,
}

impl AssetTracker {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records a probe. The first one only sets the baseline; returns true
    /// when the asset changed.
    pub fn observe(&mut self, fp: Fingerprint) -> bool {
        match &self.baseline {
            None => {
                self.baseline = Some(fp);
                false
            }
            Some(known) if *known == fp => false,
            Some(_) => {
                self.baseline = Some(fp);
                self.generation += 1;
                true
            }
        }
    }
}

pub async fn probe(client: &Client, url: &str) -> Result<Fingerprint> {
    let resp = client
        .head(url)
        .send()
        .await
        .context("asset probe")?
        .error_for_status()
        .context("asset probe status")?;
    fingerprint(resp.headers())
        .ok_or_else(|| anyhow!("asset response has no ETag, Last-Modified or Content-Length"))
}

/// Probes `url` every `every` until `shutdown` flips; publishes the generation.
pub fn spawn_asset_watchdog(
    client: Client,
    url: String,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Feed<u64> {
    let (tx, rx) = watch::channel(0);
    let task = tokio::spawn(async move {
        let mut tracker = AssetTracker::default();
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tick.tick() => {}
            }
            let probed = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                res = probe(&client, &url) => res,
            };
            match probed {
                Ok(fp) => {
                    if tracker.observe(fp) {
                        info!(generation = tracker.generation(), url = %url, "display assets changed");
                        tx.send_replace(tracker.generation());
                    }
                }
                Err(e) => warn!("asset probe failed: {e:#}"),
            }
        }
        debug!("asset watchdog stopped");
    });
    Feed::new(rx, task)
}
