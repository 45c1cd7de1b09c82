use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use info_screen_core::FailurePolicy;
use info_screen_daemon::{bookings, config::KioskConfig, driver, http, source, watchdog};
use tokio::{signal, sync::watch};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Clear,
    KeepLastGood,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Clear => FailurePolicy::Clear,
            PolicyArg::KeepLastGood => FailurePolicy::KeepLastGood,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "info-screen-daemon",
    version,
    about = "Office info screen backend poller and display feed"
)]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the display feed listens, e.g. 127.0.0.1:8787
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Base URL of the ticket/booking backend.
    #[arg(long)]
    backend_url: Option<String>,

    /// Display asset to HEAD-probe for redeployments.
    #[arg(long)]
    asset_probe_url: Option<String>,

    /// Ticket refresh interval in seconds.
    #[arg(long)]
    ticket_poll_seconds: Option<u64>,

    /// Tickets shown per column.
    #[arg(long, allow_negative_numbers = true)]
    column_capacity: Option<i64>,

    /// What a failed ticket poll does to the board on screen.
    #[arg(long, value_enum)]
    failure_policy: Option<PolicyArg>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

impl Cli {
    fn resolve(&self) -> anyhow::Result<KioskConfig> {
        let mut cfg = match &self.config {
            Some(path) => KioskConfig::load_from(path)?,
            None => KioskConfig::default(),
        };
        if let Some(listen) = self.listen {
            cfg.listen = listen;
        }
        if let Some(url) = &self.backend_url {
            cfg.backend_url = url.clone();
        }
        if let Some(url) = &self.asset_probe_url {
            cfg.asset_probe_url = Some(url.clone());
        }
        if let Some(secs) = self.ticket_poll_seconds {
            cfg.ticket_poll_seconds = secs;
        }
        if let Some(capacity) = self.column_capacity {
            cfg.column_capacity = capacity;
        }
        if let Some(policy) = self.failure_policy {
            cfg.failure_policy = policy.into();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cfg = cli.resolve()?;
    info!("starting info screen daemon with config: {:?}", cfg);

    let client = source::build_client(cfg.request_timeout()).context("build http client")?;

    let tickets = source::HttpTicketSource::new(client.clone(), cfg.tickets_url());
    info!(url = tickets.url(), "polling tickets");
    let session = driver::start(
        tickets,
        cfg.session_settings(),
        cfg.ticket_poll_interval(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let booking_feed = bookings::spawn_booking_poller(
        client.clone(),
        cfg.bookings_url(),
        cfg.booking_poll_interval(),
        shutdown_rx.clone(),
    );
    let asset_feed = cfg.asset_probe_url.clone().map(|url| {
        watchdog::spawn_asset_watchdog(client, url, cfg.asset_probe_interval(), shutdown_rx)
    });
    let assets = match &asset_feed {
        Some(feed) => feed.subscribe(),
        None => watch::channel(0).1,
    };

    let app = http::router(http::AppState::new(
        session.subscribe(),
        booking_feed.subscribe(),
        assets,
    ));

    let listener = tokio::net::TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    info!("listening on http://{}", cfg.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    session.stop().await;
    booking_feed.join().await;
    if let Some(feed) = asset_feed {
        feed.join().await;
    }
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
