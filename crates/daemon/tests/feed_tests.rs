//! Display feed served over a real socket.

use std::net::SocketAddr;

use info_screen_core::{FetchError, Ticket, TicketStatus, TriageSession, TriageView};
use info_screen_daemon::bookings::{BookingBoard, BookingCounts};
use info_screen_daemon::http::{router, AppState, AssetsResponse};
use serde_json::Value;
use tokio::sync::watch;

struct Display {
    addr: SocketAddr,
    client: reqwest::Client,
}

impl Display {
    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("http://{}{path}", self.addr))
            .send()
            .await
            .unwrap()
    }

    async fn json(&self, path: &str) -> Value {
        let resp = self.get(path).await;
        assert!(resp.status().is_success(), "{path}: {}", resp.status());
        resp.json().await.unwrap()
    }
}

async fn serve(state: AppState) -> Display {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    Display {
        addr,
        client: reqwest::Client::new(),
    }
}

fn ready_view() -> TriageView {
    let now: chrono::DateTime<chrono::Utc> = "2024-03-01T12:00:00Z".parse().unwrap();
    let mut session = TriageSession::default();
    let seq = session.begin_poll();
    session.apply_at(
        seq,
        Ok(vec![
            Ticket {
                id: 1,
                status: TicketStatus::New,
                updated_at: "2024-03-01T08:00:00Z".parse().unwrap(),
            },
            Ticket {
                id: 2,
                status: TicketStatus::Solved,
                updated_at: "2024-03-01T11:00:00Z".parse().unwrap(),
            },
        ]),
        &now,
    );
    session.view().clone()
}

#[tokio::test]
async fn serves_health_and_latest_views() {
    let (tickets_tx, tickets_rx) = watch::channel(TriageView::Loading);
    let (bookings_tx, bookings_rx) = watch::channel(BookingBoard::default());
    let (assets_tx, assets_rx) = watch::channel(0u64);
    let display = serve(AppState::new(tickets_rx, bookings_rx, assets_rx)).await;

    let health = display.get("/healthz").await;
    assert!(health.status().is_success());
    assert_eq!(health.text().await.unwrap(), "ok");

    assert_eq!(display.json("/v1/tickets").await["state"], "loading");

    tickets_tx.send_replace(ready_view());
    let tickets = display.json("/v1/tickets").await;
    assert_eq!(tickets["state"], "ready");
    assert_eq!(tickets["open"]["items"][0]["id"], 1);
    assert_eq!(tickets["open"]["items"][0]["isNewArrival"], false);
    assert_eq!(tickets["open"]["overflow"], 0);
    assert_eq!(tickets["solvedToday"]["items"][0]["id"], 2);
    assert_eq!(tickets["pending"]["items"].as_array().unwrap().len(), 0);

    bookings_tx.send_modify(|board| {
        board.record(
            BookingCounts {
                daily_bookings: 3,
                yesterday_bookings: 8,
            },
            "2024-03-01T12:00:00Z".parse().unwrap(),
        );
    });
    let bookings = display.json("/v1/bookings").await;
    assert_eq!(bookings["dailyBookings"], 3);
    assert_eq!(bookings["yesterdayBookings"], 8);

    assets_tx.send_replace(2);
    let assets: AssetsResponse = display.get("/v1/assets").await.json().await.unwrap();
    assert_eq!(assets, AssetsResponse { generation: 2 });
}

#[tokio::test]
async fn failed_view_carries_status_and_message() {
    let mut session = TriageSession::default();
    let seq = session.begin_poll();
    session.apply(
        seq,
        Err(FetchError::Status {
            status: 502,
            status_text: Some("Bad Gateway".into()),
        }),
    );

    let (_tickets_tx, tickets_rx) = watch::channel(session.view().clone());
    let (_bookings_tx, bookings_rx) = watch::channel(BookingBoard::default());
    let (_assets_tx, assets_rx) = watch::channel(0u64);
    let display = serve(AppState::new(tickets_rx, bookings_rx, assets_rx)).await;

    let tickets = display.json("/v1/tickets").await;
    assert_eq!(tickets["state"], "failed");
    assert_eq!(tickets["status"], 502);
    assert_eq!(tickets["message"], "Bad Gateway");
}

#[tokio::test]
async fn allows_cross_origin_reads() {
    let (_t, tickets_rx) = watch::channel(TriageView::Loading);
    let (_b, bookings_rx) = watch::channel(BookingBoard::default());
    let (_a, assets_rx) = watch::channel(0u64);
    let display = serve(AppState::new(tickets_rx, bookings_rx, assets_rx)).await;

    let resp = display
        .client
        .get(format!("http://{}/v1/tickets", display.addr))
        .header("Origin", "http://kiosk.local")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
