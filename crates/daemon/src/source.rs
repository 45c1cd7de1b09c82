//! Where ticket snapshots come from.

use std::future::Future;
use std::time::Duration;

use info_screen_core::{FetchError, Ticket};
use reqwest::Client;

/// One ticket poll. Implementations must not retry; the driver polls again on
/// its next tick.
pub trait TicketSource: Send + Sync + 'static {
    fn poll_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>, FetchError>> + Send;
}

/// Shared HTTP client for every backend call the daemon makes.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Polls the backend's ticket endpoint with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpTicketSource {
    client: Client,
    url: String,
}

impl HttpTicketSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TicketSource for HttpTicketSource {
    async fn poll_tickets(&self) -> Result<Vec<Ticket>, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().map(str::to_string),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}
