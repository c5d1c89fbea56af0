//! HTTP data source.
//!
//! Polls the dashboard backend's `/api/status` endpoint and fetches
//! per-server logs from `/api/logs/{key}`. Requests run on a tokio runtime;
//! completions come back to the UI thread over a channel and are picked up
//! by [`DataSource::poll`].

use std::time::Duration;

use reqwest::{Client, Url};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{DataSource, Delivery, FetchError, SequenceCounter, ServerLogs, StatusSnapshot};

type StatusResult = (u64, Result<StatusSnapshot, FetchError>);
type LogsResult = (String, Result<ServerLogs, FetchError>);

/// Build `base` + path segments, percent-encoding each segment.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Fetch one status snapshot from `{base}/api/status`.
pub async fn fetch_status(client: &Client, base: &Url) -> Result<StatusSnapshot, FetchError> {
    let url = endpoint_url(base, &["api", "status"])?;
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Fetch the recent log lines for one server from `{base}/api/logs/{key}`.
pub async fn fetch_logs(client: &Client, base: &Url, key: &str) -> Result<ServerLogs, FetchError> {
    let url = endpoint_url(base, &["api", "logs", key])?;
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// A data source backed by the dashboard's HTTP API.
///
/// Every call to [`request_refresh`](DataSource::request_refresh) spawns an
/// independent fetch, so a manual refresh can overlap a timer-driven one.
/// Each fetch is numbered when requested; `poll` only ever hands back the
/// highest-numbered snapshot it has not handed back before.
///
/// # Example
///
/// ```no_run
/// use uptime_board::HttpSource;
///
/// # tokio_test::block_on(async {
/// let source = HttpSource::builder()
///     .endpoint("http://localhost:9898")
///     .build()
///     .unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    base: Url,
    runtime: Handle,
    description: String,
    sequence: SequenceCounter,
    status_tx: mpsc::UnboundedSender<StatusResult>,
    status_rx: mpsc::UnboundedReceiver<StatusResult>,
    logs_tx: mpsc::UnboundedSender<LogsResult>,
    logs_rx: mpsc::UnboundedReceiver<LogsResult>,
    /// Highest sequence handed out by `poll`.
    delivered_seq: u64,
    /// Sequence of the most recent failed fetch.
    error_seq: u64,
    last_error: Option<String>,
}

impl HttpSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::default()
    }

    /// Base URL of the dashboard backend.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// The HTTP client, shared with one-shot callers such as export.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl DataSource for HttpSource {
    fn poll(&mut self) -> Option<Delivery> {
        let mut newest: Option<Delivery> = None;

        while let Ok((seq, result)) = self.status_rx.try_recv() {
            match result {
                Ok(snapshot) => {
                    if seq > self.delivered_seq && newest.as_ref().is_none_or(|d| seq > d.seq) {
                        newest = Some(Delivery { seq, snapshot });
                    } else {
                        debug!(seq, delivered = self.delivered_seq, "dropping superseded snapshot");
                    }
                }
                Err(err) => {
                    warn!(seq, error = %err, transient = err.is_transient(), "status fetch failed");
                    if seq > self.error_seq {
                        self.error_seq = seq;
                        self.last_error = Some(err.to_string());
                    }
                }
            }
        }

        if let Some(ref delivery) = newest {
            self.delivered_seq = delivery.seq;
        }
        newest
    }

    fn request_refresh(&mut self) {
        let seq = self.sequence.next();
        let client = self.client.clone();
        let base = self.base.clone();
        let tx = self.status_tx.clone();

        debug!(seq, endpoint = %self.base, "requesting status");
        self.runtime.spawn(async move {
            let result = fetch_status(&client, &base).await;
            // Receiver gone means the app is shutting down.
            let _ = tx.send((seq, result));
        });
    }

    fn request_logs(&mut self, key: &str) -> bool {
        let client = self.client.clone();
        let base = self.base.clone();
        let tx = self.logs_tx.clone();
        let key = key.to_string();

        debug!(key = %key, "requesting logs");
        self.runtime.spawn(async move {
            let result = fetch_logs(&client, &base, &key).await;
            let _ = tx.send((key, result));
        });
        true
    }

    fn poll_logs(&mut self) -> Vec<(String, Result<ServerLogs, FetchError>)> {
        let mut completed = Vec::new();
        while let Ok(item) = self.logs_rx.try_recv() {
            completed.push(item);
        }
        completed
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        // A later successful fetch supersedes an earlier failure.
        if self.error_seq > self.delivered_seq {
            self.last_error.as_deref()
        } else {
            None
        }
    }
}

/// Builder for [`HttpSource`].
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

impl HttpSourceBuilder {
    /// Set the backend base URL (default: "http://localhost:9898").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run fetches on this runtime instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the source.
    ///
    /// Without an explicit runtime this must be called from within a tokio
    /// runtime context.
    pub fn build(self) -> Result<HttpSource, FetchError> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9898".to_string());
        let base =
            Url::parse(&endpoint).map_err(|e| FetchError::InvalidEndpoint(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidEndpoint(endpoint));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(5)))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()
                .map_err(|e| FetchError::Runtime(e.to_string()))?,
        };

        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (logs_tx, logs_rx) = mpsc::unbounded_channel();

        Ok(HttpSource {
            client,
            description: format!("http: {}", base),
            base,
            runtime,
            sequence: SequenceCounter::new(),
            status_tx,
            status_rx,
            logs_tx,
            logs_rx,
            delivered_seq: 0,
            error_seq: 0,
            last_error: None,
        })
    }
}
