//! Status stream reconciler.
//!
//! Maintains a long-lived push channel keyed by the session's client
//! identity and maps inbound status events onto shared session state. The
//! channel is receive-only and resilient to transient failure: every
//! disconnect is followed by a fixed-delay reconnection attempt, forever,
//! until the session shuts the stream down.

pub mod event;
pub mod retry;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::errors::StreamError;
use crate::session::Session;
use event::{StatusEvent, apply_event};
use retry::RetryPolicy;

/// Inbound text frames from the push channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// One connection attempt to the push channel. The concrete connector
/// resolves the endpoint and dials a WebSocket; tests substitute scripted
/// connectors to drive the reconnect loop deterministically.
#[async_trait]
pub trait StreamConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<MessageStream, StreamError>;
}

/// Substitute the URL scheme of the API base for the WebSocket scheme.
/// Applied at most once, only to a leading scheme.
pub fn derive_ws_base(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_base.to_string()
    }
}

/// Production connector: resolves the endpoint on every attempt and dials a
/// WebSocket.
///
/// Resolution order: the statically configured base wins; otherwise the
/// discovery endpoint is queried; if discovery fails the base is derived
/// from the API URL by scheme substitution. The channel address is the
/// resolved base joined with the client identity.
pub struct WsConnector {
    client: ApiClient,
    static_base: Option<String>,
    client_id: String,
}

impl WsConnector {
    pub fn new(config: &Config, client: ApiClient, client_id: &str) -> Self {
        Self {
            client,
            static_base: config.ws_base.clone(),
            client_id: client_id.to_string(),
        }
    }

    async fn resolve_base(&self) -> String {
        if let Some(base) = &self.static_base {
            return base.clone();
        }
        match self.client.ws_url().await {
            Ok(url) => url.trim_end_matches('/').to_string(),
            Err(err) => {
                let err = StreamError::Discovery(err);
                debug!(%err, "falling back to deriving the push base from the API base");
                derive_ws_base(self.client.base())
            }
        }
    }

    async fn endpoint(&self) -> String {
        let base = self.resolve_base().await;
        format!("{}/{}", base.trim_end_matches('/'), self.client_id)
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self) -> Result<MessageStream, StreamError> {
        let url = self.endpoint().await;
        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|err| StreamError::Connect {
                url: url.clone(),
                message: err.to_string(),
            })?;
        info!(%url, "status stream connected");
        let messages = ws.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(_)) => Some(Err(StreamError::Protocol("closed by server".to_string()))),
                Ok(_) => None,
                Err(err) => Some(Err(StreamError::Protocol(err.to_string()))),
            }
        });
        Ok(Box::pin(messages))
    }
}

/// Handle to a running status stream. Dropping the handle without calling
/// [`StreamHandle::shutdown`] also stops the stream, because the loop treats
/// a dropped shutdown sender as a shutdown signal.
pub struct StreamHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Close the channel and cancel any pending reconnect timer.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// The reconciler itself: connect, consume events, reconnect after the
/// policy's delay on any close or error.
pub struct StatusStream<C: StreamConnector> {
    connector: C,
    session: Arc<Session>,
    retry: RetryPolicy,
}

impl<C: StreamConnector> StatusStream<C> {
    pub fn new(connector: C, session: Arc<Session>, retry: RetryPolicy) -> Self {
        Self {
            connector,
            session,
            retry,
        }
    }

    /// Spawn the reconnect loop on the runtime.
    pub fn spawn(self) -> StreamHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        StreamHandle { shutdown, task }
    }

    /// Run until `shutdown` fires. Connection failures and mid-stream errors
    /// both route through the same fixed-delay retry; no event is surfaced
    /// to the user for either.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut failures: u32 = 0;
        loop {
            // The dial itself can stall, so it races shutdown too.
            let attempt = tokio::select! {
                _ = shutdown.changed() => return,
                attempt = self.connector.connect() => attempt,
            };
            match attempt {
                Ok(mut messages) => {
                    failures = 0;
                    loop {
                        tokio::select! {
                            _ = shutdown.changed() => return,
                            frame = messages.next() => match frame {
                                Some(Ok(text)) => self.handle_frame(&text),
                                Some(Err(err)) => {
                                    warn!(%err, "status stream dropped");
                                    break;
                                }
                                None => {
                                    warn!("status stream ended");
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "status stream connect failed");
                }
            }

            failures += 1;
            let Some(delay) = self.retry.next_delay(failures) else {
                warn!(failures, "status stream retry policy exhausted");
                return;
            };
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<StatusEvent>(text) {
            Ok(event) => apply_event(&self.session, &event),
            Err(err) => debug!(%err, "ignoring undecodable status frame"),
        }
    }
}
