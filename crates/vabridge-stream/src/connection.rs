//! The streaming connection.
//!
//! One read task is the only reader of the socket; it forwards every frame
//! to the event channel before reading the next one. Writers share the sink
//! half behind an async mutex so concurrent sends never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::errors::{ConnectError, StreamError};
use crate::event::{ConnectionState, StreamEvent};
use crate::tls;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// State shared between the handle and its read task.
struct Shared {
    state: Mutex<ConnectionState>,
    used: AtomicBool,
    opened: AtomicBool,
    disconnected: AtomicBool,
    events: mpsc::Sender<StreamEvent>,
    writer: tokio::sync::Mutex<Option<WsSink>>,
    stop: CancellationToken,
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, to = ?next, "connection state");
        *state = next;
    }

    async fn emit(&self, event: StreamEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Move to `Disconnected` and report it, at most once per connection.
    async fn finish(&self, cause: Option<StreamError>) {
        self.set_state(ConnectionState::Disconnected);
        self.stop.cancel();
        if !self.opened.load(Ordering::Acquire) || self.disconnected.swap(true, Ordering::AcqRel) {
            return;
        }
        match &cause {
            Some(error) => warn!(%error, "connection lost"),
            None => info!("connection closed"),
        }
        let _ = self.emit(StreamEvent::Disconnected(cause)).await;
    }

    /// Send a close frame (best effort) and drop the sink.
    async fn shut_writer(&self) {
        let sink = self.writer.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(error) = sink.send(Message::Close(None)).await {
                debug!(%error, "close frame not sent");
            }
            let _ = sink.close().await;
        }
    }
}

/// One use-once WebSocket subscription.
pub struct StreamingConnection {
    config: ConnectionConfig,
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl StreamingConnection {
    /// Create an unconnected connection that reports to `events`.
    pub fn new(config: ConnectionConfig, events: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(ConnectionState::Disconnected),
                used: AtomicBool::new(false),
                opened: AtomicBool::new(false),
                disconnected: AtomicBool::new(false),
                events,
                writer: tokio::sync::Mutex::new(None),
                stop: CancellationToken::new(),
            }),
            reader: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Handshake and start the read loop.
    ///
    /// On failure a [`StreamEvent::ConnectFailed`] is emitted and the error
    /// returned; there is no retry. `cancel` also stops the read loop later.
    #[tracing::instrument(skip_all, fields(url = %self.config.redacted_url()))]
    pub async fn connect(&self, cancel: CancellationToken) -> Result<(), ConnectError> {
        if self.shared.used.swap(true, Ordering::AcqRel) {
            return Err(ConnectError::AlreadyUsed);
        }
        self.shared.set_state(ConnectionState::Connecting);

        let ws = match self.handshake(&cancel).await {
            Ok(ws) => ws,
            Err(error) => {
                warn!(%error, "subscription connect failed");
                self.shared.set_state(ConnectionState::Disconnected);
                let _ = self
                    .shared
                    .emit(StreamEvent::ConnectFailed(error.to_string()))
                    .await;
                return Err(error);
            }
        };

        let (sink, source) = ws.split();
        *self.shared.writer.lock().await = Some(sink);
        self.shared.opened.store(true, Ordering::Release);
        self.shared.set_state(ConnectionState::Connected);
        info!("subscription connected");
        let _ = self.shared.emit(StreamEvent::Connected).await;

        let handle = tokio::spawn(read_loop(
            source,
            Arc::clone(&self.shared),
            cancel,
            self.config.read_timeout,
        ));
        *self.reader.lock() = Some(handle);
        Ok(())
    }

    async fn handshake(&self, cancel: &CancellationToken) -> Result<WsStream, ConnectError> {
        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectError::InvalidRequest(e.to_string()))?;
        if let Some(protocol) = &self.config.subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|e| ConnectError::InvalidRequest(e.to_string()))?;
            let _ = request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let connector = self
            .config
            .is_tls()
            .then(|| tls::connector(self.config.accept_invalid_certs));
        let timeout = self.config.handshake_timeout;

        tokio::select! {
            () = cancel.cancelled() => Err(ConnectError::Cancelled),
            result = tokio::time::timeout(
                timeout,
                connect_async_tls_with_config(request, None, false, connector),
            ) => match result {
                Err(_) => Err(ConnectError::Timeout(timeout)),
                Ok(Err(e)) => Err(ConnectError::Handshake(Box::new(e))),
                Ok(Ok((ws, _response))) => Ok(ws),
            },
        }
    }

    /// Send one text frame.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), StreamError> {
        self.send(Message::text(text.into())).await
    }

    /// Send one binary frame.
    pub async fn send_binary(&self, data: impl Into<Bytes>) -> Result<(), StreamError> {
        self.send(Message::binary(data.into())).await
    }

    async fn send(&self, message: Message) -> Result<(), StreamError> {
        let mut guard = self.shared.writer.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(StreamError::NotConnected);
        };
        if let Err(error) = sink.send(message).await {
            // Any write failure ends the connection.
            let _ = guard.take();
            drop(guard);
            let error = StreamError::Write(Arc::new(error));
            self.shared.finish(Some(error.clone())).await;
            return Err(error);
        }
        Ok(())
    }

    /// Close gracefully, stop the read loop, and report `Disconnected`.
    ///
    /// Safe to call repeatedly; only the first call reports.
    pub async fn close(&self) {
        self.shared.stop.cancel();
        self.shared.shut_writer().await;
        self.shared.finish(None).await;

        let handle = self.reader.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for StreamingConnection {
    fn drop(&mut self) {
        self.shared.stop.cancel();
    }
}

/// Sole reader of the socket.
async fn read_loop(
    mut source: WsSource,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    read_timeout: Option<Duration>,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("read loop cancelled");
                shared.shut_writer().await;
                shared.finish(None).await;
                return;
            }
            () = shared.stop.cancelled() => return,
            next = next_frame(&mut source, read_timeout) => next,
        };

        let event = match next {
            Ok(Message::Text(text)) => StreamEvent::Text(text.as_str().to_owned()),
            Ok(Message::Binary(data)) => StreamEvent::Binary(data),
            Ok(Message::Ping(data)) => StreamEvent::Ping(data),
            Ok(Message::Pong(data)) => StreamEvent::Pong(data),
            Ok(Message::Close(frame)) => {
                debug!(?frame, "close frame received");
                continue;
            }
            Ok(Message::Frame(_)) => continue,
            Err(error) => {
                if shared.stop.is_cancelled() {
                    // Closed locally; `close` reports it.
                    return;
                }
                let _ = shared.writer.lock().await.take();
                shared.finish(Some(error)).await;
                return;
            }
        };

        if !shared.emit(event).await {
            debug!("event receiver dropped, stopping read loop");
            shared.stop.cancel();
            shared.shut_writer().await;
            return;
        }
    }
}

async fn next_frame(
    source: &mut WsSource,
    read_timeout: Option<Duration>,
) -> Result<Message, StreamError> {
    let next = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, source.next())
            .await
            .map_err(|_| StreamError::ReadTimeout(limit))?,
        None => source.next().await,
    };
    match next {
        Some(Ok(message)) => Ok(message),
        Some(Err(tungstenite::Error::ConnectionClosed)) | None => Err(StreamError::PeerClosed),
        Some(Err(error)) => Err(StreamError::Read(Arc::new(error))),
    }
}
