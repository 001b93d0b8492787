//! WebSocket signaling channel
//!
//! A thin duplex client for the backend's signaling endpoint. Outbound
//! control messages are JSON-encoded and sent fire-and-forget once the
//! connection is open; a send while the channel is not open drops the
//! message (the peer has nothing useful to do with a stale frame after a
//! reconnect). Inbound frames are decoded and delivered in receipt order.
//!
//! There is no automatic reconnect: a transport error transitions the
//! channel to `Closed` and the owning session decides what to do.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::message::{InboundMessage, SignalMessage};
use crate::error::{AppError, Result};
use crate::utils::LogThrottler;
use crate::warn_throttled;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Inbound message queue depth
const INBOUND_CAPACITY: usize = 64;

/// Signaling channel connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

/// Duplex signaling channel to one backend endpoint
pub struct SignalingChannel {
    write: Arc<Mutex<SplitSink<WsStream, Message>>>,
    state: Arc<watch::Sender<ChannelState>>,
    state_rx: watch::Receiver<ChannelState>,
    read_task: tokio::task::JoinHandle<()>,
    drop_throttler: LogThrottler,
}

impl SignalingChannel {
    /// Connect to the signaling endpoint
    ///
    /// Returns the channel and the inbound message receiver. Messages are
    /// delivered in receipt order; undecodable frames are logged and
    /// skipped.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<InboundMessage>)> {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        info!("Connecting to signaling endpoint: {}", url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| AppError::Signaling(format!("Failed to connect to {}: {}", url, e)))?;

        let (write, read) = ws_stream.split();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

        let state = Arc::new(state_tx);
        let _ = state.send(ChannelState::Open);
        info!("Signaling channel open");

        let read_task = tokio::spawn(Self::read_loop(read, inbound_tx, state.clone()));

        Ok((
            Self {
                write: Arc::new(Mutex::new(write)),
                state,
                state_rx,
                read_task,
                drop_throttler: LogThrottler::default(),
            },
            inbound_rx,
        ))
    }

    /// Receive loop: decode frames and forward them in order
    async fn read_loop(
        mut read: SplitStream<WsStream>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        state: Arc<watch::Sender<ChannelState>>,
    ) {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    debug!("Signaling recv: {}", text);
                    match serde_json::from_str::<InboundMessage>(&text) {
                        Ok(inbound) => {
                            if inbound_tx.send(inbound).await.is_err() {
                                // Receiver gone - session torn down
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Undecodable signaling frame ({}): {}", e, text);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Signaling channel closed by peer");
                    break;
                }
                Ok(_) => {} // Ping/Pong handled by tungstenite
                Err(e) => {
                    warn!("Signaling receive error: {}", e);
                    break;
                }
            }
        }

        let _ = state.send(ChannelState::Closed);
        debug!("Signaling read loop terminated");
    }

    /// Current connection state
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes
    pub fn state_watch(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Send a control message
    ///
    /// A send while the channel is not open drops the message without
    /// error. Transport failures transition the channel to `Closed` and
    /// are not surfaced to the caller.
    pub async fn send(&self, msg: &SignalMessage) -> Result<()> {
        if self.state() != ChannelState::Open {
            warn_throttled!(
                self.drop_throttler,
                "send_dropped",
                "Dropping signaling message, channel is {}",
                self.state()
            );
            return Ok(());
        }

        let json = serde_json::to_string(msg)?;
        debug!("Signaling send: {}", json);

        let mut write = self.write.lock().await;
        if let Err(e) = write.send(Message::Text(json)).await {
            warn!("Signaling send failed: {}", e);
            let _ = self.state.send(ChannelState::Closed);
        }

        Ok(())
    }

    /// Close the channel (idempotent)
    pub async fn close(&self) {
        if self.state() == ChannelState::Closed {
            return;
        }

        let mut write = self.write.lock().await;
        let _ = write.send(Message::Close(None)).await;
        drop(write);

        let _ = self.state.send(ChannelState::Closed);
        info!("Signaling channel closed");
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}
