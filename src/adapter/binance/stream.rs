//! Binance user-data stream.
//!
//! Connects to `<ws_url>/ws/<listenKey>` and yields account events. The
//! stream does not reconnect; it ends on close, error or key expiry.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::dto::{OrderTradeUpdateDto, StreamEnvelopeDto};
use crate::domain::{AccountEvent, OrderTradeUpdate};
use crate::error::ExchangeError;
use crate::exchange::AccountEventStream;

const ORDER_TRADE_UPDATE: &str = "ORDER_TRADE_UPDATE";
const LISTEN_KEY_EXPIRED: &str = "listenKeyExpired";

/// Parse one user-data stream text frame.
pub fn parse_event(text: &str) -> Result<AccountEvent, serde_json::Error> {
    let envelope: StreamEnvelopeDto = serde_json::from_str(text)?;
    match envelope.event_type.as_str() {
        ORDER_TRADE_UPDATE => {
            let dto: OrderTradeUpdateDto = serde_json::from_str(text)?;
            Ok(AccountEvent::OrderTradeUpdate(OrderTradeUpdate::from(dto)))
        }
        LISTEN_KEY_EXPIRED => Ok(AccountEvent::ListenKeyExpired),
        other => Ok(AccountEvent::Other(other.to_string())),
    }
}

/// Account push events over a websocket.
pub struct BinanceUserStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl BinanceUserStream {
    /// Open the stream for `listen_key`.
    pub async fn connect(ws_url: &str, listen_key: &str) -> Result<Self, ExchangeError> {
        let url = format!("{}/ws/{listen_key}", ws_url.trim_end_matches('/'));
        info!(url = %ws_url, "Connecting to user data stream");

        let (ws, response) = connect_async(url.as_str()).await?;
        info!(status = %response.status(), "User data stream connected");

        Ok(Self { ws, closed: false })
    }
}

#[async_trait]
impl AccountEventStream for BinanceUserStream {
    async fn next_event(&mut self) -> Option<AccountEvent> {
        if self.closed {
            return None;
        }

        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_event(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => warn!(error = %e, raw = %text, "Failed to parse account event"),
                },
                Ok(Message::Ping(data)) => {
                    debug!("Received ping");
                    if let Err(e) = self.ws.send(Message::Pong(data)).await {
                        error!(error = %e, "Failed to answer ping");
                        break;
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "User data stream closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "User data stream error");
                    break;
                }
            }
        }

        self.closed = true;
        None
    }
}
