//! `eth_subscribe("newHeads")` over WebSocket for push mode.
//!
//! The subscription only moves bytes. Reconnection policy lives in
//! [`crate::scheduler::reconnect`].

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, trace};

use super::{parse_block, BlockInfo};
use crate::errors::TransportError;

/// Header announced by the node
pub type HeadEvent = BlockInfo;

const SUBSCRIBE_REQUEST_ID: u64 = 1;

pub struct HeadSubscription {
    ws_url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    subscription_id: String,
}

impl HeadSubscription {
    /// Connect and wait for the node to confirm the subscription
    pub async fn connect(ws_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let (mut stream, _) = timeout(connect_timeout, connect_async(ws_url))
            .await
            .map_err(|_| TransportError::Timeout {
                endpoint: ws_url.to_string(),
            })?
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: ws_url.to_string(),
                reason: e.to_string(),
            })?;

        let request = json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_REQUEST_ID,
            "method": "eth_subscribe",
            "params": ["newHeads"]
        });
        stream
            .send(Message::Text(request.to_string().into()))
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: ws_url.to_string(),
                reason: e.to_string(),
            })?;

        let subscription_id = timeout(connect_timeout, async {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(id) = parse_subscription_ack(ws_url, &text)? {
                            return Ok(id);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(TransportError::ConnectionFailed {
                            endpoint: ws_url.to_string(),
                            reason: "closed before subscription was confirmed".to_string(),
                        });
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return Err(TransportError::ConnectionFailed {
                            endpoint: ws_url.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        })
        .await
        .map_err(|_| TransportError::Timeout {
            endpoint: ws_url.to_string(),
        })??;

        info!("Subscribed to new heads on {} ({})", ws_url, subscription_id);

        Ok(Self {
            ws_url: ws_url.to_string(),
            stream,
            subscription_id,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.ws_url
    }

    /// Wait for the next head. `Ok(None)` means the server closed the
    /// connection; silence longer than `idle_timeout` is a transport error.
    pub async fn next_head(&mut self, idle_timeout: Duration) -> Result<Option<HeadEvent>, TransportError> {
        loop {
            let message = timeout(idle_timeout, self.stream.next())
                .await
                .map_err(|_| TransportError::Timeout {
                    endpoint: self.ws_url.clone(),
                })?;

            match message {
                Some(Ok(Message::Text(text))) => match parse_head_notification(&self.ws_url, &text) {
                    Some(head) => return Ok(Some(head)),
                    None => trace!("Ignoring message on {}: {}", self.ws_url, text),
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = self.stream.send(Message::Pong(payload)).await {
                        return Err(TransportError::ConnectionFailed {
                            endpoint: self.ws_url.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Subscription {} closed by {}", self.subscription_id, self.ws_url);
                    return Ok(None);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ConnectionFailed {
                        endpoint: self.ws_url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

/// `Ok(Some(id))` for the subscribe reply, `Ok(None)` for anything else
pub fn parse_subscription_ack(endpoint: &str, text: &str) -> Result<Option<String>, TransportError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };

    if value.get("id").and_then(Value::as_u64) != Some(SUBSCRIBE_REQUEST_ID) {
        return Ok(None);
    }

    if let Some(error) = value.get("error") {
        return Err(TransportError::Rpc {
            endpoint: endpoint.to_string(),
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("eth_subscribe rejected")
                .to_string(),
        });
    }

    Ok(value
        .get("result")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Extract the header from an `eth_subscription` notification
pub fn parse_head_notification(endpoint: &str, text: &str) -> Option<HeadEvent> {
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        return None;
    }
    let header = value.get("params")?.get("result")?;
    parse_block(endpoint, header).ok()
}
