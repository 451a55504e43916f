//! WebSocket client for the agent's push feed.

use anyhow::{bail, Context};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::types::Snapshot;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws";

/// Accepts `ws://` and `wss://` URLs only.
pub fn validate_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid URL '{raw}'"))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => bail!("unsupported scheme '{other}', expected ws:// or wss://"),
    }
}

pub async fn connect(url: &Url) -> anyhow::Result<WsStream> {
    let (ws, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("connecting to {url}"))?;
    Ok(ws)
}

/// Waits for the next pushed snapshot. `None` once the agent goes away.
///
/// Frames that aren't valid snapshots are skipped.
pub async fn next_snapshot(ws: &mut WsStream) -> Option<Snapshot> {
    loop {
        match ws.next().await? {
            Ok(Message::Text(json)) => {
                if let Ok(s) = serde_json::from_str::<Snapshot>(&json) {
                    return Some(s);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}
