//! Web port (10005): mirrors the device/camera/frame queries in the same
//! token framing as the command port, for browser-based management clients
//! (§4.5, §6).

use std::sync::Arc;

use base64::Engine;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::control::protocol::{self, Command};
use crate::state::AppState;

pub async fn run(state: Arc<AppState>, port: u16) -> crate::error::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    crate::logging::log_event(
        crate::logging::EventKind::Debug,
        &format!("web server listening on {port}"),
    );

    loop {
        if !state.is_started() {
            return Ok(());
        }
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _addr) = accepted?;
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(state, stream).await {
                        crate::logging::log_event(
                            crate::logging::EventKind::Network,
                            &format!("web connection ended: {e}"),
                        );
                    }
                });
            }
            _ = state.shutdown.notified() => return Ok(()),
        }
    }
}

async fn handle_connection(state: Arc<AppState>, stream: TcpStream) -> crate::error::Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    while let Some(msg) = read.next().await {
        let msg = msg?;
        let Message::Text(text) = msg else { continue };
        let reply = match protocol::parse(&text) {
            Command::GetDevParams => {
                let doc = state.device.read().unwrap().as_ref().clone();
                protocol::reply("GET_DEV_PARAMS", &serde_json::to_string(&doc).unwrap_or_default())
            }
            Command::GetCamParams => {
                let doc = state.camera.read().unwrap().as_ref().clone();
                protocol::reply("GET_CAM_PARAMS", &serde_json::to_string(&doc).unwrap_or_default())
            }
            Command::GetFrame => {
                let body = state
                    .frame_slot
                    .peek()
                    .map(|f| base64::engine::general_purpose::STANDARD.encode(&f.raw_jpeg))
                    .unwrap_or_default();
                protocol::reply("GET_FRAME", &body)
            }
            _ => protocol::nak(),
        };
        write.send(Message::Text(reply)).await?;
    }
    Ok(())
}
