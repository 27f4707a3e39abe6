//! Stream port (10003): accepts only `<GET_FRAME>`, replying with the
//! latest raw frame base64-encoded (§6).

use std::sync::Arc;

use base64::Engine;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, port: u16) -> crate::error::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    crate::logging::log_event(
        crate::logging::EventKind::Debug,
        &format!("stream server listening on {port}"),
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
                            &format!("stream connection ended: {e}"),
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
        if text.trim() != "<GET_FRAME>" {
            write.send(Message::Text("<NAK>".to_string())).await?;
            continue;
        }
        let body = match state.frame_slot.peek() {
            Some(frame) => base64::engine::general_purpose::STANDARD.encode(&frame.raw_jpeg),
            None => String::new(),
        };
        write.send(Message::Text(format!("<GET_FRAME:{body}>"))).await?;
    }
    Ok(())
}
