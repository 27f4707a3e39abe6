//! Command port (10001): the full token dispatch table (§6).

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::lists::ListKind;
use crate::state::AppState;

use super::protocol::{self, Command, ListName};

pub async fn run(state: Arc<AppState>, port: u16) -> crate::error::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    crate::logging::log_event(
        crate::logging::EventKind::Debug,
        &format!("command server listening on {port}"),
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
                            &format!("command connection ended: {e}"),
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
        let reply = dispatch(&state, &text);
        write.send(Message::Text(reply)).await?;
    }
    Ok(())
}

fn dispatch(state: &AppState, frame: &str) -> String {
    match protocol::parse(frame) {
        Command::Ping => protocol::reply("PING", ""),
        Command::Model => protocol::reply("MODEL", "YOLOCAM"),
        Command::Watchdog => protocol::reply("WATCHDOG", "0"),
        Command::GetDevParams => {
            let doc = state.device.read().unwrap().as_ref().clone();
            protocol::reply("GET_DEV_PARAMS", &serde_json::to_string(&doc).unwrap_or_default())
        }
        Command::SetDevParams(body) => {
            match serde_json::from_str(&body) {
                Ok(doc) => {
                    state.device.write().unwrap().modify(|d| *d = doc);
                    let _ = state.persist_device_config();
                    protocol::reply("SET_DEV_PARAMS", "OK")
                }
                Err(_) => protocol::nak(),
            }
        }
        Command::GetCamParams => {
            let doc = state.camera.read().unwrap().as_ref().clone();
            protocol::reply("GET_CAM_PARAMS", &serde_json::to_string(&doc).unwrap_or_default())
        }
        Command::SetCamParams(body) => match serde_json::from_str(&body) {
            Ok(doc) => {
                state.camera.write().unwrap().modify(|d| *d = doc);
                let _ = state.persist_camera_config();
                protocol::reply("SET_CAM_PARAMS", "OK")
            }
            Err(_) => protocol::nak(),
        },
        Command::GetList(name) => {
            let list = list_for(state, name);
            protocol::reply(list_token(name, "GET"), &list.read().unwrap().as_joined())
        }
        Command::SetList(name, body) => {
            let list = list_for(state, name);
            let plates = body.split('|').map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            match list.write().unwrap().set(plates) {
                Ok(()) => protocol::reply(list_token(name, "SET"), "OK"),
                Err(_) => protocol::nak(),
            }
        }
        Command::AddList(name, body) => {
            let list = list_for(state, name);
            match list.write().unwrap().add(body.trim()) {
                Ok(()) => protocol::reply(list_token(name, "ADD"), "OK"),
                Err(_) => protocol::nak(),
            }
        }
        Command::GetGpio(_n) => protocol::reply("GET_GPIO", "0"),
        Command::SetGpio(_n, _v) => protocol::reply("SET_GPIO", "OK"),
        Command::GetLogMessages(_client) => protocol::reply("GET_LOG_MESSAGES", ""),
        Command::ResetStatistics(flags) => {
            state.device.write().unwrap().modify(|d| {
                if flags & 1 != 0 {
                    d.statistics.decisions = 0;
                }
                if flags & 2 != 0 {
                    d.statistics.fanTime = 0.0;
                }
            });
            protocol::reply("RESET_STATISTICS", "OK")
        }
        Command::CalibratePosition => protocol::reply("CALIBRATE_POSITION", "OK"),
        Command::GetDecision(client_id) => {
            let mut decisions = state.decisions.write().unwrap();
            let mut flushed = state.flushed.write().unwrap();
            match decisions.next_for_client(&client_id, &mut flushed) {
                Some(d) => {
                    let idx = d.index;
                    let json = d.to_compact_json().unwrap_or_default();
                    format!("<GET_DECISION:{idx}>{json}")
                }
                None => protocol::reply("GET_DECISION", ""),
            }
        }
        Command::AckDecision(client_id, idx) => {
            state.decisions.write().unwrap().ack(&client_id, idx);
            protocol::reply("ACK_DECISION", "OK")
        }
        Command::GetResult => protocol::reply("GET_RESULT", ""),
        Command::GetReading(plate) => {
            let history = state.history.read().unwrap();
            match history.iter().rev().find(|r| r.results.iter().any(|res| res.plate == plate)) {
                Some(r) => protocol::reply("GET_READING", &serde_json::to_string(r).unwrap_or_default()),
                None => protocol::reply("GET_READING", ""),
            }
        }
        Command::GetNewPlate => {
            let mut flag = state.new_plate_flag.write().unwrap();
            let value = *flag;
            *flag = false;
            protocol::reply("GET_NEW_PLATE", if value { "1" } else { "0" })
        }
        Command::GetFrame => protocol::reply("GET_FRAME", ""),
        Command::Unknown(_) => protocol::nak(),
    }
}

fn list_for(state: &AppState, name: ListName) -> &std::sync::Arc<std::sync::RwLock<crate::lists::PlateList>> {
    match name {
        ListName::Black => &state.blacklist,
        ListName::White => &state.whitelist,
        ListName::Ignore => &state.ignorelist,
    }
}

fn list_token(name: ListName, verb: &str) -> &'static str {
    match (name, verb) {
        (ListName::Black, "GET") => "GET_BLACKLIST",
        (ListName::Black, "SET") => "SET_BLACKLIST",
        (ListName::Black, "ADD") => "ADD_BLACKLIST",
        (ListName::White, "GET") => "GET_WHITELIST",
        (ListName::White, "SET") => "SET_WHITELIST",
        (ListName::White, "ADD") => "ADD_WHITELIST",
        (ListName::Ignore, "GET") => "GET_IGNORELIST",
        (ListName::Ignore, "SET") => "SET_IGNORELIST",
        (ListName::Ignore, "ADD") => "ADD_IGNORELIST",
        _ => "NAK",
    }
}

#[allow(dead_code)]
fn _unused(_k: ListKind) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_and_model() {
        let state = AppState::new(std::env::temp_dir().join(format!("yolocam-cmd-test-{}", uuid::Uuid::new_v4())));
        assert_eq!(dispatch(&state, "<PING>"), "<PING>");
        assert_eq!(dispatch(&state, "<MODEL>"), "<MODEL:YOLOCAM>");
    }

    #[test]
    fn unknown_token_is_nak() {
        let state = AppState::new(std::env::temp_dir().join(format!("yolocam-cmd-test-{}", uuid::Uuid::new_v4())));
        assert_eq!(dispatch(&state, "<NOPE>"), "<NAK>");
    }
}
