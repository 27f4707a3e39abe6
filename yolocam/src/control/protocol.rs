//! The angle-bracketed command-token protocol (§6), parsed from and rendered
//! back into WebSocket text frames.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Model,
    Watchdog,
    GetDevParams,
    SetDevParams(String),
    GetCamParams,
    SetCamParams(String),
    GetList(ListName),
    SetList(ListName, String),
    AddList(ListName, String),
    GetGpio(u8),
    SetGpio(u8, u8),
    GetLogMessages(String),
    ResetStatistics(u32),
    CalibratePosition,
    GetDecision(String),
    AckDecision(String, u64),
    GetResult,
    GetReading(String),
    GetNewPlate,
    GetFrame,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListName {
    Black,
    White,
    Ignore,
}

/// Split `<TOKEN:body>` into its token and body (body may be empty).
fn split_token(frame: &str) -> Option<(&str, &str)> {
    let inner = frame.strip_prefix('<')?.strip_suffix('>')?;
    match inner.find(':') {
        Some(idx) => Some((&inner[..idx], &inner[idx + 1..])),
        None => Some((inner, "")),
    }
}

fn list_name(token_suffix: &str) -> Option<ListName> {
    match token_suffix {
        "BLACKLIST" => Some(ListName::Black),
        "WHITELIST" => Some(ListName::White),
        "IGNORELIST" => Some(ListName::Ignore),
        _ => None,
    }
}

/// A `<TOKEN:...>` frame may carry an embedded JSON payload after the last
/// `;`-delimited field, e.g. `<SET_CAM_PARAMS>{...}`. Commands that take a
/// JSON body are matched on the bare token with the body taken verbatim.
pub fn parse(frame: &str) -> Command {
    let trimmed = frame.trim();

    // Commands carrying a trailing JSON body: `<SET_X_PARAMS>{...}`.
    if let Some(rest) = trimmed.strip_prefix("<SET_DEV_PARAMS>") {
        return Command::SetDevParams(rest.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("<SET_CAM_PARAMS>") {
        return Command::SetCamParams(rest.to_string());
    }

    let Some((token, body)) = split_token(trimmed) else {
        return Command::Unknown(trimmed.to_string());
    };

    match token {
        "PING" => Command::Ping,
        "MODEL" => Command::Model,
        "WATCHDOG" => Command::Watchdog,
        "GET_DEV_PARAMS" => Command::GetDevParams,
        "GET_CAM_PARAMS" => Command::GetCamParams,
        "CALIBRATE_POSITION" => Command::CalibratePosition,
        "GET_RESULT" => Command::GetResult,
        "GET_NEW_PLATE" => Command::GetNewPlate,
        "GET_FRAME" => Command::GetFrame,
        "GET_READING" => Command::GetReading(body.to_string()),
        "GET_LOG_MESSAGES" => Command::GetLogMessages(body.to_string()),
        "GET_DECISION" => Command::GetDecision(body.to_string()),
        "GET_GPIO" => body.parse().map(Command::GetGpio).unwrap_or(Command::Unknown(trimmed.to_string())),
        "RESET_STATISTICS" => body
            .parse()
            .map(Command::ResetStatistics)
            .unwrap_or(Command::Unknown(trimmed.to_string())),
        "SET_GPIO" => {
            let mut parts = body.split(';');
            match (parts.next().and_then(|p| p.parse().ok()), parts.next().and_then(|p| p.parse().ok())) {
                (Some(n), Some(v)) => Command::SetGpio(n, v),
                _ => Command::Unknown(trimmed.to_string()),
            }
        }
        "ACK_DECISION" => {
            let mut parts = body.split(';');
            match (parts.next(), parts.next().and_then(|p| p.parse().ok())) {
                (Some(client), Some(idx)) => Command::AckDecision(client.to_string(), idx),
                _ => Command::Unknown(trimmed.to_string()),
            }
        }
        t if t.starts_with("GET_") && list_name(&t[4..]).is_some() => {
            Command::GetList(list_name(&t[4..]).unwrap())
        }
        t if t.starts_with("SET_") && list_name(&t[4..]).is_some() => {
            Command::SetList(list_name(&t[4..]).unwrap(), body.to_string())
        }
        t if t.starts_with("ADD_") && list_name(&t[4..]).is_some() => {
            Command::AddList(list_name(&t[4..]).unwrap(), body.to_string())
        }
        _ => Command::Unknown(trimmed.to_string()),
    }
}

pub fn nak() -> String {
    "<NAK>".to_string()
}

pub fn reply(token: &str, body: &str) -> String {
    if body.is_empty() {
        format!("<{token}>")
    } else {
        format!("<{token}:{body}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_tokens() {
        assert_eq!(parse("<PING>"), Command::Ping);
        assert_eq!(parse("<MODEL>"), Command::Model);
        assert_eq!(parse("<GET_DEV_PARAMS>"), Command::GetDevParams);
    }

    #[test]
    fn parses_ack_decision_with_client_and_index() {
        assert_eq!(
            parse("<ACK_DECISION:client-1;42>"),
            Command::AckDecision("client-1".to_string(), 42)
        );
    }

    #[test]
    fn parses_set_gpio() {
        assert_eq!(parse("<SET_GPIO:1;2>"), Command::SetGpio(1, 2));
    }

    #[test]
    fn parses_list_tokens() {
        assert_eq!(parse("<GET_WHITELIST>"), Command::GetList(ListName::White));
        assert_eq!(
            parse("<ADD_BLACKLIST:ABC123>"),
            Command::AddList(ListName::Black, "ABC123".to_string())
        );
    }

    #[test]
    fn unknown_token_is_preserved() {
        assert!(matches!(parse("<BOGUS>"), Command::Unknown(_)));
    }

    #[test]
    fn reply_formats_with_and_without_body() {
        assert_eq!(reply("PING", ""), "<PING>");
        assert_eq!(reply("MODEL", "YOLOCAM"), "<MODEL:YOLOCAM>");
    }
}
