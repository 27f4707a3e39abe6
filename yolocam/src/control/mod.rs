//! The three framed control servers (§4.5, §6): command (10001), stream
//! (10003), and web (10005). Each is a WebSocket text-frame server, one
//! reply per request, mirroring the collaborating system's own use of a
//! `websockets`-style server for this surface.

pub mod command_server;
pub mod protocol;
pub mod stream_server;
pub mod web_server;

pub const COMMAND_PORT: u16 = 10001;
pub const STREAM_PORT: u16 = 10003;
pub const WEB_PORT: u16 = 10005;
