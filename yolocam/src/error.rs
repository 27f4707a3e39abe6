use std::path::PathBuf;

/// Crate-wide error type for infrastructure failures.
///
/// Component-local error enums (e.g. [`crate::recognition::bounds::BoundsError`],
/// [`crate::outbox::SinkError`]) exist where callers need to discriminate on the
/// failure category; everything else funnels through here.
#[derive(thiserror::Error, Debug)]
pub enum YoloCamError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    BareIo(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ftp error: {0}")]
    Ftp(String),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),
    #[error("gpio unavailable: {0}")]
    GpioUnavailable(String),
    #[error("camera error: {0}")]
    Camera(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("image encode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("shell expansion error: {0}")]
    ShellExpand(String),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, YoloCamError>;

impl YoloCamError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YoloCamError::Io {
            path: path.into(),
            source,
        }
    }
}
