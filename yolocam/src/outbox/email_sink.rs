use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::Result;

/// SMTP relay configuration. Defaults are intentionally empty; operators
/// must supply real relay credentials via [`crate::config::camera`] or
/// environment variables before the email outbox is usable.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub sender: String,
}

/// Sends one outbox entry (an `.eml`-staged notification, typically a rolled
/// Excel workbook attachment) via SMTPS (§4.6, 5-minute drain interval).
pub async fn send_with_attachment(
    cfg: &EmailConfig,
    to: &str,
    subject: &str,
    body: &str,
    attachment_name: &str,
    attachment_bytes: Vec<u8>,
) -> Result<()> {
    let attachment = Attachment::new(attachment_name.to_string())
        .body(attachment_bytes, "application/octet-stream".parse().unwrap());

    let from = cfg
        .sender
        .parse()
        .map_err(|_| crate::error::YoloCamError::InvalidAddress(cfg.sender.clone()))?;
    let to_addr = to
        .parse()
        .map_err(|_| crate::error::YoloCamError::InvalidAddress(to.to_string()))?;

    let email = Message::builder()
        .from(from)
        .to(to_addr)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(attachment),
        )
        .map_err(crate::error::YoloCamError::Smtp)?;

    let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
        .map_err(crate::error::YoloCamError::SmtpTransport)?
        .credentials(creds)
        .build();

    transport
        .send(email)
        .await
        .map_err(crate::error::YoloCamError::SmtpTransport)?;
    Ok(())
}
