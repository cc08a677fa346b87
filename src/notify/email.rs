// src/notify/email.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{recipient_tag, DeliveryError, DeliverySink};
use crate::digest::{OutputFormat, RenderedDigest};

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP sink (STARTTLS relay).
pub struct EmailSink {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSink {
    /// Reads SMTP_HOST, SMTP_PORT, SMTP_USER, SMTP_PASS and NOTIFY_EMAIL_FROM
    /// (defaults to SMTP_USER).
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let port = match std::env::var("SMTP_PORT") {
            Ok(p) => p.trim().parse::<u16>().context("invalid SMTP_PORT")?,
            Err(_) => DEFAULT_SMTP_PORT,
        };
        let user = std::env::var("SMTP_USER").map_err(|_| anyhow!("SMTP_USER missing"))?;
        let pass = std::env::var("SMTP_PASS").map_err(|_| anyhow!("SMTP_PASS missing"))?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").unwrap_or_else(|_| user.clone());

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .with_context(|| format!("invalid SMTP_HOST {host:?}"))?
            .port(port)
            .credentials(creds)
            .build();

        let from = from_addr
            .parse()
            .with_context(|| format!("invalid sender address {from_addr:?}"))?;

        Ok(Self { mailer, from })
    }
}

/// Build the MIME message. HTML digests carry a plaintext alternative.
pub fn build_message(
    from: &Mailbox,
    recipient: &str,
    rendered: &RenderedDigest,
) -> Result<Message, DeliveryError> {
    let to: Mailbox = recipient
        .parse()
        .map_err(|_| DeliveryError::InvalidAddress(recipient.to_string()))?;

    let builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(rendered.subject.clone());

    let built = match (rendered.format, &rendered.text_alternative) {
        (OutputFormat::Html, Some(text)) => builder.multipart(MultiPart::alternative_plain_html(
            text.clone(),
            rendered.body.clone(),
        )),
        (OutputFormat::Html, None) => builder
            .header(header::ContentType::TEXT_HTML)
            .body(rendered.body.clone()),
        _ => builder
            .header(header::ContentType::TEXT_PLAIN)
            .body(rendered.body.clone()),
    };
    built.map_err(|e| DeliveryError::Build(e.to_string()))
}

#[async_trait]
impl DeliverySink for EmailSink {
    async fn deliver(
        &self,
        rendered: &RenderedDigest,
        recipient: &str,
    ) -> Result<(), DeliveryError> {
        let msg = build_message(&self.from, recipient, rendered)?;
        self.mailer
            .send(msg)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tracing::info!(
            recipient = %recipient_tag(recipient),
            subject = %rendered.subject,
            "digest email sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
