use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::str::FromStr;
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound mail seam. Handlers talk to this trait so tests can swap in a
/// capturing double instead of a live SMTP relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp_email(&self, to: &str, fullname: &str, code: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();
        let from = Mailbox::from_str(&config.from)
            .map_err(|e| anyhow::anyhow!("invalid EMAIL_FROM: {e}"))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp_email(&self, to: &str, fullname: &str, code: &str) -> anyhow::Result<()> {
        let to_mailbox =
            Mailbox::from_str(to).map_err(|e| anyhow::anyhow!("invalid recipient: {e}"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject("Your password reset code")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(otp_text(fullname, code)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(otp_html(fullname, code)),
                    ),
            )?;

        self.transport.send(message).await?;
        info!(to = %to, "otp email sent");
        Ok(())
    }
}

fn otp_text(fullname: &str, code: &str) -> String {
    format!(
        "Hi {fullname},\n\n\
         Your one-time password reset code is: {code}\n\n\
         It is valid for 10 minutes. If you did not request a password reset,\n\
         you can safely ignore this email.\n"
    )
}

fn otp_html(fullname: &str, code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <p>Hi {fullname},</p>
    <p>Your one-time password reset code is:</p>
    <p style="font-size: 28px; font-weight: bold; letter-spacing: 4px;">{code}</p>
    <p>It is valid for 10 minutes. If you did not request a password reset,
       you can safely ignore this email.</p>
  </div>
</body>
</html>"#
    )
}
