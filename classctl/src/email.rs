//! Email service for OTP codes and account credential mails.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                // Use file transport for development/testing
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
        })
    }

    /// One-time code mail for password reset or signup verification.
    pub async fn send_otp_email(&self, to_email: &str, to_name: Option<&str>, code: &str, purpose: &str) -> Result<(), Error> {
        let greeting = if let Some(name) = to_name {
            format!("Hello {name},")
        } else {
            "Hello,".to_string()
        };

        let subject = format!("Your {purpose} code");
        let body = format!(
            "<html><body><p>{greeting}</p>\
             <p>Your {purpose} code is:</p>\
             <h2>{code}</h2>\
             <p>The code expires in a few minutes. If you did not request it, you can ignore this email.</p>\
             </body></html>"
        );

        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// Credentials mail for admin-created teacher/student accounts.
    pub async fn send_credentials_email(&self, to_email: &str, to_name: Option<&str>, username: &str, password: &str) -> Result<(), Error> {
        let greeting = if let Some(name) = to_name {
            format!("Hello {name},")
        } else {
            "Hello,".to_string()
        };

        let body = format!(
            "<html><body><p>{greeting}</p>\
             <p>An account has been created for you.</p>\
             <p>Username: <b>{username}</b><br>Temporary password: <b>{password}</b></p>\
             <p>You will be asked to choose a new password on first login.</p>\
             </body></html>"
        );

        self.send_email(to_email, to_name, "Your account details", &body).await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = if let Some(name) = to_name {
            format!("{name} <{to_email}>")
        } else {
            to_email.to_string()
        }
        .parse::<Mailbox>()
        .map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }
}
