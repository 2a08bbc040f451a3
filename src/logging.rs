use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Request-scoped logger.
///
/// Obtained from [`Ctx::log`](crate::Ctx::log) once the caller's partner is
/// known; the orchestrator also builds one for requests that fail before that
/// point. Every event carries the request id and, when resolved, the partner.
///
/// Values wrapped in [`Secret`](crate::Secret) are redacted by their `Debug`
/// and `Display` implementations.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    partner: Option<&'a str>,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str, partner: Option<&'a str>) -> Self {
        Self {
            request_id,
            partner,
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the partner associated with this logger, if resolved.
    pub fn partner(&self) -> Option<&str> {
        self.partner
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # use feed_access::{RequestLog, Secret};
    /// # fn example(log: RequestLog<'_>) {
    /// let key = Secret::new("account-key");
    /// log.info(format_args!("signing with {}", key));
    /// // "signing with [REDACTED]" with request_id and partner fields
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, partner = self.partner, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, partner = self.partner, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, partner = self.partner, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, partner = self.partner, "{}", args);
    }
}

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"feed_access=info"`).
///
/// Call it once at startup, before the first request is handled.
///
/// # Examples
///
/// ```no_run
/// use feed_access::{init_tracing, FeedAccessConfig, FeedAccessOrchestrator};
///
/// fn main() -> feed_access::Result<()> {
///     init_tracing("feed_access=info")?;
///
///     let config = FeedAccessConfig::from_path("feed-access.yaml")?;
///     let orchestrator = FeedAccessOrchestrator::from_config(&config)?;
///     tracing::info!(?orchestrator, "feed access ready");
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// Returns [`Error::Config`] if the directive does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| Error::Config(format!("invalid log directive: {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Config(format!("tracing already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_request_and_partner() {
        let log = RequestLog::new("req-9", Some("TargetBase"));

        assert_eq!(log.request_id(), "req-9");
        assert_eq!(log.partner(), Some("TargetBase"));

        // No subscriber installed; these must not panic.
        log.info(format_args!("issued {} urls", 3));
        log.warn(format_args!("rejected"));
        log.error(format_args!("failed"));
        log.debug(format_args!("probe"));
    }
}
