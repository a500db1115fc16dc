use std::time::Duration;

/// Runtime options for a [`crate::WebSql`] service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSqlOptions {
    /// How long [`crate::WebSql::ready`] waits for a backend before giving up.
    pub ready_timeout: Duration,
    /// How often [`crate::WebSql::ready`] re-checks readiness.
    pub ready_poll_interval: Duration,
}

impl Default for WebSqlOptions {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(10),
            ready_poll_interval: Duration::from_millis(100),
        }
    }
}

impl WebSqlOptions {
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }
}

/// Fluent builder for [`WebSqlOptions`].
#[derive(Debug, Clone, Default)]
pub struct WebSqlOptionsBuilder {
    opts: WebSqlOptions,
}

impl WebSqlOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.opts.ready_timeout = timeout;
        self
    }

    #[must_use]
    pub fn ready_poll_interval(mut self, interval: Duration) -> Self {
        self.opts.ready_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn finish(self) -> WebSqlOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_probe() {
        let opts = WebSqlOptions::default();
        assert_eq!(opts.ready_timeout, Duration::from_secs(10));
        assert_eq!(opts.ready_poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn builder_overrides() {
        let opts = WebSqlOptionsBuilder::new()
            .ready_timeout(Duration::from_millis(300))
            .ready_poll_interval(Duration::from_millis(10))
            .finish();
        assert_eq!(
            opts,
            WebSqlOptions::default()
                .with_ready_timeout(Duration::from_millis(300))
                .with_ready_poll_interval(Duration::from_millis(10))
        );
    }
}
