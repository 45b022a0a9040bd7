//! Structured `key=value` log lines under one target.
//!
//! Every line starts with `event=<name>`; lines emitted with a
//! [`LogContext`] carry `component=<name>` next. Nothing is formatted
//! unless the level is enabled for [`LOG_TARGET`].

pub(crate) const LOG_TARGET: &str = "dataselect";

/// Tags events with the component that raised them.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LogContext {
    component: &'static str,
}

impl LogContext {
    pub(crate) const fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub(crate) fn component(&self) -> &'static str {
        self.component
    }
}

macro_rules! select_log {
    ($level:expr, ctx: $ctx:expr, $event:expr, $($arg:tt)+) => {
        log::log!(
            target: $crate::logging::LOG_TARGET,
            $level,
            "event={} component={} {}",
            $event,
            $ctx.component(),
            format_args!($($arg)+)
        )
    };
    ($level:expr, $event:expr, $($arg:tt)+) => {
        log::log!(
            target: $crate::logging::LOG_TARGET,
            $level,
            "event={} {}",
            $event,
            format_args!($($arg)+)
        )
    };
}

pub(crate) use select_log;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_reports_its_component() {
        assert_eq!(LogContext::new("scope").component(), "scope");
    }

    #[test]
    fn macro_accepts_both_forms() {
        const CTX: LogContext = LogContext::new("test");
        select_log!(log::Level::Debug, "plain", "rows={}", 3);
        select_log!(log::Level::Trace, ctx: CTX, "scoped", "rows={} hit={}", 3, true);
    }
}
