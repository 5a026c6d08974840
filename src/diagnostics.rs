// ABOUTME: Non-fatal warnings gathered while a deploy runs.
// ABOUTME: Lock release and rendered-config cleanup failures land here instead of aborting.

use std::fmt;

/// Warnings collected during one deploy, printed once it finishes.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = %warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }

    pub fn config_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ConfigCleanup,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The deploy lock file could not be removed and may block the next run
    /// until it goes stale.
    LockRelease,
    /// The rendered wrangler config was left on disk.
    ConfigCleanup,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningKind::LockRelease => "lock-release",
            WarningKind::ConfigCleanup => "config-cleanup",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut diag = Diagnostics::default();
        assert!(!diag.has_warnings());

        diag.warn(Warning::lock_release("failed to remove lock file"));
        diag.warn(Warning::config_cleanup("permission denied"));

        let kinds: Vec<_> = diag.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, [WarningKind::LockRelease, WarningKind::ConfigCleanup]);
    }

    #[test]
    fn display_includes_kind() {
        let warning = Warning::config_cleanup("wrangler-x.json remains");
        assert_eq!(warning.to_string(), "wrangler-x.json remains (config-cleanup)");
    }
}
