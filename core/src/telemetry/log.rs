use log::{info, warn};
use std::path::Path;

/// Thin wrapper over the `log` facade that tags messages with a component name.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    pub fn caution(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }

    pub fn skipped(&self, path: &Path, reason: &str) {
        warn!(
            "[{}] skipping {}: {}",
            self.component,
            path.display(),
            reason
        );
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("qvp")
    }
}
