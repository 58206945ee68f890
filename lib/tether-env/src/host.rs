use std::{path::PathBuf, sync::Arc};

use arc_swap::ArcSwap;
use tether_config::HostConfiguration;
use tether_error::{ErrorContext as _, GenericError};

const SCRIPT_PATH_KEY: &str = "script_path";

/// Options describing the application the host is serving.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HostOptions {
    /// Root directory of the application's scripts.
    pub script_path: PathBuf,
}

impl HostOptions {
    /// Creates a new `HostOptions` from the given configuration.
    ///
    /// Reads the `script_path` key, defaulting to an empty path when unset.
    ///
    /// # Errors
    ///
    /// If `script_path` is set but is not a valid path value, an error is returned.
    pub fn from_configuration(config: &HostConfiguration) -> Result<Self, GenericError> {
        let script_path = config
            .value::<PathBuf>(SCRIPT_PATH_KEY)
            .with_error_context(|| format!("Invalid `{}` setting.", SCRIPT_PATH_KEY))?
            .unwrap_or_default();
        Ok(Self { script_path })
    }
}

/// Shared, current-value view of [`HostOptions`].
///
/// The host may swap in new options at any time (for example, when a placeholder is specialized to a real
/// application). Readers always observe the latest value without locking.
#[derive(Clone, Debug)]
pub struct HostOptionsMonitor {
    current: Arc<ArcSwap<HostOptions>>,
}

impl HostOptionsMonitor {
    /// Creates a new `HostOptionsMonitor` seeded with the given options.
    pub fn new(options: HostOptions) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(options)),
        }
    }

    /// Returns the current options.
    pub fn current(&self) -> Arc<HostOptions> {
        self.current.load_full()
    }

    /// Replaces the current options.
    pub fn update(&self, options: HostOptions) {
        self.current.store(Arc::new(options));
    }
}

impl Default for HostOptionsMonitor {
    fn default() -> Self {
        Self::new(HostOptions::default())
    }
}
