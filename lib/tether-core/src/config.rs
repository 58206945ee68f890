use std::time::Duration;

use serde::Deserialize;
use tether_config::HostConfiguration;
use tether_error::{ErrorContext as _, GenericError};

use crate::{PlaceholderWhitelist, RuntimeId, WebHostWhitelist};

const fn default_rpc_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_placeholder_windows_runtimes() -> Vec<RuntimeId> {
    vec![RuntimeId::new(RuntimeId::JAVA)]
}

fn default_placeholder_linux_runtimes() -> Vec<RuntimeId> {
    vec![RuntimeId::new(RuntimeId::PYTHON)]
}

fn default_webhost_runtimes() -> Vec<RuntimeId> {
    vec![RuntimeId::new(RuntimeId::JAVA)]
}

#[derive(Clone, Debug, Deserialize)]
struct PlaceholderRuntimes {
    #[serde(default = "default_placeholder_windows_runtimes")]
    windows: Vec<RuntimeId>,

    #[serde(default = "default_placeholder_linux_runtimes")]
    linux: Vec<RuntimeId>,
}

impl Default for PlaceholderRuntimes {
    fn default() -> Self {
        Self {
            windows: default_placeholder_windows_runtimes(),
            linux: default_placeholder_linux_runtimes(),
        }
    }
}

/// Lifecycle configuration.
///
/// Every setting has a default, so an empty configuration is valid.
#[derive(Clone, Debug, Deserialize)]
pub struct LifecycleConfiguration {
    /// How long to wait for the RPC transport to shut down gracefully before killing it, in milliseconds.
    ///
    /// Defaults to 5000 milliseconds.
    #[serde(default = "default_rpc_shutdown_timeout_ms")]
    rpc_shutdown_timeout_ms: u64,

    /// Runtimes to initialize speculatively in placeholder mode, keyed by platform (`windows`, `linux`).
    ///
    /// Defaults to `java` on Windows and `python` on Linux.
    #[serde(default)]
    placeholder_runtimes: PlaceholderRuntimes,

    /// Runtimes allowed to start at host level when explicitly configured.
    ///
    /// Defaults to `java`.
    #[serde(default = "default_webhost_runtimes")]
    webhost_runtimes: Vec<RuntimeId>,
}

impl LifecycleConfiguration {
    /// Creates a new `LifecycleConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If any of the lifecycle settings are present but have the wrong type, an error is returned.
    pub fn from_configuration(config: &HostConfiguration) -> Result<Self, GenericError> {
        config.section::<Self>().error_context("Invalid lifecycle configuration.")
    }

    /// Creates a new `LifecycleConfiguration` with default values.
    pub fn with_defaults() -> Self {
        Self {
            rpc_shutdown_timeout_ms: default_rpc_shutdown_timeout_ms(),
            placeholder_runtimes: PlaceholderRuntimes::default(),
            webhost_runtimes: default_webhost_runtimes(),
        }
    }

    /// Returns the graceful shutdown timeout for the RPC transport.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_shutdown_timeout_ms)
    }

    /// Builds the placeholder whitelist.
    pub fn placeholder_whitelist(&self) -> PlaceholderWhitelist {
        PlaceholderWhitelist::new(
            self.placeholder_runtimes.windows.iter().cloned(),
            self.placeholder_runtimes.linux.iter().cloned(),
        )
    }

    /// Builds the host-level whitelist.
    pub fn webhost_whitelist(&self) -> WebHostWhitelist {
        WebHostWhitelist::new(self.webhost_runtimes.iter().cloned())
    }
}

impl Default for LifecycleConfiguration {
    fn default() -> Self {
        Self::with_defaults()
    }
}
