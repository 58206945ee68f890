use std::{fmt, path::PathBuf};

use tether_env::{constants::WORKER_RUNTIME_VAR, AppOfflineProbe, EnvironmentInfo, HostOptionsMonitor};

use crate::RuntimeId;

/// How the host should bring up worker channels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedMode {
    /// The application is offline: start nothing.
    AppOffline,

    /// The host is a pre-warmed placeholder: initialize whitelisted channels speculatively.
    Placeholder,

    /// The runtime is known up front. The identifier may be empty, meaning no runtime was requested.
    ExplicitRuntime(RuntimeId),
}

impl ResolvedMode {
    /// Returns the mode name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AppOffline => "app_offline",
            Self::Placeholder => "placeholder",
            Self::ExplicitRuntime(_) => "explicit_runtime",
        }
    }
}

impl fmt::Display for ResolvedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitRuntime(runtime) if !runtime.is_empty() => write!(f, "{}({})", self.as_str(), runtime),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Inputs to mode resolution, captured at a single point in time.
#[derive(Clone, Debug)]
pub struct ModeInputs {
    /// Root directory of the application's scripts, checked for the app offline marker.
    pub script_path: PathBuf,

    /// Runtime configured for the application, or empty.
    pub explicit_runtime: RuntimeId,

    /// Whether the host is running in placeholder mode.
    pub is_placeholder_mode_enabled: bool,
}

impl ModeInputs {
    /// Captures the mode inputs from the environment and the current host options.
    pub fn capture(environment: &dyn EnvironmentInfo, host_options: &HostOptionsMonitor) -> Self {
        Self {
            script_path: host_options.current().script_path.clone(),
            explicit_runtime: RuntimeId::from(environment.get_variable(WORKER_RUNTIME_VAR)),
            is_placeholder_mode_enabled: environment.is_placeholder_mode_enabled(),
        }
    }

    /// Resolves the mode.
    ///
    /// The app offline check always comes first. Placeholder mode applies only when no runtime is configured and
    /// placeholder mode is enabled; every other case is explicit-runtime mode, even when the runtime is empty.
    pub fn resolve(self, offline_probe: &dyn AppOfflineProbe) -> ResolvedMode {
        if offline_probe.is_app_offline(&self.script_path) {
            return ResolvedMode::AppOffline;
        }

        if self.explicit_runtime.is_empty() && self.is_placeholder_mode_enabled {
            return ResolvedMode::Placeholder;
        }

        ResolvedMode::ExplicitRuntime(self.explicit_runtime)
    }
}
