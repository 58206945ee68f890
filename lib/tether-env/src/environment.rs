use std::collections::HashMap;

use tether_config::HostConfiguration;
use tether_error::{ErrorContext as _, GenericError};

use crate::{constants::*, OsPlatform};

/// Provides information about the environment in which the host is running.
///
/// Only [`get_variable`][EnvironmentInfo::get_variable] must be implemented. The remaining methods are derived from
/// well-known variables, and can be overridden by environments that know better.
pub trait EnvironmentInfo: Send + Sync {
    /// Returns the value of the given environment variable, or an empty string if it is unset.
    fn get_variable(&self, name: &str) -> String;

    /// Returns `true` if the host is running in a Linux hosting environment.
    ///
    /// This is the case inside a platform-managed Linux container, or on a dedicated hosting instance when the process
    /// itself runs on Linux.
    fn is_linux_hosting_environment(&self) -> bool {
        if !self.get_variable(CONTAINER_NAME_VAR).is_empty() {
            return true;
        }

        cfg!(target_os = "linux") && !self.get_variable(INSTANCE_ID_VAR).is_empty()
    }

    /// Returns `true` if the host is a pre-warmed placeholder that has not yet been assigned an application.
    fn is_placeholder_mode_enabled(&self) -> bool {
        self.get_variable(PLACEHOLDER_MODE_VAR) == PLACEHOLDER_MODE_ENABLED
    }

    /// Returns the operating system platform of the hosting environment.
    fn os_platform(&self) -> OsPlatform {
        OsPlatform::detect(self.is_linux_hosting_environment())
    }
}

impl<E> EnvironmentInfo for std::sync::Arc<E>
where
    E: EnvironmentInfo + ?Sized,
{
    fn get_variable(&self, name: &str) -> String {
        (**self).get_variable(name)
    }

    fn is_linux_hosting_environment(&self) -> bool {
        (**self).is_linux_hosting_environment()
    }

    fn is_placeholder_mode_enabled(&self) -> bool {
        (**self).is_placeholder_mode_enabled()
    }

    fn os_platform(&self) -> OsPlatform {
        (**self).os_platform()
    }
}

/// Environment backed by the variables of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl EnvironmentInfo for ProcessEnvironment {
    fn get_variable(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }
}

/// Environment backed by a fixed set of variables.
///
/// Nothing is read from the process environment, which makes this suitable for tests and for hosts that compute their
/// environment up front.
#[derive(Clone, Debug, Default)]
pub struct FixedEnvironment {
    variables: HashMap<String, String>,
    os_platform: Option<OsPlatform>,
}

impl FixedEnvironment {
    /// Creates a new `FixedEnvironment` from the given configuration.
    ///
    /// Variables are read from the `environment` key, as a map of names to values. A missing key yields an empty
    /// environment.
    ///
    /// # Errors
    ///
    /// If the `environment` key exists but is not a map of strings, an error is returned.
    pub fn from_configuration(config: &HostConfiguration) -> Result<Self, GenericError> {
        let variables = config
            .value::<HashMap<String, String>>("environment")
            .error_context("Invalid `environment` setting: expected a map of variable names to values.")?
            .unwrap_or_default();

        Ok(Self {
            variables,
            os_platform: None,
        })
    }

    /// Sets the given variable.
    pub fn with_variable<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Pins the reported OS platform, bypassing detection.
    pub fn with_os_platform(mut self, os_platform: OsPlatform) -> Self {
        self.os_platform = Some(os_platform);
        self
    }
}

impl EnvironmentInfo for FixedEnvironment {
    fn get_variable(&self, name: &str) -> String {
        self.variables.get(name).cloned().unwrap_or_default()
    }

    fn os_platform(&self) -> OsPlatform {
        self.os_platform
            .unwrap_or_else(|| OsPlatform::detect(self.is_linux_hosting_environment()))
    }
}
