//! Host configuration.
//!
//! A worker host hands the lifecycle a single [`HostConfiguration`], assembled from in-memory values, an optional YAML
//! file, and `TETHER_`-prefixed environment variables. Each lifecycle component pulls out its own section: the whole
//! document as a typed struct via [`HostConfiguration::section`], or a single key via [`HostConfiguration::value`].
//!
//! Sources are resolved as they are added, so a missing or malformed file is reported where it is loaded rather than at
//! first lookup.
#![deny(warnings)]
#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use figment::{
    error::Kind,
    providers::{Env, Format as _, Serialized, Yaml},
    Figment, Provider as _,
};
use serde::{de::DeserializeOwned, Serialize};
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

/// Default prefix for environment variable overrides.
pub const DEFAULT_ENVIRONMENT_PREFIX: &str = "TETHER";

/// Separator for nested keys in environment variable names.
///
/// `TETHER_PLACEHOLDER_RUNTIMES__LINUX` sets `placeholder_runtimes.linux`.
pub const ENVIRONMENT_NESTING_SEPARATOR: &str = "__";

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Configuration file could not be read.
    #[snafu(display("Failed to read configuration file '{}'.", path.display()))]
    Unreadable {
        /// Path to the file.
        path: PathBuf,

        /// Error source.
        source: std::io::Error,
    },

    /// Configuration file was not valid YAML.
    #[snafu(display("Configuration file '{}' is not valid YAML.", path.display()))]
    Malformed {
        /// Path to the file.
        path: PathBuf,

        /// Error source.
        source: figment::Error,
    },

    /// A setting had a different data type than expected.
    #[snafu(display("Expected setting '{}' to be {}, got {} instead.", field, expected, actual))]
    InvalidField {
        /// Period-separated path to the setting.
        field: String,

        /// Expected data type.
        expected: String,

        /// Actual data type.
        actual: String,
    },

    /// Any other extraction failure, such as a required setting being absent.
    #[snafu(display("Failed to extract configuration."))]
    Extraction {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual, expected) => Self::InvalidField {
                field: e.path.join("."),
                expected,
                actual: actual.to_string(),
            },
            _ => Self::Extraction { source: e },
        }
    }
}

/// Configuration handed to the lifecycle by its host.
///
/// Sources added later override keys set by sources added earlier.
#[derive(Debug)]
pub struct HostConfiguration {
    figment: Figment,
}

impl Default for HostConfiguration {
    fn default() -> Self {
        Self { figment: Figment::new() }
    }
}

impl HostConfiguration {
    /// Creates a configuration from in-memory values.
    pub fn from_values<T>(values: T) -> Self
    where
        T: Serialize,
    {
        Self::default().with_values(values)
    }

    /// Creates a configuration from the given YAML file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or is not valid YAML, an error is returned.
    pub fn from_yaml<P>(path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        Self::default().with_yaml(path)
    }

    /// Overlays in-memory values.
    pub fn with_values<T>(self, values: T) -> Self
    where
        T: Serialize,
    {
        Self {
            figment: self.figment.merge(Serialized::defaults(values)),
        }
    }

    /// Overlays the given YAML file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or is not valid YAML, an error is returned.
    pub fn with_yaml<P>(self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(Unreadable { path })?;

        let provider = Yaml::string(&contents);
        provider.data().context(Malformed { path })?;

        debug!(file_path = %path.display(), "Loaded configuration file.");
        Ok(Self {
            figment: self.figment.merge(provider),
        })
    }

    /// Overlays environment variables starting with `prefix`.
    ///
    /// The prefix is case-insensitive, and an underscore is appended if it does not already end with one. Nested keys
    /// are separated by [`ENVIRONMENT_NESTING_SEPARATOR`].
    ///
    /// # Errors
    ///
    /// If the prefix is empty, an error is returned.
    pub fn with_environment_overrides(self, prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        Ok(Self {
            figment: self
                .figment
                .merge(Env::prefixed(&prefix).split(ENVIRONMENT_NESTING_SEPARATOR)),
        })
    }

    /// Deserializes the whole configuration as `T`.
    ///
    /// # Errors
    ///
    /// If the configuration could not be deserialized into `T`, an error is returned.
    pub fn section<T>(&self) -> Result<T, ConfigurationError>
    where
        T: DeserializeOwned,
    {
        Ok(self.figment.extract()?)
    }

    /// Gets the value of a single setting, if it is set.
    ///
    /// Keys are in the form `a.b.c`, where periods indicate a nested value.
    ///
    /// # Errors
    ///
    /// If the setting exists but could not be deserialized into `T`, an error is returned.
    pub fn value<T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: DeserializeOwned,
    {
        match self.figment.extract_inner(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if matches!(e.kind, Kind::MissingField(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
