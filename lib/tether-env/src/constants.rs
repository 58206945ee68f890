//! Well-known environment variable names and values.

/// Names the language runtime the application is configured to use.
pub const WORKER_RUNTIME_VAR: &str = "FUNCTIONS_WORKER_RUNTIME";

/// Set to [`PLACEHOLDER_MODE_ENABLED`] when the host is a pre-warmed placeholder.
pub const PLACEHOLDER_MODE_VAR: &str = "WEBSITE_PLACEHOLDER_MODE";

/// Value of [`PLACEHOLDER_MODE_VAR`] that enables placeholder mode.
pub const PLACEHOLDER_MODE_ENABLED: &str = "1";

/// Set by the platform when running inside a Linux container.
pub const CONTAINER_NAME_VAR: &str = "CONTAINER_NAME";

/// Set by the platform on dedicated hosting instances.
pub const INSTANCE_ID_VAR: &str = "WEBSITE_INSTANCE_ID";

/// File name of the marker that takes an application offline.
pub const APP_OFFLINE_FILE_NAME: &str = "app_offline.htm";
