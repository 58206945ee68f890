//! Helpers for querying the environment a worker host runs in.
//!
//! The lifecycle only needs a handful of facts about its surroundings: a few environment variables, whether this is a
//! Linux hosting environment, whether placeholder mode is enabled, where the application's scripts live, and whether
//! the application has been taken offline. Each of these is exposed behind a small trait or type so that hosts can
//! supply the real process environment and tests can supply fixed values.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod constants;

mod environment;
pub use self::environment::{EnvironmentInfo, FixedEnvironment, ProcessEnvironment};

mod host;
pub use self::host::{HostOptions, HostOptionsMonitor};

mod offline;
pub use self::offline::{AppOfflineProbe, FileMarkerProbe};

mod platform;
pub use self::platform::OsPlatform;
