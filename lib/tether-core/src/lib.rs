//! Startup and shutdown orchestration for RPC worker channels.
//!
//! A worker host talks to language-runtime workers over an RPC transport, with one channel per runtime. This crate
//! decides, at host start, which channels to bring up, and tears the transport down at host stop.
//!
//! # Startup
//!
//! The [`LifecycleCoordinator`] resolves a [`ResolvedMode`] from the environment:
//!
//! - if the application has been taken offline, nothing is started at all
//! - if no runtime is configured and the host is a pre-warmed placeholder, channels for the runtimes whitelisted for
//!   the host's platform are initialized speculatively and concurrently, on a best-effort basis
//! - otherwise, the configured runtime's channel is initialized if, and only if, it is whitelisted to start at host
//!   level, and any failure blocks the host from becoming ready
//!
//! The RPC transport is always started before any channel is initialized.
//!
//! # Shutdown
//!
//! Shutdown happens in two phases that the host invokes separately. [`LifecycleCoordinator::stop`] tears down the
//! channels while the transport is still reachable. [`LifecycleCoordinator::stop_managed_services`] later tears down
//! the transport itself, asking for a graceful shutdown first and escalating to a forced kill if that fails or does not
//! finish in time. See [`ShutdownEscalator`].
#![deny(warnings)]
#![deny(missing_docs)]

mod config;
pub use self::config::LifecycleConfiguration;

mod coordinator;
pub use self::coordinator::{LifecycleCoordinator, LifecycleCoordinatorBuilder, LifecycleState};

mod error;
pub use self::error::LifecycleError;

mod mode;
pub use self::mode::{ModeInputs, ResolvedMode};

mod policy;
pub use self::policy::{ChannelInitializationPolicy, InitializationSummary};

mod runtime;
pub use self::runtime::RuntimeId;

mod shutdown;
pub use self::shutdown::{ShutdownEscalator, ShutdownOutcome, DEFAULT_SHUTDOWN_TIMEOUT};

mod transport;
pub use self::transport::{ChannelRegistry, RpcTransport};

mod whitelist;
pub use self::whitelist::{PlaceholderWhitelist, WebHostWhitelist};

#[cfg(test)]
mod test_util;
