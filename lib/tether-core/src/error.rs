use snafu::Snafu;
use tether_error::GenericError;

use crate::{LifecycleState, RuntimeId};

/// Lifecycle errors.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum LifecycleError {
    /// The lifecycle was already started.
    ///
    /// The lifecycle can only be started once per process.
    #[snafu(display("Lifecycle was already started (current state: {}).", state))]
    AlreadyStarted {
        /// State of the lifecycle when the start was attempted.
        state: LifecycleState,
    },

    /// The lifecycle was stopped, so it can no longer be started.
    #[snafu(display("Lifecycle cannot be started after it was stopped (current state: {}).", state))]
    Stopped {
        /// State of the lifecycle when the start was attempted.
        state: LifecycleState,
    },

    /// The operation was cancelled before it had any effect.
    #[snafu(display("Lifecycle operation was cancelled before it began."))]
    Cancelled,

    /// The RPC transport failed to start.
    ///
    /// No channels are initialized when this happens, since they would have no working transport to talk over.
    #[snafu(display("Failed to start RPC transport. Check if the host is hitting connection limits."))]
    TransportStart {
        /// The underlying transport error.
        source: GenericError,
    },

    /// A channel that is required for the host to become ready failed to initialize.
    #[snafu(display("Failed to initialize channel for runtime '{}'.", runtime))]
    ChannelInitialization {
        /// The runtime whose channel failed to initialize.
        runtime: RuntimeId,

        /// The underlying channel error.
        source: GenericError,
    },

    /// The host-level whitelist can no longer be changed because the lifecycle has started.
    #[snafu(display("Cannot add runtime '{}' to the host-level whitelist after the lifecycle has started.", runtime))]
    WhitelistSealed {
        /// The runtime that could not be added.
        runtime: RuntimeId,
    },
}
