use async_trait::async_trait;
use tether_error::GenericError;

use crate::RuntimeId;

/// The RPC transport that worker channels communicate over.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Starts the transport.
    ///
    /// # Errors
    ///
    /// If the transport cannot be started, an error is returned.
    async fn start(&self) -> Result<(), GenericError>;

    /// Asks the transport to stop accepting new work and drain.
    ///
    /// May take arbitrarily long, or never complete. Callers are expected to bound it.
    ///
    /// # Errors
    ///
    /// If the transport fails while shutting down, an error is returned.
    async fn shutdown(&self) -> Result<(), GenericError>;

    /// Terminates the transport unconditionally.
    ///
    /// # Errors
    ///
    /// If the transport could not be terminated, an error is returned.
    async fn kill(&self) -> Result<(), GenericError>;
}

/// Registry that owns the worker channel for each language runtime.
#[async_trait]
pub trait ChannelRegistry: Send + Sync {
    /// Initializes the channel for the given runtime.
    ///
    /// # Errors
    ///
    /// If the channel fails to initialize, an error is returned.
    async fn initialize_channel(&self, runtime: &RuntimeId) -> Result<(), GenericError>;

    /// Shuts down every channel the registry has initialized.
    ///
    /// Fire-and-forget: the registry handles and reports its own failures.
    fn shutdown_all_channels(&self);
}
