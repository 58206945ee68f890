use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use snafu::ResultExt as _;
use tether_env::{AppOfflineProbe, EnvironmentInfo, FileMarkerProbe, HostOptionsMonitor};
use tether_error::format_error_chain;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::{AlreadyStarted, Cancelled, Stopped, TransportStart, WhitelistSealed},
    ChannelInitializationPolicy, ChannelRegistry, LifecycleConfiguration, LifecycleError, ModeInputs,
    PlaceholderWhitelist, ResolvedMode, RpcTransport, RuntimeId, ShutdownEscalator, WebHostWhitelist,
    DEFAULT_SHUTDOWN_TIMEOUT,
};

/// Lifecycle state, for diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleState {
    /// Not started yet.
    Uninitialized,

    /// Start is in progress.
    Starting,

    /// Start completed without doing anything, because the application is offline.
    Skipped,

    /// Start completed successfully.
    Ready,

    /// Start returned an error.
    Failed,

    /// Worker channels have been shut down.
    ChannelsStopped,

    /// The RPC transport has been shut down.
    TransportShutdown,
}

impl LifecycleState {
    /// Returns the state name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Skipped => "skipped",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::ChannelsStopped => "channels_stopped",
            Self::TransportShutdown => "transport_shutdown",
        }
    }

    /// Returns `true` if teardown has begun.
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::ChannelsStopped | Self::TransportShutdown)
    }

    // States only ever move to a later phase.
    const fn phase(&self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Starting => 1,
            Self::Skipped | Self::Ready | Self::Failed => 2,
            Self::ChannelsStopped => 3,
            Self::TransportShutdown => 4,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for [`LifecycleCoordinator`].
pub struct LifecycleCoordinatorBuilder {
    environment: Arc<dyn EnvironmentInfo>,
    host_options: HostOptionsMonitor,
    offline_probe: Arc<dyn AppOfflineProbe>,
    transport: Arc<dyn RpcTransport>,
    registry: Arc<dyn ChannelRegistry>,
    placeholder: PlaceholderWhitelist,
    webhost: WebHostWhitelist,
    shutdown_timeout: Duration,
}

impl LifecycleCoordinatorBuilder {
    /// Applies the given configuration, replacing both whitelists and the shutdown timeout.
    pub fn with_configuration(mut self, config: &LifecycleConfiguration) -> Self {
        self.placeholder = config.placeholder_whitelist();
        self.webhost = config.webhost_whitelist();
        self.shutdown_timeout = config.shutdown_timeout();
        self
    }

    /// Sets the placeholder whitelist.
    ///
    /// Defaults to [`PlaceholderWhitelist::default`].
    pub fn with_placeholder_whitelist(mut self, placeholder: PlaceholderWhitelist) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Sets the host-level whitelist.
    ///
    /// Defaults to [`WebHostWhitelist::default`].
    pub fn with_webhost_whitelist(mut self, webhost: WebHostWhitelist) -> Self {
        self.webhost = webhost;
        self
    }

    /// Sets how long to wait for the RPC transport to shut down gracefully before killing it.
    ///
    /// Defaults to [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Sets the app offline probe.
    ///
    /// Defaults to [`FileMarkerProbe`].
    pub fn with_offline_probe<P>(mut self, offline_probe: P) -> Self
    where
        P: AppOfflineProbe + 'static,
    {
        self.offline_probe = Arc::new(offline_probe);
        self
    }

    /// Builds the coordinator.
    pub fn build(self) -> LifecycleCoordinator {
        LifecycleCoordinator {
            environment: self.environment,
            host_options: self.host_options,
            offline_probe: self.offline_probe,
            transport: self.transport,
            registry: self.registry,
            policy: ChannelInitializationPolicy::new(self.placeholder, self.webhost),
            escalator: ShutdownEscalator::new(self.shutdown_timeout),
            state: Mutex::new(LifecycleState::Uninitialized),
            transport_shutdown_started: AtomicBool::new(false),
        }
    }
}

/// Brings worker channels and their RPC transport up at host start, and down at host stop.
///
/// The host drives the coordinator through three calls, invoked one at a time:
///
/// - [`start`][Self::start] once, at host start
/// - [`stop`][Self::stop] at host stop, to tear down worker channels
/// - [`stop_managed_services`][Self::stop_managed_services] afterwards, to tear down the transport
///
/// Channel teardown and transport teardown are kept separate so that channels can still reach the transport while they
/// shut down.
pub struct LifecycleCoordinator {
    environment: Arc<dyn EnvironmentInfo>,
    host_options: HostOptionsMonitor,
    offline_probe: Arc<dyn AppOfflineProbe>,
    transport: Arc<dyn RpcTransport>,
    registry: Arc<dyn ChannelRegistry>,
    policy: ChannelInitializationPolicy,
    escalator: ShutdownEscalator,
    state: Mutex<LifecycleState>,
    transport_shutdown_started: AtomicBool,
}

impl LifecycleCoordinator {
    /// Creates a builder for a coordinator over the given collaborators.
    pub fn builder(
        environment: Arc<dyn EnvironmentInfo>, host_options: HostOptionsMonitor, transport: Arc<dyn RpcTransport>,
        registry: Arc<dyn ChannelRegistry>,
    ) -> LifecycleCoordinatorBuilder {
        LifecycleCoordinatorBuilder {
            environment,
            host_options,
            offline_probe: Arc::new(FileMarkerProbe),
            transport,
            registry,
            placeholder: PlaceholderWhitelist::default(),
            webhost: WebHostWhitelist::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance_state(&self, next: LifecycleState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if next.phase() > state.phase() {
            *state = next;
        }
    }

    /// Adds a runtime to the host-level whitelist.
    ///
    /// Adding a runtime that is already whitelisted does nothing.
    ///
    /// # Errors
    ///
    /// If the lifecycle has already been started, an error is returned and the whitelist is left unchanged.
    pub fn add_webhost_runtime(&mut self, runtime: RuntimeId) -> Result<(), LifecycleError> {
        if self.state() != LifecycleState::Uninitialized {
            return WhitelistSealed { runtime }.fail();
        }

        if self.policy.webhost_whitelist_mut().add_runtime(runtime.clone()) {
            debug!(%runtime, "Added runtime to host-level whitelist.");
        }

        Ok(())
    }

    /// Starts the RPC transport and initializes the worker channels required by the current mode.
    ///
    /// If the application is offline, nothing is started. Otherwise, the transport is started first, and channels are
    /// initialized only once it is up.
    ///
    /// # Errors
    ///
    /// If the lifecycle was already started or stopped, or `cancel` fired before anything was started, an error is returned and
    /// nothing is done. If the transport fails to start, or the channel for an explicitly configured runtime fails to
    /// initialize, an error is returned and the host should not be considered ready.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.is_stopped() {
                return Stopped { state: *state }.fail();
            }

            if *state != LifecycleState::Uninitialized {
                return AlreadyStarted { state: *state }.fail();
            }

            if cancel.is_cancelled() {
                debug!("Lifecycle start cancelled before mode resolution.");
                return Cancelled.fail();
            }

            *state = LifecycleState::Starting;
        }

        let result = self.start_inner().await;
        self.advance_state(match &result {
            Ok(state) => *state,
            Err(_) => LifecycleState::Failed,
        });

        result.map(|_| ())
    }

    async fn start_inner(&self) -> Result<LifecycleState, LifecycleError> {
        let mode =
            ModeInputs::capture(self.environment.as_ref(), &self.host_options).resolve(self.offline_probe.as_ref());
        if mode == ResolvedMode::AppOffline {
            info!(%mode, "Application is offline. Skipping RPC transport and worker channel initialization.");
            return Ok(LifecycleState::Skipped);
        }

        let platform = self.environment.os_platform();
        debug!(%mode, %platform, "Resolved worker channel mode.");

        if let Err(e) = self.transport.start().await {
            error!(%mode, error = %format_error_chain(&e), "Failed to start RPC transport. Check if the host is hitting connection limits.");
            return Err(e).context(TransportStart);
        }
        debug!("RPC transport started.");

        let summary = self
            .policy
            .initialize_channels(&mode, platform, &self.registry)
            .await?;

        info!(
            %mode,
            %platform,
            attempted = summary.attempted,
            failed = summary.failed,
            "Worker channel lifecycle started."
        );

        Ok(LifecycleState::Ready)
    }

    /// Shuts down all worker channels.
    ///
    /// The RPC transport is left running. Channel teardown always runs to completion: a fired `cancel` is logged but
    /// does not skip it.
    pub fn stop(&self, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            debug!("Stop requested with cancellation already signalled. Shutting down worker channels anyway.");
        }

        debug!("Shutting down worker channels.");
        self.registry.shutdown_all_channels();
        self.advance_state(LifecycleState::ChannelsStopped);
    }

    /// Shuts down the RPC transport, escalating to a forced kill if graceful shutdown fails or times out.
    ///
    /// Only the first call does anything. The graceful shutdown timeout is the only bound on how long this takes: a
    /// fired `cancel` is logged but does not cut it short.
    pub async fn stop_managed_services(&self, cancel: &CancellationToken) {
        if self.transport_shutdown_started.swap(true, Ordering::AcqRel) {
            warn!("RPC transport shutdown was already requested. Ignoring.");
            return;
        }

        if cancel.is_cancelled() {
            debug!("Transport shutdown requested with cancellation already signalled. Shutdown remains bounded by its timeout.");
        }

        let outcome = self.escalator.shutdown(self.transport.as_ref()).await;
        debug!(escalated = outcome.was_escalated(), "RPC transport shutdown complete.");
        self.advance_state(LifecycleState::TransportShutdown);
    }
}
