use std::{collections::HashMap, sync::Arc};

use snafu::ResultExt as _;
use tether_env::OsPlatform;
use tether_error::{format_error_chain, generic_error};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    error::ChannelInitialization, ChannelRegistry, LifecycleError, PlaceholderWhitelist, ResolvedMode, RuntimeId,
    WebHostWhitelist,
};

/// Outcome of a channel initialization pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InitializationSummary {
    /// Number of channels an initialization request was issued for.
    pub attempted: usize,

    /// Number of those requests that failed.
    pub failed: usize,
}

/// Decides which channels to initialize for a resolved mode, and initializes them.
#[derive(Clone, Debug, Default)]
pub struct ChannelInitializationPolicy {
    placeholder: PlaceholderWhitelist,
    webhost: WebHostWhitelist,
}

impl ChannelInitializationPolicy {
    /// Creates a new `ChannelInitializationPolicy` from the given whitelists.
    pub fn new(placeholder: PlaceholderWhitelist, webhost: WebHostWhitelist) -> Self {
        Self { placeholder, webhost }
    }

    /// Returns the placeholder whitelist.
    pub fn placeholder_whitelist(&self) -> &PlaceholderWhitelist {
        &self.placeholder
    }

    /// Returns the host-level whitelist.
    pub fn webhost_whitelist(&self) -> &WebHostWhitelist {
        &self.webhost
    }

    pub(crate) fn webhost_whitelist_mut(&mut self) -> &mut WebHostWhitelist {
        &mut self.webhost
    }

    /// Initializes the channels required by `mode`.
    ///
    /// - `AppOffline` initializes nothing.
    /// - `Placeholder` initializes every runtime whitelisted for `platform`, concurrently. This is best-effort: failed
    ///   channels are logged and counted in the summary, but never fail the operation.
    /// - `ExplicitRuntime` initializes the runtime only if it is non-empty and whitelisted at host level, and waits for
    ///   it. Other runtimes are left to be initialized later, outside of the host lifecycle.
    ///
    /// # Errors
    ///
    /// If the channel for an explicitly configured, whitelisted runtime fails to initialize, an error is returned.
    pub async fn initialize_channels(
        &self, mode: &ResolvedMode, platform: OsPlatform, registry: &Arc<dyn ChannelRegistry>,
    ) -> Result<InitializationSummary, LifecycleError> {
        match mode {
            ResolvedMode::AppOffline => Ok(InitializationSummary::default()),
            ResolvedMode::Placeholder => Ok(self.initialize_placeholder_channels(platform, registry).await),
            ResolvedMode::ExplicitRuntime(runtime) => self.initialize_webhost_channel(runtime, registry).await,
        }
    }

    async fn initialize_placeholder_channels(
        &self, platform: OsPlatform, registry: &Arc<dyn ChannelRegistry>,
    ) -> InitializationSummary {
        let mut channel_tasks = JoinSet::new();
        let mut channel_task_map = HashMap::new();

        for runtime in self.placeholder.runtimes_for(platform) {
            debug!(%platform, %runtime, "Initializing placeholder channel.");

            let task_registry = Arc::clone(registry);
            let task_runtime = runtime.clone();
            let abort_handle =
                channel_tasks.spawn(async move { task_registry.initialize_channel(&task_runtime).await });
            channel_task_map.insert(abort_handle.id(), runtime.clone());
        }

        let mut summary = InitializationSummary {
            attempted: channel_tasks.len(),
            failed: 0,
        };

        while let Some(task_result) = channel_tasks.join_next_with_id().await {
            let (task_id, channel_result) = match task_result {
                Ok((task_id, channel_result)) => (task_id, channel_result),
                Err(e) => (e.id(), Err(generic_error!(e))),
            };
            let runtime = channel_task_map.remove(&task_id);
            let runtime = runtime.as_ref().map(RuntimeId::as_str).unwrap_or("unknown");

            match channel_result {
                Ok(()) => debug!(%platform, runtime, "Placeholder channel initialized."),
                Err(e) => {
                    summary.failed += 1;
                    warn!(%platform, runtime, error = %format_error_chain(&e), "Failed to initialize placeholder channel. Continuing with remaining channels.");
                }
            }
        }

        debug!(
            %platform,
            attempted = summary.attempted,
            failed = summary.failed,
            "Placeholder channel initialization complete."
        );

        summary
    }

    async fn initialize_webhost_channel(
        &self, runtime: &RuntimeId, registry: &Arc<dyn ChannelRegistry>,
    ) -> Result<InitializationSummary, LifecycleError> {
        if runtime.is_empty() {
            debug!("No runtime configured. Skipping host-level channel initialization.");
            return Ok(InitializationSummary::default());
        }

        if !self.webhost.contains(runtime.as_str()) {
            debug!(%runtime, "Runtime is not whitelisted for host-level start. Deferring channel initialization.");
            return Ok(InitializationSummary::default());
        }

        debug!(%runtime, "Initializing host-level channel.");
        registry
            .initialize_channel(runtime)
            .await
            .context(ChannelInitialization {
                runtime: runtime.clone(),
            })?;

        Ok(InitializationSummary {
            attempted: 1,
            failed: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_util::{Behavior, Call, CallLog, MockRegistry};

    fn policy_with(windows: &[&str], linux: &[&str], webhost: &[&str]) -> ChannelInitializationPolicy {
        ChannelInitializationPolicy::new(
            PlaceholderWhitelist::new(
                windows.iter().map(|id| RuntimeId::new(id)),
                linux.iter().map(|id| RuntimeId::new(id)),
            ),
            WebHostWhitelist::new(webhost.iter().map(|id| RuntimeId::new(id))),
        )
    }

    fn shared(registry: MockRegistry) -> Arc<dyn ChannelRegistry> {
        Arc::new(registry)
    }

    #[tokio::test]
    async fn app_offline_initializes_nothing() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));

        let summary = ChannelInitializationPolicy::default()
            .initialize_channels(&ResolvedMode::AppOffline, OsPlatform::Linux, &registry)
            .await
            .unwrap();

        assert_eq!(summary, InitializationSummary::default());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn placeholder_on_linux_initializes_linux_runtimes_only() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));
        let policy = policy_with(&["java"], &["python", "node"], &["java"]);

        let summary = policy
            .initialize_channels(&ResolvedMode::Placeholder, OsPlatform::Linux, &registry)
            .await
            .unwrap();

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(log.initialized_runtimes(), vec!["node", "python"]);
    }

    #[tokio::test]
    async fn placeholder_on_windows_initializes_windows_runtimes_only() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));

        ChannelInitializationPolicy::default()
            .initialize_channels(&ResolvedMode::Placeholder, OsPlatform::Windows, &registry)
            .await
            .unwrap();

        assert_eq!(log.initialized_runtimes(), vec!["java"]);
    }

    #[tokio::test]
    async fn placeholder_on_other_platform_falls_back_to_windows() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));

        ChannelInitializationPolicy::default()
            .initialize_channels(&ResolvedMode::Placeholder, OsPlatform::Other, &registry)
            .await
            .unwrap();

        assert_eq!(log.initialized_runtimes(), vec!["java"]);
    }

    #[tokio::test]
    async fn placeholder_failures_do_not_abort_siblings() {
        let log = CallLog::default();
        let registry = shared(
            MockRegistry::new(&log)
                .with_channel("node", Behavior::Fail("worker exited during handshake"))
                .with_channel("python", Behavior::SucceedAfter(Duration::from_millis(20)))
                .with_panicking_channel("powershell"),
        );
        let policy = policy_with(&["java"], &["node", "powershell", "python"], &["java"]);

        let summary = policy
            .initialize_channels(&ResolvedMode::Placeholder, OsPlatform::Linux, &registry)
            .await
            .unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(log.initialized_runtimes(), vec!["node", "powershell", "python"]);
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_channels_initialize_concurrently() {
        let log = CallLog::default();
        let registry = shared(
            MockRegistry::new(&log)
                .with_channel("node", Behavior::SucceedAfter(Duration::from_secs(10)))
                .with_channel("python", Behavior::SucceedAfter(Duration::from_secs(10))),
        );
        let policy = policy_with(&["java"], &["node", "python"], &["java"]);

        let started = tokio::time::Instant::now();
        policy
            .initialize_channels(&ResolvedMode::Placeholder, OsPlatform::Linux, &registry)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test]
    async fn whitelisted_explicit_runtime_is_initialized_once() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));

        let summary = ChannelInitializationPolicy::default()
            .initialize_channels(
                &ResolvedMode::ExplicitRuntime(RuntimeId::new("java")),
                OsPlatform::Linux,
                &registry,
            )
            .await
            .unwrap();

        assert_eq!(summary.attempted, 1);
        assert_eq!(log.count(&Call::InitializeChannel("java".to_string())), 1);
        assert_eq!(log.calls().len(), 1);
    }

    #[tokio::test]
    async fn whitelisted_explicit_runtime_failure_propagates() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log).with_channel("java", Behavior::Fail("jvm not found")));

        let result = ChannelInitializationPolicy::default()
            .initialize_channels(
                &ResolvedMode::ExplicitRuntime(RuntimeId::new("java")),
                OsPlatform::Windows,
                &registry,
            )
            .await;

        match result {
            Err(LifecycleError::ChannelInitialization { runtime, source }) => {
                assert_eq!(runtime.as_str(), "java");
                assert_eq!(source.to_string(), "jvm not found");
            }
            other => panic!("expected ChannelInitialization, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_whitelisted_or_empty_explicit_runtime_is_skipped() {
        let log = CallLog::default();
        let registry = shared(MockRegistry::new(&log));
        let policy = ChannelInitializationPolicy::default();

        for runtime in ["node", "", "Java"] {
            let summary = policy
                .initialize_channels(
                    &ResolvedMode::ExplicitRuntime(RuntimeId::new(runtime)),
                    OsPlatform::Linux,
                    &registry,
                )
                .await
                .unwrap();
            assert_eq!(summary, InitializationSummary::default());
        }

        assert!(log.calls().is_empty());
    }
}
