use std::time::Duration;

use tether_error::{format_error_chain, GenericError};
use tokio::{select, time::sleep};
use tracing::{debug, error, info, warn};

use crate::RpcTransport;

/// Default amount of time to wait for the RPC transport to shut down gracefully.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(5000);

/// How the RPC transport was brought down.
#[derive(Debug)]
pub enum ShutdownOutcome {
    /// Graceful shutdown completed successfully within the timeout.
    GracefulCompleted,

    /// Graceful shutdown failed or timed out, and the transport was killed successfully.
    EscalatedToForced,

    /// Graceful shutdown failed or timed out, and killing the transport failed too.
    ForcedFailed(GenericError),
}

impl ShutdownOutcome {
    /// Returns `true` if the transport had to be killed.
    pub fn was_escalated(&self) -> bool {
        !matches!(self, Self::GracefulCompleted)
    }
}

enum GracefulResult {
    Completed,
    Failed(GenericError),
    TimedOut,
}

/// Shuts the RPC transport down, escalating from graceful to forced.
///
/// A graceful shutdown is requested first and raced against a timer. If it completes successfully before the timer
/// fires, nothing else happens. If it fails, or the timer fires first, the graceful attempt is abandoned and the
/// transport is killed exactly once.
#[derive(Clone, Debug)]
pub struct ShutdownEscalator {
    timeout: Duration,
}

impl ShutdownEscalator {
    /// Creates a new `ShutdownEscalator` with the given graceful shutdown timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the graceful shutdown timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shuts down the given transport.
    ///
    /// Never fails: every error is logged and reflected in the returned outcome.
    pub async fn shutdown(&self, transport: &dyn RpcTransport) -> ShutdownOutcome {
        info!(operation = "graceful", timeout = ?self.timeout, "Shutting down RPC transport.");

        let graceful_result = {
            let graceful = transport.shutdown();
            let timer = sleep(self.timeout);

            select! {
                biased;

                result = graceful => match result {
                    Ok(()) => GracefulResult::Completed,
                    Err(e) => GracefulResult::Failed(e),
                },
                _ = timer => GracefulResult::TimedOut,
            }
        };

        match graceful_result {
            GracefulResult::Completed => {
                debug!(operation = "graceful", "RPC transport shut down gracefully.");
                return ShutdownOutcome::GracefulCompleted;
            }
            GracefulResult::Failed(e) => {
                warn!(operation = "graceful", error = %format_error_chain(&e), "Graceful shutdown of RPC transport failed. Killing transport.");
            }
            GracefulResult::TimedOut => {
                warn!(operation = "graceful", timeout = ?self.timeout, "RPC transport did not shut down in time. Killing transport.");
            }
        }

        match transport.kill().await {
            Ok(()) => {
                info!(operation = "forced", "RPC transport killed.");
                ShutdownOutcome::EscalatedToForced
            }
            Err(e) => {
                error!(operation = "forced", error = %format_error_chain(&e), "Failed to kill RPC transport.");
                ShutdownOutcome::ForcedFailed(e)
            }
        }
    }
}

impl Default for ShutdownEscalator {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::test_util::{Behavior, Call, CallLog, MockTransport};

    #[tokio::test(start_paused = true)]
    async fn graceful_success_does_not_kill() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log).with_shutdown(Behavior::SucceedAfter(Duration::from_millis(100)));

        let outcome = ShutdownEscalator::default().shutdown(&transport).await;

        assert!(matches!(outcome, ShutdownOutcome::GracefulCompleted));
        assert!(!outcome.was_escalated());
        assert_eq!(log.calls(), vec![Call::TransportShutdown]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_graceful_shutdown_is_killed_once_after_timeout() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log).with_shutdown(Behavior::Hang);
        let escalator = ShutdownEscalator::new(Duration::from_secs(5));

        let started = Instant::now();
        let outcome = escalator.shutdown(&transport).await;

        assert!(matches!(outcome, ShutdownOutcome::EscalatedToForced));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(log.calls(), vec![Call::TransportShutdown, Call::TransportKill]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_graceful_shutdown_is_killed_without_waiting() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log).with_shutdown(Behavior::FailAfter(
            Duration::from_millis(10),
            "listener already closed",
        ));
        let escalator = ShutdownEscalator::new(Duration::from_secs(5));

        let started = Instant::now();
        let outcome = escalator.shutdown(&transport).await;

        assert!(matches!(outcome, ShutdownOutcome::EscalatedToForced));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(log.count(&Call::TransportKill), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_graceful_shutdown_escalates() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log).with_shutdown(Behavior::SucceedAfter(Duration::from_secs(10)));
        let escalator = ShutdownEscalator::new(Duration::from_secs(1));

        let outcome = escalator.shutdown(&transport).await;

        assert!(matches!(outcome, ShutdownOutcome::EscalatedToForced));
        assert_eq!(log.count(&Call::TransportKill), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn kill_failure_is_reported_not_raised() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log)
            .with_shutdown(Behavior::Fail("drain failed"))
            .with_kill(Behavior::Fail("process not found"));

        let outcome = ShutdownEscalator::default().shutdown(&transport).await;

        match outcome {
            ShutdownOutcome::ForcedFailed(e) => assert_eq!(e.to_string(), "process not found"),
            other => panic!("expected ForcedFailed, got: {:?}", other),
        }
        assert_eq!(log.count(&Call::TransportKill), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_prefers_an_immediately_ready_graceful_shutdown() {
        let log = CallLog::default();
        let transport = MockTransport::new(&log);

        let outcome = ShutdownEscalator::new(Duration::ZERO).shutdown(&transport).await;

        assert!(matches!(outcome, ShutdownOutcome::GracefulCompleted));
        assert_eq!(log.count(&Call::TransportKill), 0);
    }
}
