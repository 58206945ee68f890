use std::{
    collections::{HashMap, HashSet},
    future::pending,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tether_error::{generic_error, GenericError};

use crate::{ChannelRegistry, RpcTransport, RuntimeId};

/// A call made against a mock collaborator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    TransportStart,
    TransportShutdown,
    TransportKill,
    InitializeChannel(String),
    ShutdownAllChannels,
}

/// Ordered log of calls, shared between mocks so that cross-collaborator ordering can be asserted.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn initialized_runtimes(&self) -> Vec<String> {
        let mut runtimes = self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::InitializeChannel(runtime) => Some(runtime),
                _ => None,
            })
            .collect::<Vec<_>>();
        runtimes.sort();
        runtimes
    }

    pub fn touched_transport(&self) -> bool {
        self.calls().iter().any(|call| {
            matches!(
                call,
                Call::TransportStart | Call::TransportShutdown | Call::TransportKill
            )
        })
    }

    pub fn touched_registry(&self) -> bool {
        self.calls()
            .iter()
            .any(|call| matches!(call, Call::InitializeChannel(_) | Call::ShutdownAllChannels))
    }
}

/// How a mock operation behaves once called.
#[derive(Clone, Copy)]
pub enum Behavior {
    /// Completes successfully right away.
    Succeed,

    /// Completes successfully after the given delay.
    SucceedAfter(Duration),

    /// Fails right away with the given message.
    Fail(&'static str),

    /// Fails after the given delay.
    FailAfter(Duration, &'static str),

    /// Never completes.
    Hang,
}

impl Behavior {
    async fn run(self) -> Result<(), GenericError> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::SucceedAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Behavior::Fail(msg) => Err(generic_error!(msg)),
            Behavior::FailAfter(delay, msg) => {
                tokio::time::sleep(delay).await;
                Err(generic_error!(msg))
            }
            Behavior::Hang => pending().await,
        }
    }
}

pub struct MockTransport {
    log: CallLog,
    start: Behavior,
    shutdown: Behavior,
    kill: Behavior,
}

impl MockTransport {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            start: Behavior::Succeed,
            shutdown: Behavior::Succeed,
            kill: Behavior::Succeed,
        }
    }

    pub fn with_start(mut self, behavior: Behavior) -> Self {
        self.start = behavior;
        self
    }

    pub fn with_shutdown(mut self, behavior: Behavior) -> Self {
        self.shutdown = behavior;
        self
    }

    pub fn with_kill(mut self, behavior: Behavior) -> Self {
        self.kill = behavior;
        self
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn start(&self) -> Result<(), GenericError> {
        self.log.record(Call::TransportStart);
        self.start.run().await
    }

    async fn shutdown(&self) -> Result<(), GenericError> {
        self.log.record(Call::TransportShutdown);
        self.shutdown.run().await
    }

    async fn kill(&self) -> Result<(), GenericError> {
        self.log.record(Call::TransportKill);
        self.kill.run().await
    }
}

pub struct MockRegistry {
    log: CallLog,
    behaviors: HashMap<String, Behavior>,
    panicking: HashSet<String>,
}

impl MockRegistry {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            behaviors: HashMap::new(),
            panicking: HashSet::new(),
        }
    }

    pub fn with_channel(mut self, runtime: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(runtime.to_string(), behavior);
        self
    }

    pub fn with_panicking_channel(mut self, runtime: &str) -> Self {
        self.panicking.insert(runtime.to_string());
        self
    }
}

#[async_trait]
impl ChannelRegistry for MockRegistry {
    async fn initialize_channel(&self, runtime: &RuntimeId) -> Result<(), GenericError> {
        self.log.record(Call::InitializeChannel(runtime.to_string()));
        if self.panicking.contains(runtime.as_str()) {
            panic!("channel for '{}' blew up", runtime);
        }

        let behavior = self
            .behaviors
            .get(runtime.as_str())
            .copied()
            .unwrap_or(Behavior::Succeed);
        behavior.run().await
    }

    fn shutdown_all_channels(&self) {
        self.log.record(Call::ShutdownAllChannels);
    }
}
