use std::collections::{BTreeSet, HashMap};

use tether_env::OsPlatform;

use crate::RuntimeId;

/// Runtimes eligible for speculative initialization in placeholder mode, per platform.
///
/// Immutable once constructed. Platforms without their own entry use the Windows entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlaceholderWhitelist {
    runtimes: HashMap<OsPlatform, BTreeSet<RuntimeId>>,
}

impl PlaceholderWhitelist {
    /// Creates a new `PlaceholderWhitelist` from the runtimes allowed on Windows and on Linux.
    ///
    /// Duplicate identifiers are collapsed.
    pub fn new<W, L>(windows: W, linux: L) -> Self
    where
        W: IntoIterator<Item = RuntimeId>,
        L: IntoIterator<Item = RuntimeId>,
    {
        let mut runtimes = HashMap::with_capacity(2);
        runtimes.insert(OsPlatform::Windows, windows.into_iter().collect());
        runtimes.insert(OsPlatform::Linux, linux.into_iter().collect());

        Self { runtimes }
    }

    /// Returns the runtimes whitelisted for the given platform.
    ///
    /// `OsPlatform::Other` resolves to the Windows entry.
    pub fn runtimes_for(&self, platform: OsPlatform) -> impl Iterator<Item = &RuntimeId> + '_ {
        let key = match platform {
            OsPlatform::Linux => OsPlatform::Linux,
            OsPlatform::Windows | OsPlatform::Other => OsPlatform::Windows,
        };

        self.runtimes.get(&key).into_iter().flatten()
    }
}

impl Default for PlaceholderWhitelist {
    fn default() -> Self {
        Self::new(
            [RuntimeId::new(RuntimeId::JAVA)],
            [RuntimeId::new(RuntimeId::PYTHON)],
        )
    }
}

/// Runtimes allowed to start at host level when a runtime is explicitly configured.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WebHostWhitelist {
    runtimes: BTreeSet<RuntimeId>,
}

impl WebHostWhitelist {
    /// Creates a new `WebHostWhitelist` from the given runtimes.
    ///
    /// Duplicate identifiers are collapsed.
    pub fn new<I>(runtimes: I) -> Self
    where
        I: IntoIterator<Item = RuntimeId>,
    {
        Self {
            runtimes: runtimes.into_iter().collect(),
        }
    }

    /// Adds a runtime to the whitelist.
    ///
    /// Returns `false` if the runtime was already present.
    pub fn add_runtime(&mut self, runtime: RuntimeId) -> bool {
        self.runtimes.insert(runtime)
    }

    /// Returns `true` if the given runtime is whitelisted.
    pub fn contains(&self, runtime: &str) -> bool {
        self.runtimes.contains(runtime)
    }

    /// Returns the whitelisted runtimes.
    pub fn runtimes(&self) -> impl Iterator<Item = &RuntimeId> + '_ {
        self.runtimes.iter()
    }
}

impl Default for WebHostWhitelist {
    fn default() -> Self {
        Self::new([RuntimeId::new(RuntimeId::JAVA)])
    }
}
