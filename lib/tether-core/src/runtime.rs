use std::{borrow::Borrow, fmt, sync::Arc};

use serde::Deserialize;

/// Identifier of a language runtime.
///
/// Identifiers are opaque and case-sensitive: two identifiers name the same runtime only if they are byte-for-byte
/// equal. An empty identifier means "no runtime".
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(from = "String")]
pub struct RuntimeId(Arc<str>);

impl RuntimeId {
    /// Java.
    pub const JAVA: &'static str = "java";

    /// Python.
    pub const PYTHON: &'static str = "python";

    /// Node.js.
    pub const NODE: &'static str = "node";

    /// PowerShell.
    pub const POWERSHELL: &'static str = "powershell";

    /// Out-of-process .NET.
    pub const DOTNET_ISOLATED: &'static str = "dotnet-isolated";

    /// Creates a new `RuntimeId`.
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(id.as_ref().into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RuntimeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuntimeId {
    fn from(id: String) -> Self {
        Self(id.into())
    }
}

impl Borrow<str> for RuntimeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
