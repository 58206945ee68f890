use std::fmt;

/// Operating system platform of the hosting environment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OsPlatform {
    /// Windows.
    Windows,

    /// Linux.
    Linux,

    /// Any other platform.
    Other,
}

impl OsPlatform {
    /// Detects the platform.
    ///
    /// A Linux hosting environment is always reported as Linux. Otherwise, the platform is derived from the target the
    /// process was compiled for: Windows builds report Windows, and everything else reports `Other`.
    pub fn detect(is_linux_hosting_environment: bool) -> Self {
        if is_linux_hosting_environment {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Returns the platform name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
