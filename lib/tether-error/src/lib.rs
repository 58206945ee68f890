//! Error primitives shared across the workspace.
//!
//! Collaborators at the edge of the lifecycle (transports, channel registries, environment probes) can fail in ways we
//! don't know ahead of time, so they all report failures through [`GenericError`]. Crates that have a closed set of
//! failure modes define their own typed errors instead, and wrap a `GenericError` as the source where needed.
#![deny(warnings)]
#![deny(missing_docs)]

use std::fmt::Display;

/// An open-ended error value, carrying an optional chain of causes.
pub type GenericError = anyhow::Error;

/// Constructs a [`GenericError`].
///
/// Accepts a string literal, a format string with arguments (same rules as `std::format!`), or any value that
/// implements `Debug` and `Display`. When given an existing `std::error::Error`, its source chain is preserved.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;

pub(crate) mod private {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

/// Extension methods for attaching context to fallible results.
///
/// Named distinctly from `anyhow::Context` so it can be imported alongside `snafu::ResultExt` without the methods
/// colliding.
pub trait ErrorContext<T, E>: private::Sealed {
    /// Wraps the error, if any, with the given context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error, if any, with context produced by `f`.
    ///
    /// `f` is only called when the result is an error.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        <Self as anyhow::Context<T, E>>::context(self, context)
    }

    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        <Self as anyhow::Context<T, E>>::with_context(self, f)
    }
}

/// Renders an error and all of its causes on a single line, separated by `: `.
///
/// Multi-line error output breaks structured log formatting, so this is the preferred way to put an error chain into a
/// log field.
pub fn format_error_chain(error: &GenericError) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}
