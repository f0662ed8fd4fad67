//! Error types for the module framework.

use std::path::PathBuf;

/// Raised when dereferencing an unbound [`Anchor`](crate::anchor::Anchor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reference is not bound")]
pub struct AnchorError;

/// Errors raised by [`DynamicLibrary`](crate::library::DynamicLibrary).
///
/// The first three variants are load preconditions, checked before the
/// platform loader is touched. `OpenFailed` and `CloseFailed` carry the
/// platform's error text captured at the moment of failure, since the
/// global last-error state can be overwritten by later calls.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("no read access (path: {path:?})")]
    NotReadable { path: PathBuf },

    #[error("invalid extension, expected .{expected} (path: {path:?})")]
    InvalidExtension {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("already loaded (path: {path:?})")]
    AlreadyLoaded { path: PathBuf },

    #[error("failed to open library (path: {path:?}): {message}")]
    OpenFailed { path: PathBuf, message: String },

    #[error("failed to close library (path: {path:?}): {message}")]
    CloseFailed { path: PathBuf, message: String },

    #[error("library is not loaded (path: {path:?})")]
    NotLoaded { path: PathBuf },

    #[error("no such symbol (symbol: {symbol}, path: {path:?})")]
    SymbolNotFound { symbol: String, path: PathBuf },

    #[error("hook panicked (symbol: {symbol}, path: {path:?}): {message}")]
    HookPanicked {
        symbol: String,
        path: PathBuf,
        message: String,
    },
}

/// Errors raised by [`Module`](crate::module::Module) and
/// [`ModuleLoader`](crate::loader::ModuleLoader).
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Unbound(#[from] AnchorError),

    #[error("index out of range (index: {index}, len: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("module cannot own sub-modules")]
    NotALoader,

    #[error("loader has no backing library")]
    NoBackingLibrary,

    #[error("module ABI mismatch (expected: {expected}, found: {found})")]
    AbiMismatch { expected: u32, found: u32 },

    #[error("invalid module info: {0}")]
    BadModuleInfo(String),

    #[error("failed to scan directory (path: {path:?}): {message}")]
    Scan { path: PathBuf, message: String },

    #[error("failed to read module config: {0}")]
    Config(String),
}

/// Result type for module operations.
pub type Result<T, E = ModuleError> = std::result::Result<T, E>;
