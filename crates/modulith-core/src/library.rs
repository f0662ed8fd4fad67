//! Platform-independent dynamic library wrapper.
//!
//! [`DynamicLibrary`] owns one native shared-library handle and exposes
//! open, close, symbol lookup and typed calls behind a single contract on
//! both the POSIX `dlopen` family and the Windows `LoadLibrary` family
//! (via `libloading`). Typed symbol access is the crate's one unchecked
//! FFI seam: no runtime signature verification is possible, and a
//! mismatched type is undefined behavior the caller must rule out.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::LibraryError;
use crate::os;

/// A native shared library with an explicit load/unload lifecycle.
///
/// The handle is exclusively owned by this wrapper; no two wrappers share
/// one handle. Dropping a loaded wrapper closes the handle, swallowing
/// any platform failure.
#[derive(Debug)]
pub struct DynamicLibrary {
    path: PathBuf,
    library: Option<Library>,
}

impl DynamicLibrary {
    /// Wraps `path` without touching the filesystem. The library starts
    /// unloaded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            library: None,
        }
    }

    /// The filesystem path this wrapper was constructed with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    pub fn is_unloaded(&self) -> bool {
        self.library.is_none()
    }

    /// Opens the library.
    ///
    /// Preconditions, each failing with its own [`LibraryError`] kind: the
    /// file must have at least one read permission bit set, carry the
    /// platform's shared-library extension, and not already be loaded.
    /// A platform open failure surfaces the loader's error text captured
    /// at the moment of failure.
    pub fn load(&mut self) -> Result<(), LibraryError> {
        if !os::is_readable(&self.path) {
            return Err(LibraryError::NotReadable {
                path: self.path.clone(),
            });
        }
        if self.path.extension().and_then(|ext| ext.to_str()) != Some(os::LIBRARY_EXTENSION) {
            return Err(LibraryError::InvalidExtension {
                path: self.path.clone(),
                expected: os::LIBRARY_EXTENSION,
            });
        }
        if self.is_loaded() {
            return Err(LibraryError::AlreadyLoaded {
                path: self.path.clone(),
            });
        }

        let library = unsafe { Library::new(&self.path) }.map_err(|err| {
            LibraryError::OpenFailed {
                path: self.path.clone(),
                message: err.to_string(),
            }
        })?;
        self.library = Some(library);
        Ok(())
    }

    /// Closes the library. Already-unloaded libraries are a no-op success.
    ///
    /// The platform close consumes the handle, so after a reported
    /// `CloseFailed` the wrapper counts as unloaded and a retry is a
    /// no-op; the error carries the platform message captured at failure
    /// time.
    pub fn unload(&mut self) -> Result<(), LibraryError> {
        match self.library.take() {
            None => Ok(()),
            Some(library) => library.close().map_err(|err| LibraryError::CloseFailed {
                path: self.path.clone(),
                message: err.to_string(),
            }),
        }
    }

    /// Raw symbol lookup without load-state or type checking.
    ///
    /// Returns null when the symbol is missing or the library is
    /// unloaded; never fails. The caller is responsible for both checks.
    pub fn symbol_unsafe(&self, name: &str) -> *mut c_void {
        match &self.library {
            None => std::ptr::null_mut(),
            Some(library) => unsafe {
                library
                    .get::<*mut c_void>(name.as_bytes())
                    .map(|symbol| *symbol)
                    .unwrap_or(std::ptr::null_mut())
            },
        }
    }

    /// Typed symbol lookup.
    ///
    /// Fails with `NotLoaded` when the library is unloaded and with
    /// `SymbolNotFound` when the export is missing.
    ///
    /// # Safety
    ///
    /// `T` must match the exported symbol's actual type. A mismatch is
    /// undefined behavior.
    pub unsafe fn symbol<T>(&self, name: &str) -> Result<libloading::Symbol<'_, T>, LibraryError> {
        let library = self.library.as_ref().ok_or_else(|| LibraryError::NotLoaded {
            path: self.path.clone(),
        })?;
        unsafe { library.get(name.as_bytes()) }.map_err(|_| LibraryError::SymbolNotFound {
            symbol: name.to_string(),
            path: self.path.clone(),
        })
    }

    /// Resolves `name` as an `F` and hands it to `invoke`, returning the
    /// closure's result.
    ///
    /// # Safety
    ///
    /// `F` must match the exported symbol's actual type.
    pub unsafe fn call<F, R>(
        &self,
        name: &str,
        invoke: impl FnOnce(&F) -> R,
    ) -> Result<R, LibraryError> {
        let symbol = unsafe { self.symbol::<F>(name) }?;
        Ok(invoke(&symbol))
    }

    /// Like [`DynamicLibrary::symbol`], but copies the resolved value out
    /// of the borrow, for function pointers that must outlive the lookup.
    ///
    /// # Safety
    ///
    /// `T` must match the exported symbol's actual type and must not be
    /// used after the library is unloaded.
    pub(crate) unsafe fn symbol_copied<T: Copy>(&self, name: &str) -> Result<T, LibraryError> {
        let symbol = unsafe { self.symbol::<T>(name) }?;
        Ok(*symbol)
    }

    /// Like [`DynamicLibrary::call`], but absorbs every failure at the
    /// plugin boundary.
    ///
    /// Lookup failures and panics raised by the callee are routed to
    /// `on_error` and a default `R` is returned, so misbehaving plugin
    /// code cannot unwind through host orchestration.
    ///
    /// # Safety
    ///
    /// `F` must match the exported symbol's actual type.
    pub unsafe fn try_call<F, R>(
        &self,
        name: &str,
        mut on_error: impl FnMut(&LibraryError),
        invoke: impl FnOnce(&F) -> R,
    ) -> R
    where
        R: Default,
    {
        let symbol = match unsafe { self.symbol::<F>(name) } {
            Ok(symbol) => symbol,
            Err(err) => {
                on_error(&err);
                return R::default();
            }
        };
        match panic::catch_unwind(AssertUnwindSafe(|| invoke(&symbol))) {
            Ok(result) => result,
            Err(payload) => {
                on_error(&LibraryError::HookPanicked {
                    symbol: name.to_string(),
                    path: self.path.clone(),
                    message: panic_message(payload.as_ref()),
                });
                R::default()
            }
        }
    }
}

/// Renders a caught panic payload into readable text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
