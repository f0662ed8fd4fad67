//! Module metadata and its wire form.

use std::ffi::CStr;
use std::os::raw::c_char;

use serde::{Deserialize, Serialize};

use crate::abi::{RawModuleInfo, MODULE_ABI_VERSION};
use crate::error::ModuleError;

/// Descriptive metadata a module reports about itself.
///
/// Queried on demand by calling into the loaded library; the framework
/// never caches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub author: String,
    pub name: String,
    pub version: semver::Version,
    pub description: String,
}

impl ModuleInfo {
    /// Converts a wire descriptor into owned metadata.
    ///
    /// The ABI tag is validated before any pointer is dereferenced; the
    /// name and version are required, author and description default to
    /// empty when null.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `raw` must reference a NUL-terminated
    /// string that stays valid for the duration of this call.
    pub unsafe fn from_raw(raw: &RawModuleInfo) -> Result<Self, ModuleError> {
        if raw.abi_version != MODULE_ABI_VERSION {
            return Err(ModuleError::AbiMismatch {
                expected: MODULE_ABI_VERSION,
                found: raw.abi_version,
            });
        }

        let name = unsafe { required_str(raw.name, "name") }?;
        let version = unsafe { required_str(raw.version, "version") }?;
        let version = version.parse::<semver::Version>().map_err(|err| {
            ModuleError::BadModuleInfo(format!("version {version:?} is not semver: {err}"))
        })?;

        Ok(Self {
            author: unsafe { optional_str(raw.author, "author") }?,
            name,
            version,
            description: unsafe { optional_str(raw.description, "description") }?,
        })
    }
}

impl std::fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

unsafe fn required_str(ptr: *const c_char, field: &str) -> Result<String, ModuleError> {
    if ptr.is_null() {
        return Err(ModuleError::BadModuleInfo(format!("{field} is null")));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ModuleError::BadModuleInfo(format!("{field} is not valid UTF-8")))
}

unsafe fn optional_str(ptr: *const c_char, field: &str) -> Result<String, ModuleError> {
    if ptr.is_null() {
        Ok(String::new())
    } else {
        unsafe { required_str(ptr, field) }
    }
}
