//! The native ABI a loadable module library exports.
//!
//! A module library provides up to three entry points, resolved by name:
//!
//! - [`ON_MODULE_INFO`]: required for [`Module::info`]; returns a
//!   [`RawModuleInfo`] descriptor.
//! - [`ON_MODULE_LOAD`]: optional; invoked after the library is opened,
//!   receiving the in-process module so the plugin can perform setup or
//!   register sub-modules through it.
//! - [`ON_MODULE_UNLOAD`]: optional; invoked before the library is
//!   closed, symmetric to load.
//!
//! [`Module::info`]: crate::module::Module::info

use std::os::raw::c_char;

use crate::module::ModuleHost;

/// Version tag stamped into [`RawModuleInfo`]; checked when a descriptor
/// is read back, before any string pointer is dereferenced.
pub const MODULE_ABI_VERSION: u32 = 1;

/// Export name of the module info entry point.
pub const ON_MODULE_INFO: &str = "on_module_info";

/// Export name of the load lifecycle hook.
pub const ON_MODULE_LOAD: &str = "on_module_load";

/// Export name of the unload lifecycle hook.
pub const ON_MODULE_UNLOAD: &str = "on_module_unload";

/// C-compatible module descriptor returned by `on_module_info`.
///
/// All strings are NUL-terminated and remain owned by the module library;
/// they must stay valid while the library is mapped. `author` and
/// `description` may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawModuleInfo {
    pub abi_version: u32,
    pub author: *const c_char,
    pub name: *const c_char,
    pub version: *const c_char,
    pub description: *const c_char,
}

/// Type of the `on_module_info` export.
pub type ModuleInfoFn = unsafe extern "C" fn() -> RawModuleInfo;

/// Type of the `on_module_load` / `on_module_unload` exports.
///
/// These carry a Rust trait object, so module and host must be built with
/// the same toolchain. The framework invokes them behind a panic
/// boundary; a hook that panics is reported, never propagated.
pub type ModuleLifecycleFn = unsafe fn(&mut dyn ModuleHost);
