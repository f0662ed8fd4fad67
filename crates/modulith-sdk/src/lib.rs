//! SDK for authoring Modulith native modules.
//!
//! A module library exports up to three entry points. The metadata export
//! comes from [`export_module_info!`]; the lifecycle hooks are plain
//! `#[no_mangle]` functions matching
//! [`ModuleLifecycleFn`](crate::abi::ModuleLifecycleFn):
//!
//! ```ignore
//! use modulith_sdk::prelude::*;
//!
//! modulith_sdk::export_module_info! {
//!     author: "Jane Doe",
//!     name: "telemetry",
//!     version: "1.2.0",
//!     description: "Telemetry collector",
//! }
//!
//! #[no_mangle]
//! pub unsafe fn on_module_load(host: &mut dyn ModuleHost) {
//!     host.log(Level::Info, "telemetry up");
//! }
//!
//! #[no_mangle]
//! pub unsafe fn on_module_unload(host: &mut dyn ModuleHost) {
//!     host.log(Level::Info, "telemetry down");
//! }
//! ```
//!
//! Build the crate as a `cdylib` with the platform's shared-library
//! extension; the host refuses anything else. Host and module must share
//! a toolchain: the lifecycle hooks carry Rust trait objects.

#[macro_use]
pub mod macros;

/// The raw ABI surface, re-exported for macro expansion and hand-rolled
/// exports.
pub mod abi {
    pub use modulith_core::abi::{
        ModuleInfoFn, ModuleLifecycleFn, RawModuleInfo, MODULE_ABI_VERSION, ON_MODULE_INFO,
        ON_MODULE_LOAD, ON_MODULE_UNLOAD,
    };
}

pub use modulith_core::error::{AnchorError, LibraryError, ModuleError, Result};
pub use modulith_core::info::ModuleInfo;
pub use modulith_core::logging::{Level, LevelFilter};
pub use modulith_core::module::ModuleHost;

/// Re-exports commonly used types for module authors.
pub mod prelude {
    pub use crate::abi::{RawModuleInfo, MODULE_ABI_VERSION};
    pub use crate::export_module_info;
    pub use modulith_core::error::{LibraryError, ModuleError, Result};
    pub use modulith_core::info::ModuleInfo;
    pub use modulith_core::logging::{Level, LevelFilter};
    pub use modulith_core::module::ModuleHost;
}
