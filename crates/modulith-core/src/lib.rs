//! Dynamic module loading and lifecycle management.
//!
//! Modulith loads native shared libraries at runtime, wraps each one as a
//! typed [`Module`] with a load/unload lifecycle, and nests modules inside
//! [`ModuleLoader`]s to form an application-defined dependency tree.
//! Attachment order is load order; unload and teardown run in reverse, so
//! later modules never outlive the earlier ones they may depend on.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use modulith_core::prelude::*;
//!
//! let sink: Arc<dyn Logger> = Arc::new(TracingLogger::default());
//! let mut root = ModuleLoader::aggregator(ModuleContext::root(&sink));
//!
//! root.attach_module("/opt/app/modules/telemetry.so");
//! root.attach_loader("/opt/app/modules/net.so");
//!
//! root.load()?;
//! // ...
//! root.unload()?;
//! # Ok::<(), modulith_core::ModuleError>(())
//! ```
//!
//! Calls that cross into plugin code (`try_call`, the lifecycle hooks) are
//! wrapped in a panic boundary: failures there are reported to a handler
//! or the bound logger and never unwind through host orchestration.
//! Direct API failures are typed errors the caller decides about; there
//! is no automatic rollback of partially completed bulk operations.

pub mod abi;
pub mod anchor;
pub mod error;
pub mod extension;
pub mod info;
pub mod library;
pub mod loader;
pub mod logging;
pub mod module;
pub mod os;

pub use anchor::Anchor;
pub use error::{AnchorError, LibraryError, ModuleError, Result};
pub use extension::{Extension, ExtensionIdentity};
pub use info::ModuleInfo;
pub use library::DynamicLibrary;
pub use loader::{ModuleLoader, ModuleNode};
pub use logging::{Level, LevelFilter, Logger, LoggerHandle, NullLogger, TracingLogger};
pub use module::{Loadable, Module, ModuleContext, ModuleHost};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::abi::{
        RawModuleInfo, MODULE_ABI_VERSION, ON_MODULE_INFO, ON_MODULE_LOAD, ON_MODULE_UNLOAD,
    };
    pub use crate::error::{AnchorError, LibraryError, ModuleError, Result};
    pub use crate::info::ModuleInfo;
    pub use crate::library::DynamicLibrary;
    pub use crate::loader::{ModuleLoader, ModuleNode};
    pub use crate::logging::{
        Level, LevelFilter, Logger, LoggerHandle, NullLogger, TracingLogger,
    };
    pub use crate::module::{Loadable, Module, ModuleContext, ModuleHost};
}
