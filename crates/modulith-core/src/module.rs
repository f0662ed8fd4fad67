//! Library-backed modules and their lifecycle hooks.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::abi::{ModuleInfoFn, ModuleLifecycleFn, ON_MODULE_INFO, ON_MODULE_LOAD, ON_MODULE_UNLOAD};
use crate::anchor::Anchor;
use crate::error::ModuleError;
use crate::extension::{Extension, ExtensionIdentity};
use crate::info::ModuleInfo;
use crate::library::{panic_message, DynamicLibrary};
use crate::logging::{Level, Logger, LoggerHandle};

/// Load/unload lifecycle shared by modules and loaders.
///
/// The state machine is `Unloaded → load → Loaded → unload → Unloaded`;
/// there are no other states. Unloading an unloaded unit is a no-op.
pub trait Loadable {
    fn load(&mut self) -> Result<(), ModuleError>;
    fn unload(&mut self) -> Result<(), ModuleError>;
    fn is_loaded(&self) -> bool;

    fn is_unloaded(&self) -> bool {
        !self.is_loaded()
    }
}

/// Construction context a parent hands to a child: the owner
/// back-reference and the logger binding. Both are non-owning and bound
/// once, at construction.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    owner: Anchor<ExtensionIdentity>,
    logger: LoggerHandle,
}

impl ModuleContext {
    /// Context for a root unit: no owner, logging into `sink`.
    ///
    /// The host keeps ownership of the sink; the tree only holds weak
    /// handles to it.
    pub fn root(sink: &Arc<dyn Logger>) -> Self {
        Self {
            owner: Anchor::unbound(),
            logger: LoggerHandle::bound(sink),
        }
    }

    /// Context with neither owner nor logger.
    pub fn detached() -> Self {
        Self {
            owner: Anchor::unbound(),
            logger: LoggerHandle::unbound(),
        }
    }

    pub(crate) fn new(owner: Anchor<ExtensionIdentity>, logger: LoggerHandle) -> Self {
        Self { owner, logger }
    }

    pub fn owner(&self) -> &Anchor<ExtensionIdentity> {
        &self.owner
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }
}

/// The in-process module object handed to native lifecycle hooks.
///
/// Hooks receive the unit that is being loaded or unloaded, so a plugin
/// can inspect its paths, log through the host's sink, and register
/// further sub-modules on units that support nesting.
pub trait ModuleHost {
    /// Composed display name (`<type name>::<info().name>`); requires the
    /// backing library to be loaded.
    fn classname(&self) -> Result<String, ModuleError>;

    /// Metadata reported by the backing library.
    fn module_info(&self) -> Result<ModuleInfo, ModuleError>;

    /// Parent directory of the backing library, when there is one.
    fn root_path(&self) -> Option<PathBuf>;

    /// Conventional config directory (`root_path().parent / "config"`),
    /// when there is a backing library.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Logs through the unit's bound logger.
    fn log(&self, level: Level, message: &str);

    /// Registers a library-backed sub-module on the receiving unit.
    ///
    /// Units that cannot own children refuse with
    /// [`ModuleError::NotALoader`]. The new child starts unloaded; the
    /// surrounding load pass picks it up.
    fn attach_library(&mut self, path: &Path) -> Result<(), ModuleError>;
}

/// A loadable unit pairing one native shared library with lifecycle hooks
/// and an identity.
#[derive(Debug)]
pub struct Module {
    extension: Extension,
    logger: LoggerHandle,
    library: DynamicLibrary,
}

impl Module {
    /// A module wrapping the library at `path`. Starts unloaded.
    pub fn new(ctx: ModuleContext, path: impl Into<PathBuf>) -> Self {
        Self::with_kind::<Module>(ctx, path)
    }

    /// Builds the module with the identity of `T`, for wrapper types that
    /// embed a module and drive its lifecycle themselves.
    pub fn with_kind<T: ?Sized>(ctx: ModuleContext, path: impl Into<PathBuf>) -> Self {
        let ModuleContext { owner, logger } = ctx;
        Self {
            extension: Extension::of::<T>(owner),
            logger,
            library: DynamicLibrary::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.library.path()
    }

    pub fn library(&self) -> &DynamicLibrary {
        &self.library
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    /// Metadata reported by the library's `on_module_info` entry point.
    ///
    /// Requires the library to be loaded; a missing entry point or an
    /// unloaded library fail with the library-error kinds.
    pub fn info(&self) -> Result<ModuleInfo, ModuleError> {
        let raw = unsafe {
            self.library
                .call(ON_MODULE_INFO, |f: &ModuleInfoFn| unsafe { (*f)() })
        }?;
        unsafe { ModuleInfo::from_raw(&raw) }
    }

    /// Parent directory of the library file.
    pub fn root_path(&self) -> PathBuf {
        self.library
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Conventional sibling config directory:
    /// `root_path().parent / "config"`.
    pub fn config_dir(&self) -> PathBuf {
        self.root_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("config")
    }

    /// `<config_dir>/<info().name>.json`; requires the library to be
    /// loaded.
    pub fn config_path(&self) -> Result<PathBuf, ModuleError> {
        Ok(self.config_dir().join(format!("{}.json", self.info()?.name)))
    }

    /// Reads and deserializes the module's JSON config file.
    pub fn load_config<T: DeserializeOwned>(&self) -> Result<T, ModuleError> {
        let path = self.config_path()?;
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| ModuleError::Config(format!("{}: {err}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|err| ModuleError::Config(format!("{}: {err}", path.display())))
    }

    /// Composed display name for log attribution; requires the library to
    /// be loaded since it calls [`Module::info`].
    pub fn classname(&self) -> Result<String, ModuleError> {
        Ok(format!("{}::{}", self.extension.name(), self.info()?.name))
    }

    /// Copies out an optional lifecycle hook. `None` when the library is
    /// unloaded or the export is absent.
    pub(crate) fn lifecycle_hook(&self, name: &str) -> Option<ModuleLifecycleFn> {
        unsafe { self.library.symbol_copied::<ModuleLifecycleFn>(name) }.ok()
    }

    pub(crate) fn library_mut(&mut self) -> &mut DynamicLibrary {
        &mut self.library
    }

    /// Log attribution: composed classname when available, identity name
    /// otherwise.
    pub(crate) fn sender(&self) -> String {
        self.classname()
            .unwrap_or_else(|_| self.extension.name().to_string())
    }
}

impl Loadable for Module {
    /// Opens the library, then invokes the optional `on_module_load` hook
    /// behind the panic boundary.
    ///
    /// A hook failure is reported through the logger, never propagated:
    /// the library resource is valid and must remain unloadable later.
    fn load(&mut self) -> Result<(), ModuleError> {
        self.library.load()?;
        self.logger.log(
            self.extension.name(),
            Level::Debug,
            &format!("opened {}", self.library.path().display()),
        );
        if let Some(hook) = self.lifecycle_hook(ON_MODULE_LOAD) {
            run_hook(hook, self, ON_MODULE_LOAD);
        }
        Ok(())
    }

    /// Invokes the optional `on_module_unload` hook while the plugin code
    /// is still mapped, then closes the library.
    fn unload(&mut self) -> Result<(), ModuleError> {
        if self.library.is_loaded() {
            if let Some(hook) = self.lifecycle_hook(ON_MODULE_UNLOAD) {
                run_hook(hook, self, ON_MODULE_UNLOAD);
            }
        }
        self.library.unload()?;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.library.is_loaded()
    }
}

impl ModuleHost for Module {
    fn classname(&self) -> Result<String, ModuleError> {
        Module::classname(self)
    }

    fn module_info(&self) -> Result<ModuleInfo, ModuleError> {
        self.info()
    }

    fn root_path(&self) -> Option<PathBuf> {
        Some(Module::root_path(self))
    }

    fn config_dir(&self) -> Option<PathBuf> {
        Some(Module::config_dir(self))
    }

    fn log(&self, level: Level, message: &str) {
        self.logger.log(&self.sender(), level, message);
    }

    fn attach_library(&mut self, _path: &Path) -> Result<(), ModuleError> {
        Err(ModuleError::NotALoader)
    }
}

/// Invokes a lifecycle hook behind the panic boundary.
///
/// A panic raised by the hook is rendered to text and logged through the
/// host as a warning; the framework's bookkeeping continues either way.
pub(crate) fn run_hook(hook: ModuleLifecycleFn, host: &mut dyn ModuleHost, name: &str) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe { hook(&mut *host) }));
    if let Err(payload) = result {
        let message = panic_message(payload.as_ref());
        host.log(Level::Warning, &format!("{name} hook panicked: {message}"));
    }
}
