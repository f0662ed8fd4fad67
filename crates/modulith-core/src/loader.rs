//! Ordered, owning module collections.
//!
//! A [`ModuleLoader`] owns its children in attachment order: `load()`
//! walks them forward, `unload()` walks them backward, and teardown
//! releases them in reverse attachment order regardless of loaded state,
//! so later modules never outlive the earlier ones they may depend on.

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::abi::{ON_MODULE_LOAD, ON_MODULE_UNLOAD};
use crate::error::ModuleError;
use crate::extension::Extension;
use crate::info::ModuleInfo;
use crate::logging::{Level, LoggerHandle};
use crate::module::{run_hook, Loadable, Module, ModuleContext, ModuleHost};
use crate::os;

/// A child owned by a [`ModuleLoader`].
///
/// Anything with a module lifecycle and a host surface qualifies; custom
/// units implement [`Loadable`] and [`ModuleHost`] and pick this up
/// through the blanket impl.
pub trait ModuleNode: Loadable + ModuleHost {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ModuleNode for T
where
    T: Loadable + ModuleHost + Any,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An ordered, owning collection of modules that is itself a module.
///
/// A loader is either library-backed (the loader itself is a plugin entry
/// point) or a pure aggregator with no backing file, in which case its
/// own load and unload steps are no-ops.
pub struct ModuleLoader {
    extension: Extension,
    logger: LoggerHandle,
    backing: Option<Module>,
    entries: Vec<Box<dyn ModuleNode>>,
    active: bool,
}

impl ModuleLoader {
    /// A loader whose own entry point lives in the library at `path`.
    pub fn backed(ctx: ModuleContext, path: impl Into<PathBuf>) -> Self {
        Self::from_parts(ctx, Some(path.into()))
    }

    /// A loader with no backing library of its own.
    pub fn aggregator(ctx: ModuleContext) -> Self {
        Self::from_parts(ctx, None)
    }

    fn from_parts(ctx: ModuleContext, path: Option<PathBuf>) -> Self {
        let extension = Extension::of::<ModuleLoader>(ctx.owner().clone());
        let logger = ctx.logger().clone();
        let backing = path.map(|path| Module::with_kind::<ModuleLoader>(ctx, path));
        Self {
            extension,
            logger,
            backing,
            entries: Vec::new(),
            active: false,
        }
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    /// The loader's own backing module, when it has one.
    pub fn backing(&self) -> Option<&Module> {
        self.backing.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ModuleNode> {
        self.entries.iter().map(|entry| &**entry)
    }

    /// Bounds-checked child access.
    pub fn child(&self, index: usize) -> Result<&dyn ModuleNode, ModuleError> {
        let len = self.entries.len();
        self.entries
            .get(index)
            .map(|entry| &**entry)
            .ok_or(ModuleError::IndexOutOfRange { index, len })
    }

    /// Bounds-checked mutable child access.
    pub fn child_mut(&mut self, index: usize) -> Result<&mut (dyn ModuleNode + 'static), ModuleError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .map(|entry| &mut **entry)
            .ok_or(ModuleError::IndexOutOfRange { index, len })
    }

    /// The context children of this loader are constructed against: the
    /// loader's identity as owner, the loader's logger binding.
    pub fn child_context(&self) -> ModuleContext {
        ModuleContext::new(self.extension.anchor(), self.logger.clone())
    }

    /// Constructs a child in place, takes ownership and appends it to the
    /// end of the child sequence. Does not load it.
    pub fn attach_with<C, F>(&mut self, build: F) -> &mut C
    where
        C: ModuleNode + 'static,
        F: FnOnce(ModuleContext) -> C,
    {
        let ctx = self.child_context();
        self.entries.push(Box::new(build(ctx)));
        self.entries
            .last_mut()
            .and_then(|entry| entry.as_any_mut().downcast_mut::<C>())
            .expect("freshly attached entry has the builder's type")
    }

    /// Attaches a plain library-backed module.
    pub fn attach_module(&mut self, path: impl Into<PathBuf>) -> &mut Module {
        let path = path.into();
        self.attach_with(|ctx| Module::new(ctx, path))
    }

    /// Attaches a library-backed sub-loader, for modules that nest
    /// further modules.
    pub fn attach_loader(&mut self, path: impl Into<PathBuf>) -> &mut ModuleLoader {
        let path = path.into();
        self.attach_with(|ctx| ModuleLoader::backed(ctx, path))
    }

    /// Attaches an aggregator sub-loader.
    pub fn attach_aggregator(&mut self) -> &mut ModuleLoader {
        self.attach_with(ModuleLoader::aggregator)
    }

    /// Attaches every shared library in `dir` as a backed sub-loader,
    /// sorted by file name. Returns how many were attached; none of them
    /// is loaded.
    pub fn discover_modules(&mut self, dir: &Path) -> Result<usize, ModuleError> {
        let entries = std::fs::read_dir(dir).map_err(|err| ModuleError::Scan {
            path: dir.to_path_buf(),
            message: err.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str())
                        == Some(os::LIBRARY_EXTENSION)
            })
            .collect();
        paths.sort();

        let count = paths.len();
        for path in paths {
            self.logger.log(
                self.extension.name(),
                Level::Info,
                &format!("discovered module {}", path.display()),
            );
            self.attach_loader(path);
        }
        Ok(count)
    }

    /// Opens the loader's own library and runs its load hook.
    ///
    /// Aggregators only flip their active flag. A backing library that is
    /// already loaded is skipped, so a repeat pass over the loader only
    /// picks up children attached since the previous one.
    fn load_self(&mut self) -> Result<(), ModuleError> {
        if self.backing.is_none() {
            self.active = true;
            return Ok(());
        }
        if self.backing.as_ref().is_some_and(|module| module.is_loaded()) {
            return Ok(());
        }
        if let Some(backing) = self.backing.as_mut() {
            backing.library_mut().load()?;
        }
        self.logger.log(
            self.extension.name(),
            Level::Debug,
            &format!("opened {}", self.path_display()),
        );
        let hook = self
            .backing
            .as_ref()
            .and_then(|module| module.lifecycle_hook(ON_MODULE_LOAD));
        if let Some(hook) = hook {
            run_hook(hook, self, ON_MODULE_LOAD);
        }
        Ok(())
    }

    /// Runs the loader's own unload hook while its code is still mapped,
    /// then closes the backing library.
    fn unload_self(&mut self) -> Result<(), ModuleError> {
        if self.backing.is_none() {
            self.active = false;
            return Ok(());
        }
        if self
            .backing
            .as_ref()
            .is_some_and(|module| module.is_unloaded())
        {
            return Ok(());
        }
        let hook = self
            .backing
            .as_ref()
            .and_then(|module| module.lifecycle_hook(ON_MODULE_UNLOAD));
        if let Some(hook) = hook {
            run_hook(hook, self, ON_MODULE_UNLOAD);
        }
        if let Some(backing) = self.backing.as_mut() {
            backing.library_mut().unload()?;
        }
        Ok(())
    }

    /// Loads every currently-unloaded child in attachment order.
    ///
    /// Stops on the first child error and propagates it; children loaded
    /// before the failure keep their state. There is no rollback.
    fn load_entries(&mut self) -> Result<(), ModuleError> {
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].is_unloaded() {
                self.entries[index].load()?;
            }
            index += 1;
        }
        Ok(())
    }

    /// Unloads every currently-loaded child in reverse attachment order,
    /// with the same no-rollback policy.
    fn unload_entries(&mut self) -> Result<(), ModuleError> {
        for index in (0..self.entries.len()).rev() {
            if self.entries[index].is_loaded() {
                self.entries[index].unload()?;
            }
        }
        Ok(())
    }

    fn path_display(&self) -> String {
        self.backing
            .as_ref()
            .map(|module| module.path().display().to_string())
            .unwrap_or_else(|| String::from("<aggregator>"))
    }

    fn sender(&self) -> String {
        ModuleHost::classname(self).unwrap_or_else(|_| self.extension.name().to_string())
    }
}

impl Loadable for ModuleLoader {
    /// Loads the loader itself first, then its children in forward
    /// attachment order.
    fn load(&mut self) -> Result<(), ModuleError> {
        self.load_self()?;
        self.load_entries()
    }

    /// Unloads the children in reverse attachment order, then the loader
    /// itself.
    fn unload(&mut self) -> Result<(), ModuleError> {
        self.unload_entries()?;
        self.unload_self()
    }

    fn is_loaded(&self) -> bool {
        self.backing
            .as_ref()
            .map_or(self.active, |module| module.is_loaded())
    }
}

impl ModuleHost for ModuleLoader {
    fn classname(&self) -> Result<String, ModuleError> {
        match &self.backing {
            Some(backing) => Ok(format!("{}::{}", self.extension.name(), backing.info()?.name)),
            None => Ok(self.extension.name().to_string()),
        }
    }

    fn module_info(&self) -> Result<ModuleInfo, ModuleError> {
        self.backing
            .as_ref()
            .ok_or(ModuleError::NoBackingLibrary)?
            .info()
    }

    fn root_path(&self) -> Option<PathBuf> {
        self.backing.as_ref().map(Module::root_path)
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.backing.as_ref().map(Module::config_dir)
    }

    fn log(&self, level: Level, message: &str) {
        self.logger.log(&self.sender(), level, message);
    }

    fn attach_library(&mut self, path: &Path) -> Result<(), ModuleError> {
        self.attach_loader(path.to_path_buf());
        Ok(())
    }
}

impl Drop for ModuleLoader {
    /// Releases the children in reverse attachment order regardless of
    /// loaded state; each child's own drop closes its library.
    fn drop(&mut self) {
        while let Some(entry) = self.entries.pop() {
            drop(entry);
        }
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("backing", &self.backing)
            .field("children", &self.entries.len())
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleContext;

    fn aggregator() -> ModuleLoader {
        ModuleLoader::aggregator(ModuleContext::detached())
    }

    #[test]
    fn aggregator_load_is_a_noop_that_activates() {
        let mut loader = aggregator();
        assert!(loader.is_unloaded());
        loader.load().unwrap();
        assert!(loader.is_loaded());
        loader.unload().unwrap();
        assert!(loader.is_unloaded());
    }

    #[test]
    fn aggregator_has_no_module_surface() {
        let loader = aggregator();
        assert!(matches!(
            loader.module_info(),
            Err(ModuleError::NoBackingLibrary)
        ));
        assert!(loader.root_path().is_none());
        assert!(loader.config_dir().is_none());
        assert!(ModuleHost::classname(&loader)
            .unwrap()
            .ends_with("ModuleLoader"));
    }

    #[test]
    fn attach_does_not_load() {
        let mut loader = aggregator();
        let module = loader.attach_module("/plugins/foo.so");
        assert!(module.is_unloaded());
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn children_are_owned_by_the_loader() {
        let mut loader = aggregator();
        loader.attach_module("/plugins/foo.so");

        let child = loader.child(0).unwrap();
        let owner = child
            .as_any()
            .downcast_ref::<Module>()
            .unwrap()
            .extension()
            .owner()
            .get()
            .unwrap();
        assert_eq!(owner.name(), loader.extension().name());
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut loader = aggregator();
        loader.attach_module("/plugins/foo.so");
        assert!(loader.child(0).is_ok());
        assert!(matches!(
            loader.child(1),
            Err(ModuleError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            loader.child_mut(7),
            Err(ModuleError::IndexOutOfRange { index: 7, len: 1 })
        ));
    }

    #[test]
    fn attach_library_registers_a_backed_sub_loader() {
        let mut loader = aggregator();
        loader.attach_library(Path::new("/plugins/foo.so")).unwrap();
        let child = loader.child(0).unwrap();
        assert!(child.as_any().is::<ModuleLoader>());
        assert!(child.is_unloaded());
    }

    #[test]
    fn discovery_attaches_sorted_library_files() {
        let dir = tempfile::tempdir().unwrap();
        let suffix = os::LIBRARY_EXTENSION;
        std::fs::write(dir.path().join(format!("beta.{suffix}")), b"x").unwrap();
        std::fs::write(dir.path().join(format!("alpha.{suffix}")), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let mut loader = aggregator();
        let count = loader.discover_modules(dir.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(loader.len(), 2);

        let first = loader.child(0).unwrap().root_path().unwrap();
        assert_eq!(first, dir.path());
        let first_path = loader
            .child(0)
            .unwrap()
            .as_any()
            .downcast_ref::<ModuleLoader>()
            .unwrap()
            .backing()
            .unwrap()
            .path()
            .to_path_buf();
        assert!(first_path.ends_with(format!("alpha.{suffix}")));
    }

    #[test]
    fn backed_loader_self_load_failure_propagates() {
        use crate::error::LibraryError;

        let mut loader = ModuleLoader::backed(ModuleContext::detached(), "/missing/entry.so");
        let err = loader.load().unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Library(LibraryError::NotReadable { .. })
        ));
        assert!(loader.is_unloaded());
    }

    #[test]
    fn discovery_of_a_missing_directory_fails() {
        let mut loader = aggregator();
        let err = loader
            .discover_modules(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Scan { .. }));
    }
}
