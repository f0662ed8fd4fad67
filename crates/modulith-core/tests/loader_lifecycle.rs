//! Orchestration-order properties of `ModuleLoader`, driven by recording
//! mock children so no real library is needed.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use modulith_core::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Loaded(&'static str),
    Unloaded(&'static str),
    Dropped(&'static str),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

struct Probe {
    tag: &'static str,
    events: EventLog,
    loaded: bool,
    fail_load: bool,
}

impl Probe {
    fn new(tag: &'static str, events: &EventLog) -> Self {
        Self {
            tag,
            events: events.clone(),
            loaded: false,
            fail_load: false,
        }
    }

    fn failing(tag: &'static str, events: &EventLog) -> Self {
        let mut probe = Self::new(tag, events);
        probe.fail_load = true;
        probe
    }
}

impl Loadable for Probe {
    fn load(&mut self) -> Result<()> {
        if self.fail_load {
            return Err(ModuleError::Library(LibraryError::OpenFailed {
                path: PathBuf::from(self.tag),
                message: String::from("probe failure"),
            }));
        }
        self.loaded = true;
        self.events.borrow_mut().push(Event::Loaded(self.tag));
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        self.loaded = false;
        self.events.borrow_mut().push(Event::Unloaded(self.tag));
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl ModuleHost for Probe {
    fn classname(&self) -> Result<String> {
        Ok(self.tag.to_string())
    }

    fn module_info(&self) -> Result<ModuleInfo> {
        Err(ModuleError::NoBackingLibrary)
    }

    fn root_path(&self) -> Option<PathBuf> {
        None
    }

    fn config_dir(&self) -> Option<PathBuf> {
        None
    }

    fn log(&self, _level: Level, _message: &str) {}

    fn attach_library(&mut self, _path: &Path) -> Result<()> {
        Err(ModuleError::NotALoader)
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.events.borrow_mut().push(Event::Dropped(self.tag));
    }
}

fn aggregator() -> ModuleLoader {
    ModuleLoader::aggregator(ModuleContext::detached())
}

#[test]
fn children_load_forward_and_unload_in_reverse() {
    let events: EventLog = EventLog::default();
    let mut loader = aggregator();
    loader.attach_with(|_| Probe::new("a", &events));
    loader.attach_with(|_| Probe::new("b", &events));
    loader.attach_with(|_| Probe::new("c", &events));

    loader.load().unwrap();
    assert_eq!(
        events.borrow().as_slice(),
        &[Event::Loaded("a"), Event::Loaded("b"), Event::Loaded("c")]
    );

    loader.unload().unwrap();
    assert_eq!(
        events.borrow().as_slice(),
        &[
            Event::Loaded("a"),
            Event::Loaded("b"),
            Event::Loaded("c"),
            Event::Unloaded("c"),
            Event::Unloaded("b"),
            Event::Unloaded("a"),
        ]
    );
}

#[test]
fn a_failing_child_stops_the_forward_pass() {
    let events: EventLog = EventLog::default();
    let mut loader = aggregator();
    loader.attach_with(|_| Probe::new("a", &events));
    loader.attach_with(|_| Probe::failing("b", &events));
    loader.attach_with(|_| Probe::new("c", &events));

    let err = loader.load().unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Library(LibraryError::OpenFailed { .. })
    ));

    // A stays loaded, C was never attempted; there is no rollback.
    assert_eq!(events.borrow().as_slice(), &[Event::Loaded("a")]);
    assert!(loader.child(0).unwrap().is_loaded());
    assert!(loader.child(1).unwrap().is_unloaded());
    assert!(loader.child(2).unwrap().is_unloaded());
}

#[test]
fn unload_skips_children_that_never_loaded() {
    let events: EventLog = EventLog::default();
    let mut loader = aggregator();
    loader.attach_with(|_| Probe::new("a", &events));
    loader.attach_with(|_| Probe::failing("b", &events));

    let _ = loader.load();
    loader.unload().unwrap();

    assert_eq!(
        events.borrow().as_slice(),
        &[Event::Loaded("a"), Event::Unloaded("a")]
    );
}

#[test]
fn dropping_a_loader_releases_children_in_reverse_order() {
    let events: EventLog = EventLog::default();
    {
        let mut loader = aggregator();
        loader.attach_with(|_| Probe::new("a", &events));
        loader.attach_with(|_| Probe::new("b", &events));
        loader.attach_with(|_| Probe::new("c", &events));
        loader.load().unwrap();
        // No explicit unload before the loader goes away.
    }

    let dropped: Vec<Event> = events
        .borrow()
        .iter()
        .copied()
        .filter(|event| matches!(event, Event::Dropped(_)))
        .collect();
    assert_eq!(
        dropped,
        &[Event::Dropped("c"), Event::Dropped("b"), Event::Dropped("a")]
    );
}

#[test]
fn children_attached_after_a_pass_wait_for_the_next_one() {
    let events: EventLog = EventLog::default();
    let mut loader = aggregator();
    loader.attach_with(|_| Probe::new("a", &events));
    loader.load().unwrap();

    loader.attach_with(|_| Probe::new("late", &events));
    assert!(loader.child(1).unwrap().is_unloaded());

    loader.load().unwrap();
    assert!(loader.child(1).unwrap().is_loaded());
    // The earlier child was skipped, not re-loaded.
    assert_eq!(
        events.borrow().as_slice(),
        &[Event::Loaded("a"), Event::Loaded("late")]
    );
}

#[test]
fn nested_loaders_follow_the_same_discipline() {
    let events: EventLog = EventLog::default();
    let mut root = aggregator();
    root.attach_with(|_| Probe::new("first", &events));
    {
        let nested = root.attach_aggregator();
        nested.attach_with(|_| Probe::new("nested-a", &events));
        nested.attach_with(|_| Probe::new("nested-b", &events));
    }
    root.attach_with(|_| Probe::new("last", &events));

    root.load().unwrap();
    assert_eq!(
        events.borrow().as_slice(),
        &[
            Event::Loaded("first"),
            Event::Loaded("nested-a"),
            Event::Loaded("nested-b"),
            Event::Loaded("last"),
        ]
    );

    root.unload().unwrap();
    let unloaded: Vec<Event> = events
        .borrow()
        .iter()
        .copied()
        .filter(|event| matches!(event, Event::Unloaded(_)))
        .collect();
    assert_eq!(
        unloaded,
        &[
            Event::Unloaded("last"),
            Event::Unloaded("nested-b"),
            Event::Unloaded("nested-a"),
            Event::Unloaded("first"),
        ]
    );
}

#[test]
fn a_loaded_aggregator_reports_loaded_between_passes() {
    let mut loader = aggregator();
    assert!(loader.is_unloaded());
    loader.load().unwrap();
    assert!(loader.is_loaded());
    loader.load().unwrap();
    loader.unload().unwrap();
    assert!(loader.is_unloaded());
}
