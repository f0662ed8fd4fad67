//! Smoke-test module: the minimal library a loader can drive end to end.
//!
//! Exports the full hook set plus one extra function the typed-call tests
//! resolve by hand.

use std::sync::atomic::{AtomicU32, Ordering};

use modulith_sdk::prelude::*;

static LOAD_COUNT: AtomicU32 = AtomicU32::new(0);

modulith_sdk::export_module_info! {
    author: "Modulith Contributors",
    name: "smoke",
    version: "0.1.0",
    description: "Minimal module used by the end-to-end tests",
}

#[no_mangle]
pub unsafe fn on_module_load(host: &mut dyn ModuleHost) {
    LOAD_COUNT.fetch_add(1, Ordering::SeqCst);
    host.log(Level::Info, "smoke module loaded");
}

#[no_mangle]
pub unsafe fn on_module_unload(host: &mut dyn ModuleHost) {
    LOAD_COUNT.fetch_sub(1, Ordering::SeqCst);
    host.log(Level::Info, "smoke module unloaded");
}

/// How many times the load hook has run, for the typed-call tests.
#[no_mangle]
pub extern "C" fn smoke_load_count() -> u32 {
    LOAD_COUNT.load(Ordering::SeqCst)
}
