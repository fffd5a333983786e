//! A process-global last-error string, mirroring the `GLOBAL_ERROR` pattern
//! from the udev backend: layered alongside `Result<T, HidError>`, not
//! instead of it, so callers can use either idiom.

use std::cell::RefCell;
use std::sync::Mutex;

static GLOBAL_ERROR: Mutex<RefCell<Option<String>>> = Mutex::new(RefCell::new(None));

pub fn clear_global_error() {
    GLOBAL_ERROR.lock().expect("global error lock").take();
}

pub fn register_global_error(message: impl Into<String>) {
    GLOBAL_ERROR
        .lock()
        .expect("global error lock")
        .replace(Some(message.into()));
}

pub fn global_last_error() -> String {
    GLOBAL_ERROR
        .lock()
        .expect("global error lock")
        .borrow()
        .clone()
        .unwrap_or_else(|| "Success".to_string())
}
