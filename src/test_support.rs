//! Shared setup for unit tests: every test binds the in-process runtime

pub fn init() {
    if let Err(err) = crate::initialize(hostlink_runtime::hostlink_get_proc_address) {
        panic!("runtime interface failed to install: {}", err);
    }
}
