pub mod apis;
pub mod builtin;
mod clients;
pub mod dispatcher;
pub mod error;
pub mod groups;
pub mod mock;
pub mod sync;

#[cfg(test)]
mod sync_test;

pub use error::SyncError;
pub use sync::{StateSync, SyncOptions, UpdateKind};

#[cfg(test)]
pub fn init_tracing_tests() {
    use std::sync::LazyLock;

    // tests run on many threads, so we use a Mutex to ensure we only
    // initialize once globally
    static INIT: LazyLock<std::sync::Mutex<bool>> = LazyLock::new(|| std::sync::Mutex::new(false));

    let mut init = INIT.lock().unwrap();

    if !*init {
        *init = true;

        // we want to be able to see tracing info in tests
        tracing_subscriber::fmt::init();
    }
}
