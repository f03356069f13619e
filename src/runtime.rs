// SPDX-License-Identifier: MPL-2.0

//! Shared async runtime for network operations.
//!
//! Synchronous callers (the command-line front end, embedding UIs) drive
//! the controller's async methods through this runtime instead of building
//! one per request.

use once_cell::sync::Lazy;
use std::future::Future;
use std::io;
use tokio::runtime::Runtime;

/// Two worker threads are plenty for I/O-bound requests.
static RUNTIME: Lazy<io::Result<Runtime>> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("questly-async")
        .build()
});

fn runtime() -> io::Result<&'static Runtime> {
    RUNTIME
        .as_ref()
        .map_err(|e| io::Error::new(e.kind(), e.to_string()))
}

/// Execute a future on the shared runtime, blocking until completion.
pub fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    Ok(runtime()?.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_runs_tokio_futures() {
        assert_eq!(block_on(async { 40 + 2 }).unwrap(), 42);

        let slept = block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            "done"
        });
        assert_eq!(slept.unwrap(), "done");
    }
}
