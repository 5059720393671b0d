//! Ctrl+C handling.
//!
//! The handler only sets a shared flag. The merger and chunker check it
//! between files, so a file operation is never cut in half; the run stops at
//! the next file boundary and reports itself as interrupted (exit code 130).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown manually.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Flag to hand to the collector, merger and chunker.
    ///
    /// ```
    /// use tmplmerge::signal::ShutdownHandler;
    /// use tmplmerge::chunk::ChunkConfig;
    ///
    /// let handler = ShutdownHandler::new();
    /// let config = ChunkConfig::default().with_shutdown_flag(handler.get_flag());
    /// ```
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the installed one.
///
/// The returned handler is reset. If the hook cannot be registered (another
/// library owns it), an unhooked handler is returned; it still honours
/// manual [`ShutdownHandler::request_shutdown`] calls.
#[must_use]
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();

        let result = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current file...");
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = result {
            log::debug!("Ctrl+C handler not installed: {e}");
        }
        handler
    });

    handler.reset();
    handler.clone()
}
