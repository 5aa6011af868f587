//! Profiling utilities based on the `puffin` crate.
//!
//! The scope macros are always available and cost almost nothing while
//! scopes are turned off. Serving the data to `puffin_viewer` needs the
//! `profiling` feature.

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

/// Profiling backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Send profiling data to puffin_viewer via HTTP.
    PuffinHttp,
}

#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Default address of the puffin HTTP server.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8585";

/// Initialize profiling with the specified backend.
///
/// # Example
/// ```no_run
/// use glint_core::profiling::{init_profiling, ProfilingBackend};
///
/// init_profiling(ProfilingBackend::PuffinHttp);
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling(backend: ProfilingBackend) {
    match backend {
        ProfilingBackend::PuffinHttp => {
            puffin::set_scopes_on(true);

            match puffin_http::Server::new(DEFAULT_ADDR) {
                Ok(server) => {
                    tracing::info!("Puffin profiler server started on http://{}", DEFAULT_ADDR);
                    let _ = PROFILING_SERVER.set(server);
                }
                Err(e) => {
                    tracing::error!("Failed to start puffin server: {}", e);
                }
            }
        }
    }
}

/// Without the `profiling` feature only the in-process scopes are enabled.
#[cfg(not(feature = "profiling"))]
pub fn init_profiling(backend: ProfilingBackend) {
    puffin::set_scopes_on(true);
    tracing::warn!(
        "{:?} requested but glint-core was built without the `profiling` feature",
        backend
    );
}

/// Mark the start of a new frame for profiling.
///
/// Call this once per frame in your main loop.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
