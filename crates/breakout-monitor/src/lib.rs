//! Logging setup and status rendering.

mod logging;
mod status;

pub use logging::setup_logging;
pub use status::render_status;
