//! Developer tooling for a web build output directory: a static file
//! server with SPA fallback routing, and a batch precompressor that
//! writes `.gz`/`.br` siblings next to eligible assets.

pub mod args;
pub mod browser;
pub mod compression;
pub mod config;
pub mod error;
pub mod file_serving;
pub mod logging;
pub mod precompress;
pub mod server;

pub use config::ServeConfig;
pub use error::{ClientRequestError, Error, Result};
pub use logging::Logger;
