//! Metrics preparation for the Indonesian gender-equality dashboard.
//!
//! Load → normalize → derive → rank → assemble. The binary wires these
//! stages to files; everything here is pure apart from [`loader`] and
//! [`output`].

pub mod charts;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod palette;
pub mod ranking;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{Error, Result};
