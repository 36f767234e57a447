//! User-facing shells.
//!
//! - [`INDEX_HTML`]: the single-page browser UI served at `/`
//! - [`ApiClient`] + [`ResultView`]: the terminal UI behind the CLI commands
//!
//! Both render behind a fault boundary: a rendering failure shows a fallback
//! message rather than a blank screen, and nothing is retried automatically.

mod client;
mod view;

pub use client::{describe_error, ApiClient};
pub use view::{render, render_boundary, Action, ResultView, View, RENDER_FALLBACK};

/// Browser UI page.
pub const INDEX_HTML: &str = include_str!("index.html");
