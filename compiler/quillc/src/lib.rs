//! Quill command line support.
//!
//! The `quill` binary is a thin dispatcher over this library: [`options`]
//! turns flags into a [`SessionConfig`](quill_parse::SessionConfig),
//! [`script`] reads edit scripts, and [`commands`] renders each command's
//! report as text.
//!
//! # Tracing
//!
//! - `RUST_LOG=quill_parse=debug` (or `QUILL_LOG=...`): edits, relexes and
//!   grammar changes.
//! - `RUST_LOG=quill_deduce=trace`: every propagation step (very verbose).
//! - `QUILL_LOG_TREE=1`: render nested spans as a tree.

pub mod commands;
mod error;
pub mod options;
pub mod script;

pub use error::CliError;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times. Does nothing
/// unless `RUST_LOG` or `QUILL_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = match std::env::var("QUILL_LOG") {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            Err(_) => return,
        };
        let tree = std::env::var("QUILL_LOG_TREE").is_ok_and(|value| value == "1");
        if tree {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
