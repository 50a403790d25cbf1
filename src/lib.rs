//! # LabelKit
//!
//! Label template designer and batch generator:
//! - Labels with QR code, short id, company/product/free text and logo
//! - Placement constrained to the label, with optional collision avoidance
//! - Batch generation, bulk edit, duplication and JSON import/export
//! - PDF export, one label per page or packed in a grid
//!
//! ## Architecture
//!
//! 1. **labelkit-core** - units, page settings, error types, shared aliases
//! 2. **labelkit-designer** - label model and the interactive layout engine
//! 3. **labelkit-export** - page packing, rasterization and the PDF pipeline
//! 4. **labelkit-settings** - configuration files
//! 5. **labelkit** - command line front end that integrates all crates

pub mod cli;

pub use labelkit_designer as designer;
pub use labelkit_export as export;
pub use labelkit_settings as settings;

pub use labelkit_core::{
    ConfigurationError, Error, ExportError, PageSettings, PageUnit, Result, Unit,
    ValidationError,
};

pub use labelkit_designer::{
    generate_labels, load_labels, save_labels, Label, LabelSession, LabelSize, LabelTemplate,
};

pub use labelkit_export::{
    CancellationToken, ExportOptions, ExportOutcome, ExportPipeline, FileSink, PdfLayout,
    SkiaRasterizer,
};

pub use labelkit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// directives are honoured on top of an `INFO` default.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
