//! # LabelKit Export
//!
//! Turns a set of labels into a printable PDF.
//!
//! - [`packing`]: how many labels fit on a page and where each one goes
//! - [`raster`]: label to image, with QR code, text, logo and border
//! - [`pdf`]: image pages assembled with lopdf
//! - [`sink`]: where the finished document is written
//! - [`pipeline`]: the cancellable, single-flight export driver

pub mod packing;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod sink;

pub use packing::{
    pack, single_page_layouts, LabelDimensions, PageGrid, PageLayout, PdfLayout, Placement,
};
pub use pdf::PdfBuilder;
pub use pipeline::{
    ExportOptions, ExportOutcome, ExportPipeline, ExportProgress, ExportState, PDF_FILE_NAME,
};
pub use raster::{parse_color, RasterRequest, Rasterizer, SkiaRasterizer, DEFAULT_SUPERSAMPLE};
pub use sink::{DocumentSink, FileSink, MemorySink};
pub use tokio_util::sync::CancellationToken;
