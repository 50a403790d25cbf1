//! # LabelKit Core
//!
//! Core types shared by the LabelKit crates: unit conversion between label
//! units, rendering pixels and PDF points; printable page settings; the
//! error taxonomy; and shared type aliases.

pub mod error;
pub mod page;
pub mod types;
pub mod units;

pub use error::{ConfigurationError, Error, ExportError, Result, ValidationError};
pub use page::PageSettings;
pub use types::{thread_safe, thread_safe_vec, DataCallback, ThreadSafe, ThreadSafeVec};
pub use units::{scale_factor, PageUnit, Unit};
