//! Type aliases shared across the LabelKit crates.
//!
//! - [`aliases`]: `Arc<Mutex<T>>` wrappers and callback types

pub mod aliases;

pub use aliases::*;
