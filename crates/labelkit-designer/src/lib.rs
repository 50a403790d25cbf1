//! # LabelKit Designer
//!
//! Label model and the interactive layout engine.
//!
//! ## Core Components
//!
//! - **Model**: labels, element styles and templates
//! - **Geometry**: element bounding boxes and overlap tests
//! - **Constraints**: keeping elements inside the label envelope
//! - **Collision**: moving elements off each other on a coarse grid
//! - **Batch**: generation, bulk edit, duplication and deletion
//! - **Session**: selection and editing state over the working set
//! - **Editor**: drag, resize and toggle operations on a draft label
//! - **Text layout**: measurement and word wrap
//! - **Serialization**: JSON import and export of label sets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labelkit_designer::{LabelSession, LabelTemplate};
//!
//! let mut session = LabelSession::new(LabelTemplate::default(), 8)?;
//! session.generate(12)?;
//! let json = labelkit_designer::export_labels_json(session.labels())?;
//! ```

pub mod batch;
pub mod collision;
pub mod constraints;
pub mod editor;
pub mod font_manager;
pub mod geometry;
pub mod logo;
pub mod model;
pub mod serialization;
pub mod session;
pub mod text_layout;

pub use batch::{
    delete_labels, duplicate_label, duplicate_labels, generate_labels, short_uuid, update_label,
    update_labels, validate_uuid_length, Selection, DEFAULT_UUID_LENGTH, MAX_UUID_LENGTH,
    MIN_UUID_LENGTH,
};
pub use collision::{resolve_placement, GRID_DIVISIONS};
pub use constraints::{constrain_position, position_limits, PositionLimits};
pub use editor::{ElementValidation, LabelEditor};
pub use geometry::{element_bounds, overlaps, Bounds};
pub use logo::Dimension;
pub use model::{
    Border, ElementKind, ElementMut, ElementRef, ElementStyle, Label, LabelElements, LabelSize,
    LabelTemplate, LogoElement, Position, TextAlign, TextElement, TextStyle,
};
pub use serialization::{
    export_labels_json, import_labels_json, load_labels, save_labels, LABELS_FILE_NAME,
};
pub use session::{EditingState, LabelSession};
pub use text_layout::{text_dimensions, wrap_lines, ApproxMeasure, FontMeasure, TextExtent, TextMeasure};
