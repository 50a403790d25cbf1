//! # Page Packing Module
//!
//! Computes how many labels fit on a printable page and where each one goes.
//!
//! All arithmetic is done in PDF points. Spacing separates neighbouring
//! labels and is never added after the last label in a row or column, so a
//! row holds `floor((available + spacing) / (label + spacing))` labels.
//! Cells are filled row-major.

use labelkit_core::units::Unit;
use labelkit_core::{ConfigurationError, PageSettings};
use labelkit_designer::{Label, LabelSize};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Physical size of one label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelDimensions {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl LabelDimensions {
    pub fn new(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            height,
            unit,
        }
    }

    pub fn of(size: &LabelSize) -> Self {
        Self::new(size.width, size.height, size.unit)
    }

    /// Width and height in PDF points
    pub fn points(&self) -> (f64, f64) {
        (self.unit.to_points(self.width), self.unit.to_points(self.height))
    }
}

/// One label positioned on a page, in points from the page's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the packed label slice
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A page and the labels placed on it
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    pub placements: Vec<Placement>,
}

/// Grid geometry for one page size and label size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGrid {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    pub spacing: f64,
    pub label_width: f64,
    pub label_height: f64,
    pub per_row: usize,
    pub per_column: usize,
    per_page: usize,
}

impl PageGrid {
    /// Fails when the page settings are invalid or not even one label fits.
    pub fn compute(page: &PageSettings, label: LabelDimensions) -> Result<Self, ConfigurationError> {
        page.validate()?;
        if !(label.width > 0.0 && label.height > 0.0) {
            return Err(ConfigurationError::InvalidPageSettings {
                reason: format!(
                    "label dimensions must be > 0, got {} x {}",
                    label.width, label.height
                ),
            });
        }

        let to_pt = |v: f64| page.unit.to_points(v);
        let (page_width, page_height) = page.size_points();
        let spacing = to_pt(page.spacing);
        let (label_width, label_height) = label.points();

        let available_width = page_width - to_pt(page.margin_left) - to_pt(page.margin_right);
        let available_height = page_height - to_pt(page.margin_top) - to_pt(page.margin_bottom);

        let fit = |available: f64, size: f64| -> usize {
            let count = ((available + spacing) / (size + spacing)).floor();
            if count >= 1.0 {
                count as usize
            } else {
                0
            }
        };
        let per_row = fit(available_width, label_width);
        let per_column = fit(available_height, label_height);

        if per_row == 0 || per_column == 0 {
            return Err(ConfigurationError::LabelDoesNotFit {
                label_width_pt: label_width,
                label_height_pt: label_height,
                available_width_pt: available_width,
                available_height_pt: available_height,
            });
        }

        let per_page = per_row.checked_mul(per_column).ok_or_else(|| {
            ConfigurationError::InvalidPageSettings {
                reason: format!(
                    "{} x {} labels per page is more than can be addressed",
                    per_row, per_column
                ),
            }
        })?;

        Ok(Self {
            page_width,
            page_height,
            margin_left: to_pt(page.margin_left),
            margin_top: to_pt(page.margin_top),
            spacing,
            label_width,
            label_height,
            per_row,
            per_column,
            per_page,
        })
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Top-left corner of cell `slot`, counted row-major from zero
    pub fn cell_origin(&self, slot: usize) -> (f64, f64) {
        let row = slot / self.per_row;
        let col = slot % self.per_row;
        (
            self.margin_left + col as f64 * (self.label_width + self.spacing),
            self.margin_top + row as f64 * (self.label_height + self.spacing),
        )
    }

    pub fn page_count(&self, labels: usize) -> usize {
        labels.div_ceil(self.per_page())
    }

    /// Split `count` labels into pages.
    pub fn layout(&self, count: usize) -> Vec<PageLayout> {
        let per_page = self.per_page();
        (0..self.page_count(count))
            .map(|page| {
                let first = page * per_page;
                let last = (first + per_page).min(count);
                let placements = (first..last)
                    .map(|index| {
                        let (x, y) = self.cell_origin(index - first);
                        Placement {
                            index,
                            x,
                            y,
                            width: self.label_width,
                            height: self.label_height,
                        }
                    })
                    .collect();
                PageLayout {
                    width: self.page_width,
                    height: self.page_height,
                    placements,
                }
            })
            .collect()
    }
}

/// Pack labels of one physical size onto pages.
pub fn pack(
    labels: &[Label],
    page: &PageSettings,
    label: LabelDimensions,
) -> Result<Vec<PageLayout>, ConfigurationError> {
    let grid = PageGrid::compute(page, label)?;
    let pages = grid.layout(labels.len());
    info!(
        "Packed {} labels: {} per row, {} per column, {} pages",
        labels.len(),
        grid.per_row,
        grid.per_column,
        pages.len()
    );
    Ok(pages)
}

/// One page per label, each page exactly the label's own size.
pub fn single_page_layouts(labels: &[Label]) -> Vec<PageLayout> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let (width, height) = label.size.size_points();
            PageLayout {
                width,
                height,
                placements: vec![Placement {
                    index,
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                }],
            }
        })
        .collect()
}

/// How labels are arranged in the exported PDF
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "pageSettings", rename_all = "camelCase")]
pub enum PdfLayout {
    /// Every label on its own page
    #[default]
    #[serde(rename = "single")]
    SinglePerPage,
    /// Labels packed in a grid on fixed-size pages
    #[serde(rename = "multiple")]
    Grid(PageSettings),
}

impl PdfLayout {
    /// Page layouts for `labels`.
    ///
    /// In grid mode every label takes the physical size of the first one.
    pub fn layouts(&self, labels: &[Label]) -> Result<Vec<PageLayout>, ConfigurationError> {
        match self {
            PdfLayout::SinglePerPage => Ok(single_page_layouts(labels)),
            PdfLayout::Grid(page) => match labels.first() {
                Some(first) => pack(labels, page, LabelDimensions::of(&first.size)),
                None => Ok(Vec::new()),
            },
        }
    }
}
