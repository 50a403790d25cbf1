//! # Export Pipeline
//!
//! Drives packing, rasterization and PDF assembly for one batch of labels.
//!
//! Labels are rasterized strictly in input order, one at a time. Between
//! labels the pipeline reports progress and yields to the runtime, and at
//! each label boundary it polls the [`CancellationToken`]. A cancelled run discards
//! the document and never reaches the sink.
//!
//! State machine: `Idle -> Running -> Completed | Cancelled | Failed`.
//! Only one run may be in flight per pipeline.

use crate::packing::PdfLayout;
use crate::pdf::PdfBuilder;
use crate::raster::{RasterRequest, Rasterizer, DEFAULT_SUPERSAMPLE};
use crate::sink::DocumentSink;
use labelkit_core::{thread_safe, DataCallback, ExportError, ThreadSafe};
use labelkit_designer::Label;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default PDF file name
pub const PDF_FILE_NAME: &str = "labels.pdf";

/// Lifecycle of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportProgress {
    pub completed: usize,
    pub total: usize,
    /// `None` until the first label is done
    pub estimated_remaining: Option<Duration>,
}

impl ExportProgress {
    fn start(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            estimated_remaining: None,
        }
    }

    /// Fraction done in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed { pages: usize, file_name: String },
    Cancelled { completed: usize },
}

/// Options for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub layout: PdfLayout,
    pub supersample: u32,
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: PdfLayout::default(),
            supersample: DEFAULT_SUPERSAMPLE,
            file_name: PDF_FILE_NAME.to_string(),
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Rolling estimate: average time per finished label times labels left.
fn estimate_remaining(elapsed: Duration, completed: usize, total: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let per_label = elapsed.as_secs_f64() / completed as f64;
    Some(Duration::from_secs_f64(per_label * (total - completed) as f64))
}

/// Export driver
pub struct ExportPipeline<R: Rasterizer> {
    rasterizer: R,
    state: ThreadSafe<ExportState>,
    progress: ThreadSafe<ExportProgress>,
    in_flight: AtomicBool,
    on_progress: Option<DataCallback<ExportProgress>>,
}

impl<R: Rasterizer> ExportPipeline<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            state: thread_safe(ExportState::Idle),
            progress: thread_safe(ExportProgress::default()),
            in_flight: AtomicBool::new(false),
            on_progress: None,
        }
    }

    /// Called after every label and once at start.
    pub fn with_progress_callback(mut self, callback: DataCallback<ExportProgress>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock()
    }

    pub fn progress(&self) -> ExportProgress {
        *self.progress.lock()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ExportState) {
        *self.state.lock() = state;
    }

    fn report(&self, progress: ExportProgress) {
        *self.progress.lock() = progress;
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }

    /// Export `labels` into one PDF and hand it to `sink`.
    ///
    /// Cancellation is not an error: it yields [`ExportOutcome::Cancelled`].
    pub async fn run(
        &self,
        labels: &[Label],
        options: &ExportOptions,
        sink: &mut (dyn DocumentSink + Send),
        cancel: &CancellationToken,
    ) -> Result<ExportOutcome, ExportError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected export: another export is in progress");
            return Err(ExportError::AlreadyRunning);
        }
        let _guard = InFlight(&self.in_flight);

        self.set_state(ExportState::Running);
        self.report(ExportProgress::start(labels.len()));

        if labels.is_empty() {
            info!("No labels to export");
            self.set_state(ExportState::Completed);
            return Ok(ExportOutcome::Completed {
                pages: 0,
                file_name: options.file_name.clone(),
            });
        }

        info!(
            "Starting export of {} labels to {}",
            labels.len(),
            options.file_name
        );

        match self.execute(labels, options, sink, cancel).await {
            Ok(outcome) => {
                match &outcome {
                    ExportOutcome::Completed { pages, file_name } => {
                        info!("Exported {} labels on {} pages to {}", labels.len(), pages, file_name);
                        self.set_state(ExportState::Completed);
                    }
                    ExportOutcome::Cancelled { completed } => {
                        info!("Export cancelled after {} of {} labels", completed, labels.len());
                        self.set_state(ExportState::Cancelled);
                    }
                }
                Ok(outcome)
            }
            Err(e) if e.is_cancellation() || (cancel.is_cancelled() && caused_by_render(&e)) => {
                let completed = self.progress().completed;
                info!("Export cancelled after {} of {} labels ({})", completed, labels.len(), e);
                self.set_state(ExportState::Cancelled);
                Ok(ExportOutcome::Cancelled { completed })
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.set_state(ExportState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        labels: &[Label],
        options: &ExportOptions,
        sink: &mut (dyn DocumentSink + Send),
        cancel: &CancellationToken,
    ) -> Result<ExportOutcome, ExportError> {
        let pages = options.layout.layouts(labels)?;
        let request = RasterRequest {
            supersample: options.supersample,
        };
        let total = labels.len();
        let started = Instant::now();
        let mut builder = PdfBuilder::new();
        let mut completed = 0;

        for page in &pages {
            builder.begin_page(page.width, page.height)?;
            for placement in &page.placements {
                if cancel.is_cancelled() {
                    return Ok(ExportOutcome::Cancelled { completed });
                }
                let label = &labels[placement.index];
                debug!("Rasterizing label {}/{} ({})", completed + 1, total, label.id);

                let image = self.rasterizer.rasterize(label, &request).await?;
                builder.place_image(
                    &image,
                    placement.x,
                    placement.y,
                    placement.width,
                    placement.height,
                )?;

                completed += 1;
                self.report(ExportProgress {
                    completed,
                    total,
                    estimated_remaining: estimate_remaining(started.elapsed(), completed, total),
                });
                tokio::task::yield_now().await;
            }
        }

        if cancel.is_cancelled() {
            return Ok(ExportOutcome::Cancelled { completed });
        }

        let page_count = builder.page_count();
        let bytes = builder.finish()?;
        sink.save(&options.file_name, &bytes)?;

        Ok(ExportOutcome::Completed {
            pages: page_count,
            file_name: options.file_name.clone(),
        })
    }
}

fn caused_by_render(error: &ExportError) -> bool {
    matches!(
        error,
        ExportError::Rasterization { .. } | ExportError::Encoding { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_remaining() {
        assert_eq!(estimate_remaining(Duration::from_secs(4), 0, 10), None);
        assert_eq!(
            estimate_remaining(Duration::from_secs(4), 2, 10),
            Some(Duration::from_secs(16))
        );
        assert_eq!(
            estimate_remaining(Duration::from_secs(4), 10, 10),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExportState::Idle.is_terminal());
        assert!(!ExportState::Running.is_terminal());
        assert!(ExportState::Cancelled.is_terminal());
        assert_eq!(ExportProgress::start(0).fraction(), 1.0);
    }
}
