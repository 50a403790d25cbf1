// Integration tests for the export pipeline

use async_trait::async_trait;
use image::RgbImage;
use labelkit_core::{thread_safe_vec, ExportError, PageSettings};
use labelkit_designer::{generate_labels, ElementKind, Label, LabelTemplate};
use labelkit_export::{
    CancellationToken, ExportOptions, ExportOutcome, ExportPipeline, ExportProgress, ExportState,
    FileSink, MemorySink, PdfLayout, RasterRequest, Rasterizer, SkiaRasterizer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns a blank image and records the order labels arrive in.
#[derive(Default)]
struct StubRasterizer {
    calls: AtomicUsize,
    seen: labelkit_core::ThreadSafeVec<String>,
    fail_at: Option<usize>,
    cancel_at: Option<(usize, CancellationToken)>,
    report_cancelled_at: Option<usize>,
    delay: Option<Duration>,
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn rasterize(&self, label: &Label, _request: &RasterRequest) -> Result<RgbImage, ExportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(label.id.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((at, token)) = &self.cancel_at {
            if *at == call {
                token.cancel();
            }
        }
        if self.fail_at == Some(call) {
            return Err(ExportError::rasterization(&label.id, "boom"));
        }
        if self.report_cancelled_at == Some(call) {
            return Err(ExportError::Cancelled);
        }
        Ok(RgbImage::from_pixel(4, 2, image::Rgb([255, 255, 255])))
    }
}

fn labels(count: usize) -> Vec<Label> {
    let template = LabelTemplate::default().with_enabled(&[ElementKind::QrCode]);
    generate_labels(count, &template, 8).unwrap()
}

fn grid_options() -> ExportOptions {
    ExportOptions {
        layout: PdfLayout::Grid(PageSettings::a4()),
        ..ExportOptions::default()
    }
}

#[tokio::test]
async fn test_grid_export_saves_once() {
    let labels = labels(12);
    let pipeline = ExportPipeline::new(StubRasterizer::default());
    let mut sink = MemorySink::new();

    let outcome = pipeline
        .run(&labels, &grid_options(), &mut sink, &CancellationToken::new())
        .await
        .unwrap();

    // 100 x 50 mm on A4 with 10 mm margins: 1 x 5 per page
    assert_eq!(
        outcome,
        ExportOutcome::Completed {
            pages: 3,
            file_name: "labels.pdf".to_string()
        }
    );
    assert_eq!(sink.documents.len(), 1);
    assert!(sink.documents[0].1.starts_with(b"%PDF"));
    assert_eq!(pipeline.state(), ExportState::Completed);
    assert_eq!(pipeline.progress().completed, 12);
    assert!(!pipeline.is_running());

    let pdf = lopdf::Document::load_mem(&sink.documents[0].1).unwrap();
    assert_eq!(pdf.get_pages().len(), 3);
}

#[tokio::test]
async fn test_labels_rasterized_in_input_order() {
    let labels = labels(7);
    let rasterizer = StubRasterizer::default();
    let seen = rasterizer.seen.clone();
    let pipeline = ExportPipeline::new(rasterizer);

    pipeline
        .run(&labels, &ExportOptions::default(), &mut MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();

    let expected: Vec<String> = labels.iter().map(|l| l.id.clone()).collect();
    assert_eq!(*seen.lock(), expected);
}

#[tokio::test]
async fn test_single_mode_one_page_per_label() {
    let labels = labels(4);
    let pipeline = ExportPipeline::new(StubRasterizer::default());
    let mut sink = MemorySink::new();
    let outcome = pipeline
        .run(&labels, &ExportOptions::default(), &mut sink, &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Completed { pages: 4, .. }));
}

#[tokio::test]
async fn test_progress_reported_per_label() {
    let labels = labels(3);
    let reports = thread_safe_vec::<ExportProgress>();
    let observer = reports.clone();
    let pipeline = ExportPipeline::new(StubRasterizer::default())
        .with_progress_callback(Box::new(move |p| observer.lock().push(p)));

    pipeline
        .run(&labels, &ExportOptions::default(), &mut MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();

    let completed: Vec<usize> = reports.lock().iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![0, 1, 2, 3]);
    let reports = reports.lock();
    assert!(reports[0].estimated_remaining.is_none());
    assert!(reports[3].estimated_remaining.is_some());
}

#[tokio::test]
async fn test_cancel_stops_at_next_label_and_skips_save() {
    let labels = labels(10);
    let cancel = CancellationToken::new();
    let rasterizer = StubRasterizer {
        cancel_at: Some((3, cancel.clone())),
        ..StubRasterizer::default()
    };
    let pipeline = ExportPipeline::new(rasterizer);
    let mut sink = MemorySink::new();

    let outcome = pipeline
        .run(&labels, &grid_options(), &mut sink, &cancel)
        .await
        .unwrap();

    // The label being rasterized when the flag flips still finishes
    assert_eq!(outcome, ExportOutcome::Cancelled { completed: 4 });
    assert!(sink.documents.is_empty());
    assert_eq!(pipeline.state(), ExportState::Cancelled);
}

#[tokio::test]
async fn test_parent_token_cancels_child_run() {
    let shutdown = CancellationToken::new();
    let rasterizer = StubRasterizer {
        cancel_at: Some((1, shutdown.clone())),
        ..StubRasterizer::default()
    };
    let pipeline = ExportPipeline::new(rasterizer);
    let mut sink = MemorySink::new();

    let outcome = pipeline
        .run(&labels(5), &grid_options(), &mut sink, &shutdown.child_token())
        .await
        .unwrap();

    assert_eq!(outcome, ExportOutcome::Cancelled { completed: 2 });
    assert!(sink.documents.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let pipeline = ExportPipeline::new(StubRasterizer::default());
    let mut sink = MemorySink::new();
    let outcome = pipeline
        .run(&labels(2), &ExportOptions::default(), &mut sink, &cancel)
        .await
        .unwrap();
    assert_eq!(outcome, ExportOutcome::Cancelled { completed: 0 });
    assert!(sink.documents.is_empty());
}

#[tokio::test]
async fn test_rasterization_failure_propagates() {
    let rasterizer = StubRasterizer {
        fail_at: Some(1),
        ..StubRasterizer::default()
    };
    let pipeline = ExportPipeline::new(rasterizer);
    let mut sink = MemorySink::new();

    let err = pipeline
        .run(&labels(3), &ExportOptions::default(), &mut sink, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Rasterization { .. }));
    assert_eq!(pipeline.state(), ExportState::Failed);
    assert!(sink.documents.is_empty());
    assert!(!pipeline.is_running());
}

#[tokio::test]
async fn test_failure_caused_by_cancellation_is_cancelled() {
    let rasterizer = StubRasterizer {
        report_cancelled_at: Some(2),
        ..StubRasterizer::default()
    };
    let pipeline = ExportPipeline::new(rasterizer);
    let outcome = pipeline
        .run(&labels(5), &ExportOptions::default(), &mut MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, ExportOutcome::Cancelled { completed: 2 });
    assert_eq!(pipeline.state(), ExportState::Cancelled);
}

#[tokio::test]
async fn test_label_too_large_for_page_fails() {
    let mut labels = labels(2);
    labels[0].size.width = 400.0;
    let pipeline = ExportPipeline::new(StubRasterizer::default());
    let err = pipeline
        .run(&labels, &grid_options(), &mut MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Configuration(_)));
    assert_eq!(pipeline.state(), ExportState::Failed);
}

#[tokio::test]
async fn test_second_run_rejected_while_running() {
    let rasterizer = StubRasterizer {
        delay: Some(Duration::from_millis(20)),
        ..StubRasterizer::default()
    };
    let pipeline = ExportPipeline::new(rasterizer);
    let labels = labels(2);
    let options = ExportOptions::default();
    let (cancel_a, cancel_b) = (CancellationToken::new(), CancellationToken::new());
    let mut first_sink = MemorySink::new();
    let mut second_sink = MemorySink::new();

    let (first, second) = tokio::join!(
        pipeline.run(&labels, &options, &mut first_sink, &cancel_a),
        pipeline.run(&labels, &options, &mut second_sink, &cancel_b),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ExportError::AlreadyRunning)));
    assert_eq!(first_sink.documents.len(), 1);
    assert!(second_sink.documents.is_empty());

    // The in-flight flag is released afterwards
    assert!(pipeline
        .run(&labels, &options, &mut MemorySink::new(), &CancellationToken::new())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_empty_export_is_a_no_op() {
    let pipeline = ExportPipeline::new(StubRasterizer::default());
    let mut sink = MemorySink::new();
    let outcome = pipeline
        .run(&[], &grid_options(), &mut sink, &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Completed { pages: 0, .. }));
    assert!(sink.documents.is_empty());
}

#[tokio::test]
async fn test_real_rasterizer_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::new(SkiaRasterizer::new());
    let mut sink = FileSink::new(dir.path());
    let options = ExportOptions {
        supersample: 1,
        ..grid_options()
    };

    pipeline
        .run(&labels(2), &options, &mut sink, &CancellationToken::new())
        .await
        .unwrap();

    let bytes = std::fs::read(dir.path().join("labels.pdf")).unwrap();
    assert_eq!(lopdf::Document::load_mem(&bytes).unwrap().get_pages().len(), 1);
}
