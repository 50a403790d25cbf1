use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use labelkit_designer::{generate_labels, load_labels, save_labels, LabelTemplate};
use labelkit_core::units::format_length;
use labelkit_export::{
    CancellationToken, ExportOutcome, ExportPipeline, FileSink, LabelDimensions, PageGrid,
    SkiaRasterizer,
};
use labelkit_settings::{Config, LayoutMode};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "labelkit", version, about = "Batch label generator with QR codes and PDF export")]
pub struct Args {
    /// Config file (.toml or .json); defaults to the user config file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate labels from the configured template and write them as JSON
    Generate {
        /// Number of labels
        #[arg(short = 'n', long)]
        quantity: Option<usize>,
        /// QR payload prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Output file
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Render a labels file to PDF
    Export {
        /// Labels JSON file
        #[arg(short = 'l', long)]
        labels: PathBuf,
        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,
        /// Directory the PDF is written to
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        supersample: Option<u32>,
    },
    /// Show how a labels file packs onto the configured page
    Pack {
        #[arg(short = 'l', long)]
        labels: PathBuf,
    },
    /// Write the default configuration
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LayoutArg {
    Single,
    Grid,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => LayoutMode::Single,
            LayoutArg::Grid => LayoutMode::Grid,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            Err(e) => {
                warn!("{}; using defaults", e);
                Ok(Config::default())
            }
        },
    }
}

pub async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    match args.command {
        Command::Generate {
            quantity,
            prefix,
            out,
        } => generate(config, quantity, prefix, out),
        Command::Export {
            labels,
            layout,
            out_dir,
            supersample,
        } => export(config, &labels, layout, out_dir, supersample).await,
        Command::Pack { labels } => pack(&config, &labels),
        Command::InitConfig { path, force } => init_config(path, force),
    }
}

fn generate(
    config: Config,
    quantity: Option<usize>,
    prefix: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut template: LabelTemplate = config.to_template();
    if let Some(prefix) = prefix {
        template.prefix = prefix;
    }
    let quantity = quantity.unwrap_or(config.template.quantity);
    let labels = generate_labels(quantity, &template, config.template.uuid_length)?;

    let out = out.unwrap_or_else(|| config.export.output_dir.join(&config.export.json_file_name));
    save_labels(&out, &labels)?;
    println!("Wrote {} labels to {}", labels.len(), out.display());
    Ok(())
}

async fn export(
    mut config: Config,
    labels_path: &Path,
    layout: Option<LayoutArg>,
    out_dir: Option<PathBuf>,
    supersample: Option<u32>,
) -> Result<()> {
    if let Some(layout) = layout {
        config.export.layout = layout.into();
    }
    if let Some(supersample) = supersample {
        config.export.supersample = supersample;
    }
    if let Some(dir) = out_dir {
        config.export.output_dir = dir;
    }
    config.validate()?;

    let labels = load_labels(labels_path)?;
    let asset_root = labels_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let pipeline = ExportPipeline::new(SkiaRasterizer::with_asset_root(asset_root))
        .with_progress_callback(Box::new(|progress| {
            let eta = progress
                .estimated_remaining
                .map(|d| format!(", about {:.0}s left", d.as_secs_f64()))
                .unwrap_or_default();
            eprintln!("{}/{} labels{}", progress.completed, progress.total, eta);
        }));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone(), tokio::signal::ctrl_c()));
    // Stops the signal watcher once the export returns
    let _watcher = cancel.clone().drop_guard();

    let mut sink = FileSink::new(&config.export.output_dir);
    let outcome = pipeline
        .run(&labels, &config.export_options(), &mut sink, &cancel)
        .await?;

    match outcome {
        ExportOutcome::Completed { pages, file_name } if pages > 0 => {
            println!(
                "Exported {} labels on {} pages to {}",
                labels.len(),
                pages,
                config.export.output_dir.join(file_name).display()
            );
        }
        ExportOutcome::Completed { .. } => println!("No labels to export"),
        ExportOutcome::Cancelled { completed } => {
            println!("Export cancelled after {} of {} labels", completed, labels.len());
        }
    }
    Ok(())
}

/// Cancel `token` when `signal` fires. Returns whether the signal did it.
async fn cancel_on_signal<F>(token: CancellationToken, signal: F) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        _ = token.cancelled() => false,
        result = signal => match result {
            Ok(()) => {
                info!("Interrupt received, cancelling export");
                token.cancel();
                true
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl-C: {}", e);
                false
            }
        },
    }
}

fn pack(config: &Config, labels_path: &Path) -> Result<()> {
    let labels = load_labels(labels_path)?;
    let Some(first) = labels.first() else {
        println!("No labels");
        return Ok(());
    };

    match config.export.layout {
        LayoutMode::Single => {
            println!("One label per page: {} pages", labels.len());
        }
        LayoutMode::Grid => {
            let unit = first.size.unit;
            println!(
                "Label:      {} x {}",
                format_length(first.size.width, unit),
                format_length(first.size.height, unit)
            );
            let grid = PageGrid::compute(&config.page, LabelDimensions::of(&first.size))?;
            println!("Per row:    {}", grid.per_row);
            println!("Per column: {}", grid.per_column);
            println!("Per page:   {}", grid.per_page());
            println!("Pages:      {}", grid.page_count(labels.len()));
        }
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save_to_file(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
