use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use pagegrid::common::{render_page, write_string_to_file};
use pagegrid::drafts::CellEdit;
use pagegrid::notify::RecordingSink;
use pagegrid::services::FileRecordService;
use pagegrid::{GridConfig, PagedEditableGrid};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// Grid configuration; the line-item grid is used when omitted
    #[clap(short, long, global = true)]
    config: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one page of records
    Show {
        #[clap(short, long)]
        records: String,
        #[clap(short, long, default_value = "1")]
        page: usize,
    },
    /// Stage edits from a file, commit them and print the refreshed page
    Apply {
        #[clap(short, long)]
        records: String,
        #[clap(short, long)]
        edits: String,
        #[clap(short, long, default_value = "1")]
        page: usize,
    },
    /// Write the default grid configuration
    InitConfig {
        #[clap(short, long, default_value = "grid.yaml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let config = match &args.config {
        Some(path) => {
            GridConfig::load(path).with_context(|| format!("Failed to load config {}", path))?
        }
        None => GridConfig::default(),
    };

    match args.command {
        Commands::Show { records, page } => {
            info!("Showing page {} of {}", page, records);
            let sink = RecordingSink::new();
            let mut grid = open_grid(config, &records, &sink).await?;
            goto_page(&mut grid, page);
            println!("{}", render_page(&grid));
        }
        Commands::Apply {
            records,
            edits,
            page,
        } => {
            let content = fs::read_to_string(&edits)
                .with_context(|| format!("Failed to read edits {}", edits))?;
            let edits: Vec<CellEdit> =
                serde_yaml::from_str(&content).context("Failed to parse edits")?;

            let sink = RecordingSink::new();
            let mut grid = open_grid(config, &records, &sink).await?;
            grid.stage_edits(edits)?;
            let outcome = grid.commit().await;

            for notification in sink.drain() {
                println!("[{}] {}", notification.title, notification.message);
            }
            if let Err(e) = &outcome {
                for failure in e.failures() {
                    eprintln!("{}", failure);
                }
            }

            goto_page(&mut grid, page);
            println!("{}", render_page(&grid));
            outcome.context("Commit failed")?;
        }
        Commands::InitConfig { output } => {
            info!("Writing default config to {}", output);
            write_string_to_file(&output, &GridConfig::default().to_yaml()?)?;
        }
    }

    Ok(())
}

async fn open_grid(
    config: GridConfig,
    records: &str,
    sink: &RecordingSink,
) -> Result<PagedEditableGrid> {
    let service = Arc::new(FileRecordService::new(records));
    let mut grid = PagedEditableGrid::new(config, service, Arc::new(sink.clone()))?;
    grid.load()
        .await
        .with_context(|| format!("Failed to load records from {}", records))?;
    Ok(grid)
}

fn goto_page(grid: &mut PagedEditableGrid, page: usize) {
    if page != grid.page_number() && !grid.goto(page) {
        eprintln!(
            "Page {} is out of range (1-{})",
            page,
            grid.total_pages().max(1)
        );
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
