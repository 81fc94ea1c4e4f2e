mod error;
mod fetcher;
mod locator;
mod parser;
mod pipeline;
mod settings;
mod store;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "palette_extractor",
    about = "Extract the sentence palette embedded in the legacy web bundle"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the palette page and its legacy bundle, write the palette JSON
    Extract {
        /// Site root the page and script are resolved against
        #[arg(long)]
        base_url: Option<String>,
        /// Path of the HTML page referencing the bundle
        #[arg(long = "page")]
        page_path: Option<String>,
        /// Destination file (parent directory must exist)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the palette from a bundle saved on disk
    Parse {
        /// Saved legacy script
        #[arg(long)]
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarise an extracted palette file
    Stats {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Max categories to list
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Extract {
            base_url,
            page_path,
            output,
        } => {
            let settings = settings.with_overrides(base_url, page_path, output);
            let pb = stage_spinner()?;
            let report = pipeline::run(&settings, &pb).await;
            pb.finish_and_clear();
            let report = report.with_context(|| {
                format!("Palette extraction from {} failed", settings.base_url)
            })?;

            println!("Extracted palette data to {}", report.output.display());
            println!(
                "{} categories, {} topics, {} examples (from {})",
                report.categories, report.topics, report.examples, report.source
            );
            Ok(())
        }
        Commands::Parse { script, output } => {
            let output = output.unwrap_or(settings.output);
            let report = pipeline::run_from_script(&script, output)
                .await
                .with_context(|| format!("Failed to build palette from {}", script.display()))?;

            println!("Extracted palette data to {}", report.output.display());
            println!(
                "{} categories, {} topics, {} examples",
                report.categories, report.topics, report.examples
            );
            Ok(())
        }
        Commands::Stats { input, limit } => {
            let input = input.unwrap_or(settings.output);
            let palette = store::load(&input)
                .await
                .with_context(|| format!("Failed to read palette from {}", input.display()))?;
            if palette.is_empty() {
                println!("Palette is empty.");
                return Ok(());
            }

            println!("{:>3} | {:<32} | {:>6} | {:>8}", "#", "Category", "Topics", "Examples");
            println!("{}", "-".repeat(60));
            for (i, c) in palette.iter().take(limit).enumerate() {
                let examples: usize = c.topics.iter().map(|t| t.examples.len()).sum();
                println!(
                    "{:>3} | {:<32} | {:>6} | {:>8}",
                    i + 1,
                    truncate(&c.category, 32),
                    c.topics.len(),
                    examples
                );
            }

            let (categories, topics, examples) = store::totals(&palette);
            println!(
                "\n{} categories | {} topics | {} examples",
                categories, topics, examples
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn stage_spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
