//! Data Sweeper CLI - clean and convert CSV/XLSX files
//!
//! # Commands
//!
//! ```bash
//! datasweeper inspect sales.csv                     # Columns, missing values, preview
//! datasweeper convert sales.csv --to xlsx --dedup   # Clean and convert
//! datasweeper convert a.csv b.xlsx --to pdf --fill  # Batch, fill nulls with N/A
//! datasweeper chart sales.csv --column price        # Histogram PNG
//! datasweeper serve                                 # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use datasweeper::{
    i18n::{translate, TAGLINE, TITLE},
    ingest_file, inspect, render_histogram_png, sweep_batch, CellEdit, ChartOptions,
    ConvertOptions, Language, ParseOptions, SweepOptions, SweeperConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "datasweeper")]
#[command(about = "Clean CSV/XLSX files and convert them to CSV, XLSX, PDF, PNG or JPG", long_about = None)]
struct Cli {
    /// Interface language (en, ar, ur, fa)
    #[arg(long, global = true, default_value = "en", value_parser = parse_language)]
    lang: Language,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show columns, missing values and the first rows of each file
    Inspect {
        /// Input CSV/XLSX files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Preview rows (default: SWEEPER_PREVIEW_ROWS or 5)
        #[arg(short, long)]
        rows: Option<usize>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Clean and convert files
    Convert {
        /// Input CSV/XLSX files, processed one after another
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target format: csv, xlsx, pdf, png, jpg
        #[arg(short, long)]
        to: String,

        /// Remove duplicate rows
        #[arg(long)]
        dedup: bool,

        /// Fill missing values (default value: SWEEPER_FILL_VALUE or N/A)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        fill: Option<String>,

        /// Edit a cell before cleaning: ROW:COLUMN=VALUE (row is 0-based)
        #[arg(long = "edit", value_parser = CellEdit::parse)]
        edits: Vec<CellEdit>,

        /// Rows kept by PDF/PNG/JPG output (default: SWEEPER_EXPORT_ROWS or 20)
        #[arg(long, conflicts_with = "all_rows")]
        rows: Option<usize>,

        /// Keep every row in PDF/PNG/JPG output
        #[arg(long)]
        all_rows: bool,

        /// Draw a histogram of this column instead of a table (PNG/JPG)
        #[arg(long = "chart")]
        chart_columns: Vec<String>,

        /// Histogram buckets
        #[arg(long)]
        buckets: Option<usize>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Draw a histogram of numeric columns as PNG
    Chart {
        /// Input CSV/XLSX file
        file: PathBuf,

        /// Column to chart (repeatable; default: every numeric column)
        #[arg(short, long = "column")]
        columns: Vec<String>,

        /// Histogram buckets
        #[arg(short, long)]
        buckets: Option<usize>,

        /// Output file (default: <input>_histogram.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SWEEPER_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    let config = SweeperConfig::from_env();

    let cli = Cli::parse();

    eprintln!("🧹 {}", translate(TITLE, cli.lang));
    eprintln!("   {}\n", translate(TAGLINE, cli.lang));

    let result = match cli.command {
        Commands::Inspect { files, rows, delimiter } => {
            cmd_inspect(&files, rows.unwrap_or(config.preview_rows), delimiter)
        }

        Commands::Convert {
            files,
            to,
            dedup,
            fill,
            edits,
            rows,
            all_rows,
            chart_columns,
            buckets,
            delimiter,
            output_dir,
        } => {
            let chart = if chart_columns.is_empty() {
                None
            } else {
                Some(ChartOptions::new(chart_columns).with_buckets(buckets.unwrap_or(config.buckets)))
            };
            let options = SweepOptions {
                remove_duplicates: dedup,
                fill_missing: fill.map(|v| if v.is_empty() { config.fill_value.clone() } else { v }),
                edits,
                parse: ParseOptions { delimiter },
                convert: ConvertOptions {
                    chart,
                    preview_row_limit: if all_rows {
                        None
                    } else {
                        Some(rows.unwrap_or(config.export_rows))
                    },
                    file_stem: None,
                },
            };
            cmd_convert(&files, &to, &options, &output_dir)
        }

        Commands::Chart {
            file,
            columns,
            buckets,
            output,
        } => {
            let options = ChartOptions::new(columns).with_buckets(buckets.unwrap_or(config.buckets));
            cmd_chart(&file, &options, output.as_deref())
        }

        Commands::Serve { port } => {
            let config = SweeperConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_inspect(files: &[PathBuf], rows: usize, delimiter: Option<char>) -> CliResult {
    let options = ParseOptions { delimiter };
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        eprintln!("🔍 Inspecting: {}", path.display());
        let parsed = ingest_file(path, &options)?;
        if let Some(ref encoding) = parsed.encoding {
            eprintln!("   Encoding: {}", encoding);
        }
        if let Some(delimiter) = parsed.delimiter {
            eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
        }

        let report = inspect(&parsed.dataset, rows);
        eprintln!("   Rows: {}", report.rows);
        eprintln!("   Duplicate rows: {}", report.duplicate_rows);
        eprintln!("   Missing values: {}", report.missing_cells);

        reports.push(serde_json::json!({
            "file": path.display().to_string(),
            "format": parsed.format,
            "inspection": report,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn cmd_convert(files: &[PathBuf], target: &str, options: &SweepOptions, output_dir: &Path) -> CliResult {
    // Fail on a bad target before touching any file.
    let _: datasweeper::TargetFormat = target.parse()?;
    fs::create_dir_all(output_dir)?;

    let mut uploads = Vec::with_capacity(files.len());
    let mut failed = 0;
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        match fs::read(path) {
            Ok(bytes) => uploads.push((name, bytes)),
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    for (name, result) in sweep_batch(&uploads, target, options) {
        match result {
            Ok(swept) => {
                let out_path = output_dir.join(&swept.output.file_name);
                fs::write(&out_path, &swept.output.bytes)?;
                eprintln!(
                    "💾 {} → {} ({} rows{})",
                    name,
                    out_path.display(),
                    swept.output.rows_rendered,
                    if swept.output.truncated { ", truncated" } else { "" }
                );
            }
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, files.len()).into());
    }
    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_chart(file: &Path, options: &ChartOptions, output: Option<&Path>) -> CliResult {
    eprintln!("📊 Charting: {}", file.display());
    let parsed = ingest_file(file, &ParseOptions::default())?;
    let png = render_histogram_png(&parsed.dataset, options)?;

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
            PathBuf::from(format!("{}_histogram.png", stem))
        }
    };
    fs::write(&out_path, png)?;
    eprintln!("💾 Output written to: {}", out_path.display());
    Ok(())
}

async fn cmd_serve(config: SweeperConfig) -> CliResult {
    datasweeper::server::start_server(config).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
