mod app;
mod config;
mod data;
mod error;
mod export;
mod state;
mod ui;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use eframe::egui;

use app::PriceViewerApp;
use config::{SourceConfig, ViewerConfig};
use data::pipeline::{build_view, ViewRequest};
use data::view::PresentationMode;
use export::{to_csv_bytes, write_to_path, ExportFormat};
use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "price-viewer", version, about = "Browse and export a product catalog with regional tier pricing")]
struct Cli {
    /// Config file (defaults to $PRICE_VIEWER_CONFIG, then ./price-viewer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file to open instead of the configured source
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Worksheet to read from --file
    #[arg(long, global = true, requires = "file")]
    sheet: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace; warnings only by default; RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the detected pricing regions and their tiers
    Regions,
    /// Filter the catalog and write the resulting table
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Pricing region whose tier columns are included
    #[arg(long)]
    region: Option<String>,

    /// Category to include (repeatable; all categories when omitted)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Descriptive column to include, in order (repeatable; configured base columns when omitted)
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Free-text search, every word must match
    #[arg(long, default_value = "")]
    search: String,

    /// Show price headers as "50 (EU)" instead of "50"
    #[arg(long)]
    with_region_names: bool,

    /// Write CSV here
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write Excel here
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(verbose))).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ViewerConfig::discover(cli.config.as_deref())?;
    if let Some(path) = cli.file {
        config.source = SourceConfig::File {
            path,
            sheet: cli.sheet,
        };
    }

    match cli.command {
        None => run_gui(config),
        Some(Command::Regions) => print_regions(&config),
        Some(Command::Export(args)) => run_export(config, &args),
    }
}

fn run_gui(config: ViewerConfig) -> Result<()> {
    let state = AppState::new(config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Price Viewer – Product Catalog",
        options,
        Box::new(|_cc| Ok(Box::new(PriceViewerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}

fn print_regions(config: &ViewerConfig) -> Result<()> {
    let mut cache = config.cache_for(config.catalog_source());
    let loaded = cache.load_or_reuse();
    for warning in loaded.warnings() {
        log::warn!("{warning}");
    }

    let mut out = std::io::stdout().lock();
    if loaded.regions.is_empty() {
        writeln!(out, "No pricing regions found.")?;
    }
    for (region, labels) in loaded.regions.iter() {
        writeln!(out, "{region}: {}", labels.join(", "))?;
    }
    Ok(())
}

fn run_export(config: ViewerConfig, args: &ExportArgs) -> Result<()> {
    let mut cache = config.cache_for(config.catalog_source());
    let loaded = cache.load_or_reuse();
    for warning in loaded.warnings() {
        log::warn!("{warning}");
    }

    if let Some(region) = &args.region {
        if loaded.regions.labels(region).is_empty() {
            log::warn!("Region '{region}' has no price columns; exporting base columns only");
        }
    }

    let request = ViewRequest {
        region: args.region.clone(),
        categories: if args.categories.is_empty() {
            loaded.dataset.categories()
        } else {
            args.categories.iter().cloned().collect()
        },
        search: args.search.clone(),
    };

    let mut options = config.view_options();
    if args.with_region_names {
        options.presentation = PresentationMode::LabelWithRegion;
    }
    if !args.columns.is_empty() {
        options.base_columns = args.columns.clone();
    }

    let view = build_view(
        &loaded.dataset,
        &loaded.regions,
        &request,
        &config.columns.searchable,
        &options,
    );

    if args.csv.is_none() && args.xlsx.is_none() {
        let bytes = to_csv_bytes(&view)?;
        std::io::stdout().write_all(&bytes).context("writing CSV to stdout")?;
        return Ok(());
    }
    if let Some(path) = &args.csv {
        write_to_path(&view, ExportFormat::Csv, path)?;
    }
    if let Some(path) = &args.xlsx {
        write_to_path(&view, ExportFormat::Xlsx, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_export_flags() {
        let cli = Cli::try_parse_from([
            "price-viewer",
            "--file",
            "catalog.xlsx",
            "export",
            "--region",
            "EU",
            "--category",
            "Pens",
            "--category",
            "Mugs",
            "--search",
            "blue ink",
            "--csv",
            "out.csv",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("catalog.xlsx")));
        let Some(Command::Export(args)) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.region.as_deref(), Some("EU"));
        assert_eq!(args.categories, vec!["Pens", "Mugs"]);
        assert_eq!(args.search, "blue ink");
        assert!(!args.with_region_names);
        assert_eq!(args.xlsx, None);
    }

    #[test]
    fn sheet_requires_file() {
        assert!(Cli::try_parse_from(["price-viewer", "--sheet", "Tab"]).is_err());
    }

    #[test]
    fn no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["price-viewer", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn each_verbose_flag_raises_the_level() {
        let levels: Vec<&str> = (0..=4).map(log_level).collect();
        assert_eq!(levels, vec!["warn", "info", "debug", "trace", "trace"]);
    }

    #[test]
    fn headless_export_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExportArgs {
            region: Some("UK".to_string()),
            categories: vec!["Bags".to_string()],
            columns: Vec::new(),
            search: String::new(),
            with_region_names: true,
            csv: Some(dir.path().join("out.csv")),
            xlsx: Some(dir.path().join("out.xlsx")),
        };
        run_export(ViewerConfig::default(), &args).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("out.csv")).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec!["REF", "Category", "Product Name", "Description", "50 (UK)", "100 (UK)"]
        );
        assert_eq!(reader.records().count(), 2);
        assert!(dir.path().join("out.xlsx").is_file());
    }

    #[test]
    fn headless_export_with_chosen_columns() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExportArgs {
            region: Some("US".to_string()),
            categories: Vec::new(),
            columns: vec!["Product Name".to_string(), "REF".to_string()],
            search: "eco".to_string(),
            with_region_names: false,
            csv: Some(dir.path().join("out.csv")),
            xlsx: None,
        };
        run_export(ViewerConfig::default(), &args).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("out.csv")).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["Product Name", "REF", "Tier1", "Tier2"]);
        assert_eq!(reader.records().count(), 2);
    }
}
