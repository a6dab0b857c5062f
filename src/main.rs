// Entry point and high-level CLI flow.
//
// By default the binary runs the whole pipeline once: load the CSV and the
// boundary file, backfill population, assemble every chart and write the
// outputs. With `--interactive` it offers the menu flow instead:
// - Option [1] loads and normalizes the inputs, printing diagnostics.
// - Option [2] assembles the charts, narrative facts and summary.
use clap::Parser;
use gender_dashboard::charts;
use gender_dashboard::config::Config;
use gender_dashboard::loader::{self, BoundaryIndex, LoadReport};
use gender_dashboard::metrics;
use gender_dashboard::normalize::{backfill, FillReport};
use gender_dashboard::output;
use gender_dashboard::palette::{self, ColorAssignment};
use gender_dashboard::reports;
use gender_dashboard::types::{BaseMetric, ChartRow, Dataset, FIRST_YEAR, LAST_YEAR};
use gender_dashboard::util;
use gender_dashboard::Result;
use std::io::{self, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Everything built once per session and read-only afterwards.
struct Prepared {
    dataset: Dataset,
    load: LoadReport,
    fill: FillReport,
    colors: ColorAssignment,
    boundaries: BoundaryIndex,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Load both inputs and run the normalizer. Any failure here stops the
/// session before a single chart is assembled.
fn prepare(cfg: &Config) -> Result<Prepared> {
    let (raw, load) = loader::load_observations(&cfg.data)?;
    let boundaries = loader::load_boundaries(&cfg.boundaries, &cfg.feature_key)?;
    let (dataset, fill) = backfill(&raw, BaseMetric::Population);
    let colors = palette::assign_for(&dataset)?;

    println!(
        "Processing dataset... ({} rows read, {} kept for {}-{})",
        util::format_int(load.total_rows),
        util::format_int(load.kept_rows),
        FIRST_YEAR,
        LAST_YEAR
    );
    if load.parse_errors + load.out_of_range > 0 {
        println!(
            "Note: {} rows skipped ({} unreadable, {} outside the year range).",
            util::format_int(load.parse_errors + load.out_of_range),
            util::format_int(load.parse_errors),
            util::format_int(load.out_of_range)
        );
    }
    if fill.filled > 0 {
        println!(
            "Info: Backward filled {} for {} rows.",
            fill.column,
            util::format_int(fill.filled)
        );
    }
    if !fill.unresolved.is_empty() {
        println!(
            "Warning: {} rows still have no {}.",
            util::format_int(fill.unresolved.len()),
            fill.column
        );
    }
    println!(
        "Boundaries: {} province keys loaded.\n",
        util::format_int(boundaries.keys.len())
    );

    Ok(Prepared {
        dataset,
        load,
        fill,
        colors,
        boundaries,
    })
}

/// Assemble charts and narrative facts, write them out and print previews.
fn generate(cfg: &Config, p: &Prepared) -> Result<()> {
    let year = p.dataset.resolve_year(cfg.year)?;
    let bundle = charts::assemble(&p.dataset, &p.colors, &p.boundaries, year)?;
    let narrative = reports::generate_narrative(&p.dataset, year);
    let derived = metrics::derive_all(&p.dataset);
    let summary = reports::generate_summary(&p.dataset, &p.load, &p.fill, &bundle);

    let charts_file = cfg.out_path("charts.json");
    output::write_json(&charts_file, &bundle)?;
    output::write_json(&cfg.out_path("derived.json"), &derived)?;
    let narrative_file = cfg.out_path("narrative.csv");
    output::write_csv(&narrative_file, &narrative)?;
    output::write_json(&cfg.out_path("summary.json"), &summary)?;
    info!(out_dir = %cfg.out_dir.display(), "outputs written");

    let rows: Vec<ChartRow> = bundle.charts.iter().map(|c| c.summary_row()).collect();
    output::preview_table(
        "Chart Specifications",
        Some(format!("{} charts, ranked charts for {}", rows.len(), year).as_str()),
        &rows,
        cfg.preview_rows,
    );
    println!("(All charts exported to {})\n", charts_file.display());

    output::preview_table(
        "Provinces Against the National Value",
        Some(format!("Strict comparison, {}", year).as_str()),
        &narrative,
        narrative.len(),
    );
    for row in &narrative {
        println!("{}", reports::describe(row));
    }
    println!("(Full table exported to {})\n", narrative_file.display());

    if !summary.warnings.is_empty() {
        println!("Warnings ({}):", util::format_int(summary.warnings.len()));
        for w in summary.warnings.iter().take(cfg.preview_rows) {
            println!("  - {}", w);
        }
        println!();
    }
    Ok(())
}

fn run_interactive(cfg: &Config) {
    let mut state: Option<Prepared> = None;
    loop {
        println!("Gender Equality in Indonesia");
        println!("[1] Load the files");
        println!("[2] Generate Charts\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => match prepare(cfg) {
                Ok(p) => state = Some(p),
                Err(e) => eprintln!("Failed to load inputs: {}\n", e),
            },
            "2" => {
                println!();
                let Some(p) = state.as_ref() else {
                    println!("Error: No data loaded. Please load the files first (option 1).\n");
                    continue;
                };
                if let Err(e) = generate(cfg, p) {
                    eprintln!("Failed to generate charts: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cfg = Config::parse();
    if cfg.interactive {
        run_interactive(&cfg);
        return Ok(());
    }

    let prepared = prepare(&cfg).inspect_err(|e| error!(error = %e, "inputs rejected"))?;
    generate(&cfg, &prepared)?;
    Ok(())
}
