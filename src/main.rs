// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans the sales CSV, printing diagnostics.
// - Option [2] runs every view, writes its table and a JSON summary.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
// `--batch` runs [1] then [2] once without prompting.
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vgsales_report::cli::Args;
use vgsales_report::config::{Config, DEFAULT_CONFIG_FILE};
use vgsales_report::types::SalesRecord;
use vgsales_report::{loader, output, reports, util, views};

// Simple in-memory app state so we only load/clean the CSV once but can
// generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<SalesRecord>>,
}

fn with_state<T>(f: impl FnOnce(&mut AppState) -> T) -> T {
    let mut state = APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut state)
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        // EOF on stdin ends the session.
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

/// Handle option [1]: load and clean the sales table.
fn handle_load(config: &Config) -> Result<()> {
    let path = &config.general.input;
    let (data, load_report) = loader::load_and_clean(path, config.general.delimiter)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    println!(
        "Processing dataset... ({} rows loaded from {})",
        util::format_int(load_report.loaded_rows as u64),
        path.display()
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped because they could not be decoded.",
            util::format_int(load_report.parse_errors as u64)
        );
    }
    if load_report.coerced_cells > 0 {
        println!(
            "Info: {} missing or non-numeric sales cells counted as 0.",
            util::format_int(load_report.coerced_cells as u64)
        );
    }
    if load_report.missing_years > 0 {
        println!(
            "Info: {} rows have no release year.",
            util::format_int(load_report.missing_years as u64)
        );
    }
    println!();
    with_state(|state| state.data = Some(data));
    Ok(())
}

/// Handle option [2]: run every selected view and write the outputs.
fn handle_generate_reports(config: &Config) -> Result<()> {
    let Some(data) = with_state(|state| state.data.clone()) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };

    let selected = views::select_views(views::resolve_views(&config.views), &config.general.views)?;
    let out_dir = &config.general.output_dir;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out_dir.display());

    let generated = reports::generate_reports(&data, &selected);
    for (idx, report) in generated.iter().enumerate() {
        let format = config.general.format;
        let mut files = Vec::new();
        if format.writes_csv() {
            let path = out_dir.join(format!("{}.csv", report.view.name));
            match output::write_csv(&path, &report.rows) {
                Ok(()) => files.push(path),
                Err(e) => eprintln!("Write error: {}", e),
            }
        }
        if format.writes_json() {
            let path = out_dir.join(format!("{}.json", report.view.name));
            match output::write_json(&path, &report.rows) {
                Ok(()) => files.push(path),
                Err(e) => eprintln!("Write error: {}", e),
            }
        }

        println!("Report {}: {}", idx + 1, report.view.title);
        if let Some(note) = &report.view.note {
            println!("({})", note);
        }
        println!();
        output::preview_table_rows(&report.rows, config.general.preview_rows);
        for f in &files {
            println!("(Full table exported to {})", f.display());
        }
        println!();
    }

    let summary = reports::generate_summary(&data, &generated);
    let summary_path = out_dir.join("summary.json");
    if let Err(e) = output::write_json(&summary_path, &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats ({}):", summary_path.display());
    println!(
        "{{\"total_records\": {}, \"total_global_sales\": {}}}\n",
        util::format_int(summary.total_records as u64),
        util::format_number(summary.total_global_sales, 2)
    );
    Ok(())
}

fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// `RUST_LOG` directives win; otherwise the level comes from `--verbose`/`--quiet`.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?,
        None => Config::load_default()
            .context("Failed to read default config file")?
            .unwrap_or_default(),
    };
    config.merge_with_args(args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn run_menu(config: &Config) {
    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Err(e) = handle_load(config) {
                    error!("{:#}", e);
                    eprintln!("Failed to load file: {:#}\n", e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports(config) {
                    error!("{:#}", e);
                    eprintln!("Failed to generate reports: {:#}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse_args();
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);
    info!("vgsales_report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let config = load_config(&args)?;

    if args.list_views {
        for view in views::resolve_views(&config.views) {
            println!("{:<24} {}", view.name, view.title);
        }
        return Ok(());
    }

    if args.batch {
        handle_load(&config)?;
        handle_generate_reports(&config)?;
        return Ok(());
    }

    run_menu(&config);
    Ok(())
}
