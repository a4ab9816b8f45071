use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use locmap::api::{Geocode, GeocodeError, LocationIq};
use locmap::config::{API_KEY_ENV, FileConfig};
use locmap::dashboard::{Banner, Dashboard, DashboardEvent};
use locmap::domain::LocationCollection;
use locmap::present::{MAX_ZOOM, Render, TextPresenter};

/// Geocode addresses with LocationIQ and print or map the results
///
/// The API key is read from --api-key, then the LOCATIONIQ_API_KEY environment
/// variable, then `api_key` in the config file. If none is set you are prompted for it.
///
/// Examples:
///   # Print coordinates for addresses typed at the prompt
///   locmap lookup
///
///   # Collect locations into a table and an HTML map
///   locmap map -o places.html
///
///   # Keep the map centered on London whatever is searched
///   locmap map --lat 51.5074 --lon -0.1278 --zoom 11
#[derive(Parser, Debug)]
#[command(name = "locmap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional, auto-searches locmap.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// LocationIQ API key (prefer LOCATIONIQ_API_KEY, flags are visible to other users)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prompt for addresses and print their coordinates
    Lookup,

    /// Interactive session collecting locations into a table and an HTML map
    Map {
        /// HTML file the map is written to after every command
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Fixed map center latitude (use with --lon)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Fixed map center longitude (use with --lat)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Initial zoom level
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_ZOOM)))]
        zoom: Option<u8>,
    },
}

/// One line typed at the `map` prompt
#[derive(Debug, PartialEq)]
enum MapCommand {
    Event(DashboardEvent),
    ChangeKey,
    Help,
    Quit,
    Nothing,
}

/// Result of work that Ctrl-C may cut short
#[derive(Debug, PartialEq)]
enum Interruptible<T> {
    Done(T),
    Interrupted,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = match cli.config {
        Some(ref path) => FileConfig::load_from(path)?,
        None => FileConfig::load().unwrap_or_default(),
    };

    let env_key = std::env::var(API_KEY_ENV).ok();
    let api_key = file_config.api_key(cli.api_key.as_deref(), env_key.as_deref());

    let geocoder = LocationIq::new(
        file_config.endpoint.clone(),
        Duration::from_secs(file_config.timeout_secs),
    )
    .context("Failed to create HTTP client")?;
    info!(endpoint = geocoder.endpoint(), "Using LocationIQ endpoint");

    match cli.command {
        Command::Lookup => run_lookup(&geocoder, api_key),
        Command::Map {
            output,
            lat,
            lon,
            zoom,
        } => {
            let cli_center = lat.zip(lon);
            let center = file_config.map.resolve_center(cli_center)?;
            let zoom = file_config.map.resolve_zoom(zoom)?;
            let output = output.unwrap_or_else(|| file_config.map.output.clone());
            run_map(geocoder, api_key, center, zoom, &output)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt_api_key() -> Result<String> {
    Password::new()
        .with_prompt("Enter LocationIQ API Key")
        .interact()
        .context("Failed to read API key")
}

/// Text loop: print the latest result until Ctrl-C or end of input
fn run_lookup(geocoder: &LocationIq, api_key: Option<String>) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => prompt_api_key()?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create signal runtime")?;
    let mut editor = DefaultEditor::new().context("Failed to initialise line editor")?;
    let mut locations = LocationCollection::new();

    loop {
        let line = match editor.readline("\n Input the address: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                debug!("Input closed, leaving lookup");
                break;
            }
            Err(e) => return Err(e).context("Failed to read input"),
        };
        record_history(&mut editor, &line);

        let spinner = create_spinner("Geocoding...");
        let worker = geocoder.clone();
        let key = api_key.clone();
        let outcome = run_interruptible(
            &runtime,
            move || worker.resolve(&line, &key),
            ctrl_c_signal(),
        );
        spinner.finish_and_clear();

        match outcome? {
            Interruptible::Done(Ok(location)) => {
                locations.append(location);
                println!("{}", TextPresenter.render(&locations));
            }
            Interruptible::Done(Err(e)) => println!("{}", lookup_error_message(&e)),
            Interruptible::Interrupted => {
                debug!("Interrupted during request, leaving lookup");
                // The abandoned request may still be waiting on its timeout
                runtime.shutdown_background();
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Run blocking `work` on a worker thread, giving up as soon as `interrupt` completes
fn run_interruptible<T, F, I>(runtime: &Runtime, work: F, interrupt: I) -> Result<Interruptible<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
    I: Future<Output = ()>,
{
    runtime.block_on(async move {
        tokio::select! {
            joined = tokio::task::spawn_blocking(work) => {
                joined.map(Interruptible::Done).context("Lookup worker failed")
            }
            _ = interrupt => Ok(Interruptible::Interrupted),
        }
    })
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn ctrl_c_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// What the lookup loop prints for a failed geocode
fn lookup_error_message(err: &GeocodeError) -> String {
    if err.is_no_match() {
        "Enter a valid location name".to_string()
    } else if err.is_transport() {
        format!("Error: {}. Check your connection and API key.", err)
    } else {
        format!("Error: {}", err)
    }
}

fn record_history(editor: &mut DefaultEditor, line: &str) {
    if let Err(e) = editor.add_history_entry(line) {
        debug!("Failed to record history entry: {}", e);
    }
}

/// Dashboard loop: each command is dispatched, then the table is printed and
/// the HTML map rewritten
fn run_map(
    geocoder: LocationIq,
    api_key: Option<String>,
    center: Option<(f64, f64)>,
    zoom: u8,
    output: &Path,
) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => prompt_api_key()?,
    };

    let mut dashboard = Dashboard::new(geocoder)
        .with_api_key(api_key)
        .with_center(center)
        .with_zoom(zoom);

    println!("LocationIQ Map Viewer");
    println!("=====================");
    print_map_help();
    write_map(&dashboard, output)?;
    println!("Map: {}", output.display());

    let mut editor = DefaultEditor::new().context("Failed to initialise line editor")?;

    loop {
        let line = match editor.readline("\nlocmap> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                debug!("Input closed, leaving map session");
                break;
            }
            Err(e) => return Err(e).context("Failed to read input"),
        };
        record_history(&mut editor, &line);

        let event = match parse_map_command(&line) {
            MapCommand::Event(event) => event,
            MapCommand::ChangeKey => DashboardEvent::SetApiKey(prompt_api_key()?),
            MapCommand::Help => {
                print_map_help();
                continue;
            }
            MapCommand::Quit => break,
            MapCommand::Nothing => continue,
        };

        let state = if matches!(event, DashboardEvent::Search(_)) {
            let spinner = create_spinner("Searching...");
            let state = dashboard.dispatch(event);
            spinner.finish_and_clear();
            state
        } else {
            dashboard.dispatch(event)
        };
        debug!(?state, "Dashboard updated");

        let view = dashboard.view();
        match view.banner {
            Some(Banner::Warning(msg)) => println!("Warning: {}", msg),
            Some(Banner::Error(msg)) => println!("{}", msg),
            None => {}
        }
        println!();
        println!("{}", view.table.render());

        write_map(&dashboard, output)?;
    }

    Ok(())
}

fn parse_map_command(line: &str) -> MapCommand {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let word = word.to_lowercase();

    if word == "search" || word == "s" {
        return MapCommand::Event(DashboardEvent::Search(rest.trim().to_string()));
    }

    // Other commands only match on their own so addresses like "Clear Lake" are searched
    match line.to_lowercase().as_str() {
        "" => MapCommand::Nothing,
        "clear" => MapCommand::Event(DashboardEvent::Clear),
        "key" => MapCommand::ChangeKey,
        "help" | "?" => MapCommand::Help,
        "quit" | "exit" | "q" => MapCommand::Quit,
        _ => MapCommand::Event(DashboardEvent::Search(line.to_string())),
    }
}

fn print_map_help() {
    println!();
    println!("Commands:");
    println!("  search <address>   Geocode and add to the map (bare text works too)");
    println!("  clear              Remove all locations");
    println!("  key                Enter a different API key");
    println!("  help               Show this list");
    println!("  quit               Leave (Ctrl-C and Ctrl-D also work)");
}

fn write_map<G: Geocode>(dashboard: &Dashboard<G>, output: &Path) -> Result<()> {
    std::fs::write(output, dashboard.render_map())
        .with_context(|| format!("Failed to write map file: {:?}", output))
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_commands() {
        assert_eq!(
            parse_map_command("search Paris, France"),
            MapCommand::Event(DashboardEvent::Search("Paris, France".to_string()))
        );
        assert_eq!(
            parse_map_command("  Eiffel Tower "),
            MapCommand::Event(DashboardEvent::Search("Eiffel Tower".to_string()))
        );
        assert_eq!(parse_map_command("CLEAR"), MapCommand::Event(DashboardEvent::Clear));
        assert_eq!(parse_map_command("key"), MapCommand::ChangeKey);
        assert_eq!(parse_map_command("help"), MapCommand::Help);
        assert_eq!(parse_map_command("exit"), MapCommand::Quit);
        assert_eq!(parse_map_command("   "), MapCommand::Nothing);
    }

    #[test]
    fn test_addresses_starting_with_command_words_are_searched() {
        for address in [
            "Clear Lake, California",
            "Key West, Florida",
            "Q Street, Washington",
            "Exit 12, New Jersey Turnpike",
            "Help, Germany",
        ] {
            assert_eq!(
                parse_map_command(address),
                MapCommand::Event(DashboardEvent::Search(address.to_string())),
                "address {:?}",
                address
            );
        }
    }

    #[test]
    fn test_lookup_error_messages() {
        assert_eq!(
            lookup_error_message(&GeocodeError::EmptyResult("asdkfjasdkf".into())),
            "Enter a valid location name"
        );
        assert_eq!(
            lookup_error_message(&GeocodeError::InvalidQuery),
            "Enter a valid location name"
        );

        let transport = lookup_error_message(&GeocodeError::HttpStatus {
            status: 401,
            message: "Invalid key".into(),
        });
        assert!(transport.starts_with("Error: LocationIQ returned status 401: Invalid key"));
        assert!(transport.ends_with("Check your connection and API key."));

        assert_eq!(
            lookup_error_message(&GeocodeError::MalformedResponse("expected a JSON array".into())),
            "Error: unexpected response from LocationIQ: expected a JSON array"
        );
    }

    fn test_runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_interrupt_abandons_pending_work() {
        let runtime = test_runtime();
        let outcome = run_interruptible(
            &runtime,
            || {
                std::thread::sleep(Duration::from_secs(5));
                1
            },
            std::future::ready(()),
        )
        .unwrap();

        assert_eq!(outcome, Interruptible::Interrupted);
        runtime.shutdown_background();
    }

    #[test]
    fn test_work_completes_without_interrupt() {
        let runtime = test_runtime();
        let outcome =
            run_interruptible(&runtime, || 42, std::future::pending::<()>()).unwrap();

        assert_eq!(outcome, Interruptible::Done(42));
    }

    #[test]
    fn test_cli_parses_map_options() {
        let cli = Cli::parse_from([
            "locmap", "-vv", "map", "--lat", "51.5", "--lon", "-0.12", "--zoom", "11",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Map { lat, lon, zoom, output } => {
                assert_eq!(lat, Some(51.5));
                assert_eq!(lon, Some(-0.12));
                assert_eq!(zoom, Some(11));
                assert_eq!(output, None);
            }
            other => panic!("expected map command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["locmap", "map", "--lat", "51.5"]).is_err());
    }
}
