//! gagsolve command line
//!
//! Reads a fill request as JSON and prints the ranked options as JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use serde::Deserialize;
use tracing::{error, info};

use gagsolve::{
    explain, FillRequest, FillResponse, GagCatalog, GagInstance, RawFillRequest, RuntimeConfig, SolverRuntime,
};

#[derive(Debug, Default)]
struct Config {
    /// Request file; stdin when absent.
    request: Option<PathBuf>,
    /// Catalog file; the standard catalog when absent.
    catalog: Option<PathBuf>,
    /// Print each option's accuracy trace to stderr.
    explain: bool,
    /// Pretty-print the response.
    pretty: bool,
}

fn usage() {
    println!("gagsolve - fill-to-kill solver");
    println!();
    println!("USAGE:");
    println!("    gagsolve [OPTIONS] < request.json");
    println!();
    println!("OPTIONS:");
    println!("    -r, --request <PATH>    Read the request from a file instead of stdin");
    println!("    -c, --catalog <PATH>    Load gag definitions from a JSON file");
    println!("    -e, --explain           Print the accuracy trace of each option to stderr");
    println!("    -p, --pretty            Pretty-print the JSON response");
    println!("    -h, --help              Print help information");
    println!();
    println!("Set RUST_LOG to control logging (default: warn).");
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    process::exit(2);
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--request" | "-r" => {
                let Some(path) = args.get(i + 1) else {
                    fail("--request requires a path");
                };
                config.request = Some(PathBuf::from(path));
                i += 2;
            }
            "--catalog" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    fail("--catalog requires a path");
                };
                config.catalog = Some(PathBuf::from(path));
                i += 2;
            }
            "--explain" | "-e" => {
                config.explain = true;
                i += 1;
            }
            "--pretty" | "-p" => {
                config.pretty = true;
                i += 1;
            }
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            other => fail(&format!("unknown argument: {other}")),
        }
    }
    config
}

fn read_input(config: &Config) -> io::Result<String> {
    match &config.request {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn load_catalog(config: &Config) -> Result<GagCatalog, Box<dyn std::error::Error>> {
    match &config.catalog {
        Some(path) => Ok(GagCatalog::from_json(&fs::read_to_string(path)?)?),
        None => Ok(GagCatalog::standard().clone()),
    }
}

fn parse_request(input: &str, catalog: &GagCatalog) -> Option<FillRequest> {
    let value: serde_json::Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(err) => {
            error!(%err, "request is not valid JSON");
            return None;
        }
    };
    match RawFillRequest::deserialize(&value) {
        Ok(raw) => Some(raw.normalize(catalog)),
        Err(err) => {
            error!(%err, "request is not a JSON object");
            None
        }
    }
}

fn print_traces(request: &FillRequest, response: &FillResponse) {
    let options = request.accuracy_options();
    for (idx, option) in response.options.iter().enumerate() {
        let all: Vec<GagInstance> = request.current.iter().chain(option.added.iter()).cloned().collect();
        match explain(&all, Some(request.target_level), &options) {
            Ok(text) => eprintln!("== option {} ==\n{text}\n", idx + 1),
            Err(err) => eprintln!("== option {} ==\n(no trace: {err})\n", idx + 1),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = parse_args();
    let catalog = load_catalog(&config)?;
    let input = read_input(&config)?;

    let response = match parse_request(&input, &catalog) {
        Some(request) => {
            let runtime = SolverRuntime::new(RuntimeConfig::default())?;
            // A failed solve prints an empty option list rather than an error.
            let options = runtime.solve(request.clone()).unwrap_or_else(|err| {
                error!(%err, "solve failed");
                Vec::new()
            });
            info!(options = options.len(), "solve complete");
            let response = FillResponse { options };
            if config.explain {
                print_traces(&request, &response);
            }
            response
        }
        None => FillResponse::default(),
    };

    let mut stdout = io::stdout().lock();
    if config.pretty {
        serde_json::to_writer_pretty(&mut stdout, &response)?;
    } else {
        serde_json::to_writer(&mut stdout, &response)?;
    }
    writeln!(stdout)?;
    Ok(())
}
