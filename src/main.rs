//! Wiki Slots CLI
//!
//! Usage:
//!   wiki-slots parse [OPTIONS] [FILE]
//!   wiki-slots roles [--config <FILE>]
//!
//! Set `RUST_LOG` to control log output (default: warn).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wiki_slots::parser::flat_to_json;
use wiki_slots::{
    FlatTemplateParser, ParseStrategy, RoleRegistry, SlotsConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
};

#[derive(Parser)]
#[command(name = "wiki-slots")]
#[command(about = "Inspect wikitext templates and slot role configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract templates from wikitext and print them as JSON
    Parse {
        /// Input file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Build a template tree instead of the flat mapping
        #[arg(short, long)]
        recursive: bool,

        /// Maximum nesting depth for the recursive parser
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, value_parser = parse_max_depth)]
        max_depth: usize,

        /// Also extract templates nested in arguments (flat parser only)
        #[arg(short, long)]
        nested: bool,
    },

    /// Print the slot roles defined by a configuration
    Roles {
        /// Configuration file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_max_depth(value: &str) -> Result<usize, String> {
    let depth: usize = value.parse().map_err(|e| format!("{e}"))?;
    if (1..=MAX_DEPTH_LIMIT).contains(&depth) {
        Ok(depth)
    } else {
        Err(format!("must be between 1 and {MAX_DEPTH_LIMIT}"))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse {
            input,
            recursive,
            max_depth,
            nested,
        } => run_parse(input, recursive, max_depth, nested),
        Command::Roles { config } => run_roles(config),
    }
}

fn run_parse(input: Option<PathBuf>, recursive: bool, max_depth: usize, nested: bool) {
    let (source, filename) = match &input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let json = if recursive {
        match wiki_slots::parse_with(ParseStrategy::Recursive { max_depth }, &source) {
            Ok(parsed) => parsed.to_json(),
            Err(e) => {
                eprintln!("{}", e.format(&source, &filename));
                std::process::exit(1);
            }
        }
    } else {
        let parser = FlatTemplateParser::new().with_nested_extraction(nested);
        flat_to_json(&parser.parse(&source))
    };

    match serde_json::to_string_pretty(&json) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_roles(config: Option<PathBuf>) {
    let config = match &config {
        Some(path) => match SlotsConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading configuration '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SlotsConfig::default(),
    };

    let registry = RoleRegistry::from_config(&config);
    for role in registry.iter() {
        println!(
            "{}\t{}\tdisplay={} region={} placement={}",
            role.name,
            role.content_model,
            role.layout.display,
            role.layout.region,
            role.layout.placement
        );
    }
}
