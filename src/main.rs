//! CLI entry point for `mailcompose`.
//!
//! Thin wrapper exposing the library's text utilities for scripting and
//! debugging: placeholder extraction, substitution, and the two body
//! conversions.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mailcompose::bridge::{self, TagStripper};
use mailcompose::placeholder;

#[derive(Parser)]
#[command(name = "mailcompose", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the placeholder keys found in a template file (stdin if omitted)
    Extract {
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Substitute placeholder values into a template file
    Render {
        file: Option<PathBuf>,
        /// Placeholder value, repeatable: -s name=Ada -s city=London
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Convert plain text to paragraph HTML
    Text2html {
        file: Option<PathBuf>,
    },
    /// Flatten HTML to plain text
    Html2text {
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = mailcompose::config::load_config();
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    match cli.command {
        Commands::Extract { file, json } => cmd_extract(file.as_deref(), json),
        Commands::Render { file, set } => cmd_render(file.as_deref(), &set),
        Commands::Text2html { file } => {
            let input = read_input(file.as_deref())?;
            println!("{}", bridge::text_to_html(&input));
            Ok(())
        }
        Commands::Html2text { file } => {
            let input = read_input(file.as_deref())?;
            println!("{}", bridge::html_to_text(&TagStripper, &input));
            Ok(())
        }
    }
}

/// Set up tracing with stderr output.
fn setup_logging(level: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

/// Read from the given path, or stdin when none is given.
fn read_input(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Extract placeholder keys and print them, one per line or as JSON.
fn cmd_extract(path: Option<&std::path::Path>, json: bool) -> anyhow::Result<()> {
    let input = read_input(path)?;
    let keys = placeholder::extract_placeholders(&input);
    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else {
        for key in keys {
            println!("{key}");
        }
    }
    Ok(())
}

/// Substitute `-s key=value` pairs into the template and print the result.
fn cmd_render(path: Option<&std::path::Path>, pairs: &[String]) -> anyhow::Result<()> {
    let input = read_input(path)?;

    let mut values = HashMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --set '{pair}', expected KEY=VALUE"))?;
        values.insert(key.to_string(), value.to_string());
    }

    print!("{}", placeholder::apply_placeholders(&input, &values));
    Ok(())
}
