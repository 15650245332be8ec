//! `pixlab`: an interactive shell over one editing session

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use pixlab_core::{EditorConfig, EditorSession};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod files;
mod shell;
mod viewport;

use shell::{Flow, Shell};

fn cli() -> Command {
    Command::new("pixlab")
        .version(pixlab_core::VERSION)
        .about("Interactive image editing session against a remote image service")
        .arg(
            Arg::new("backend-url")
                .long("backend-url")
                .value_name("URL")
                .help("Base address of the image service"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("image")
                .value_parser(value_parser!(PathBuf))
                .help("Image to open on start"),
        )
}

/// Defaults, then the config file, then `PIXLAB_*` variables, then flags
fn resolve_config(
    matches: &ArgMatches,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EditorConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let mut config = config.apply_env_from(env)?;
    if let Some(url) = matches.get_one::<String>("backend-url") {
        config = config.with_backend_url(url.trim());
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config = config.with_request_timeout(*secs);
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();
    let config = resolve_config(&matches, |key| std::env::var(key).ok())?;
    tracing::info!(backend = %config.backend_url, "starting session");

    let session = EditorSession::connect(config).context("cannot create session")?;
    let mut shell = Shell::new(session, std::io::stdout());

    if let Some(image) = matches.get_one::<PathBuf>("image") {
        shell.execute(&format!("open {}", image.display())).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("pixlab> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if shell.execute(&line).await? == Flow::Quit {
            break;
        }
    }
    Ok(())
}
