use anyhow::Result;
use clap::Parser;
use log::error;

use oneliner::{Cli, CommandHandler, Finish, QueryOptions};

const USAGE_HINT: &str = r#"Usage: oneliner [OPTIONS] <QUERY>...

Examples:
  oneliner list files in Documents ending with .pdf
  oneliner --execute "show disk usage of this directory"
  oneliner --style plain "find processes listening on port 8080"

Run 'oneliner --help' for all options."#;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only errors unless -v; RUST_LOG still applies on top.
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut handler = match CommandHandler::new(cli.ignore_default) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to initialize: {e:#}");
            eprintln!("Error: Failed to initialize oneliner: {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(action) = cli.info_action() {
        match handler.handle_info(action) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!("Command failed: {e:#}");
                eprintln!("{}", handler.format_error(&format!("{e:#}")));
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let Some(query) = cli.query_text() else {
        eprintln!("{USAGE_HINT}");
        std::process::exit(1);
    };

    let options = QueryOptions {
        style: cli.style,
        execute: cli.execute,
        copy: cli.copy,
        api_key: cli.api_key.clone(),
        timeout: cli.timeout,
    };

    match handler.handle_query(&query, options).await {
        // The generated command failing is reported, not propagated.
        Ok(report) => {
            if let Finish::ExecutionFailed(_) = report.finish {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Request failed: {e:#}");
            eprintln!("{}", handler.format_error(&format!("{e:#}")));
            std::process::exit(1);
        }
    }

    Ok(())
}
