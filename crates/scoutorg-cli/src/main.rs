//! scoutorg - view a scout group from the terminal.
//!
//! Loads the configured group from Scoutnet (through the on-disk response
//! cache) and prints its branches, troops, role groups, waiting list or
//! custom lists.

mod report;

use std::io;

use anyhow::{bail, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scoutorg_core::{load_organization, Config, IndexBy, OrgError};

/// Environment variable naming a directory for daily log files
const LOG_DIR_ENV: &str = "SCOUTORG_LOG_DIR";

const USAGE: &str = "\
Usage: scoutorg [OPTIONS]

Options:
  --group <ID>      Group to show (defaults to the configured group)
  --waiting         Print the waiting list
  --custom-lists    Print custom lists
  -h, --help        Show this help";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    group: Option<i64>,
    waiting: bool,
    custom_lists: bool,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--group" => {
                let value = match args.next() {
                    Some(value) => value,
                    None => bail!("--group needs a group id"),
                };
                parsed.group = Some(
                    value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid group id: {}", value))?,
                );
            }
            "--waiting" => parsed.waiting = true,
            "--custom-lists" => parsed.custom_lists = true,
            "-h" | "--help" => parsed.help = true,
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }
    Ok(parsed)
}

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "scoutorg.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let org = match load_organization(&config) {
        Ok(org) => org,
        Err(OrgError::ConfigurationInvalid(reason)) => {
            warn!(reason = %reason, "Organization loading disabled");
            eprintln!("Organization loading is disabled: {}", reason);
            eprintln!("Set SCOUTORG_GROUP_ID, SCOUTORG_MEMBER_LIST_KEY and SCOUTORG_CUSTOM_LISTS_KEY.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let group_id = match args.group.or(config.group_id) {
        Some(id) => id,
        None => bail!("No group id given"),
    };
    info!(group_id, "Loading group");

    let group = org.group(group_id).await?;
    print!("{}", report::group_summary(&group));

    if args.waiting {
        let waiting = org.waiting_list(group_id).await?;
        print!("{}", report::waiting_list(&waiting));
    }

    if args.custom_lists {
        let lists = org.custom_lists(group_id, IndexBy::Id).await?;
        print!("{}", report::custom_lists(&lists));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(args(&[]).unwrap(), Args::default());
        let parsed = args(&["--group", "767", "--waiting"]).unwrap();
        assert_eq!(parsed.group, Some(767));
        assert!(parsed.waiting);
        assert!(!parsed.custom_lists);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--group"]).is_err());
        assert!(args(&["--group", "abc"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }
}
