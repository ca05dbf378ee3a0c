//! appshell - command-line front end for the application shell.
//!
//! Each invocation acts as one page load of the shell: it restores the
//! session from per-session storage, runs one command against the route
//! table, the navigation guard or the API, and reports any full session
//! reset the command triggered.

mod shell;

use std::io;
use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use appshell_core::Config;
use shell::Shell;

/// Log file written inside the cache directory
const LOG_FILE: &str = "appshell.log";

const USAGE: &str = "\
Usage: appshell <command> [args]

Commands:
  routes [pages_dir]                 Print the route table built from a pages directory
  guard <path>                       Show the guard decision for a path
  go <path>                          Navigate to a path through guard and route table
  login <user-json> <token> [secs]   Store a session (token may be a JSON token object)
  renew <token> [secs]               Replace the session token, keeping the user
  whoami                             Print the signed-in user
  logout                             Clear the session
  get <path>                         GET an API path with the session token

Environment:
  APPSHELL_API_URL   API base URL (default http://localhost:3333)
  APPSHELL_SESSION   Session name (default \"default\")
  RUST_LOG           Log filter (default warn)";

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the file log on drop.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if std::fs::create_dir_all(log_dir).is_ok() {
        let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
    } else {
        (None, None)
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

    let config = Config::load()?;
    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(&cache_dir);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    info!(command = %command, "appshell starting");

    let shell = Shell::open(&config, &cache_dir)?;
    let rest = &args[1..];

    let result = match command.as_str() {
        "routes" => shell.routes(rest.first().map(String::as_str)),
        "guard" => shell.guard(required(rest, 0, "path")?),
        "go" => shell.go(required(rest, 0, "path")?),
        "login" => shell.login(
            required(rest, 0, "user-json")?,
            required(rest, 1, "token")?,
            parse_expiry(rest.get(2))?,
        ),
        "renew" => shell.renew(required(rest, 0, "token")?, parse_expiry(rest.get(1))?),
        "whoami" => shell.whoami(),
        "logout" => shell.logout(),
        "get" => shell.get(required(rest, 0, "path")?).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => Err(anyhow::anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
    };

    shell.finish();
    result
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing argument <{}>\n\n{}", name, USAGE))
}

fn parse_expiry(arg: Option<&String>) -> Result<Option<u64>> {
    match arg {
        Some(secs) => secs
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Expiry must be a number of seconds, got {}", secs)),
        None => Ok(None),
    }
}
