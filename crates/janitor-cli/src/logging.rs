use anyhow::Result;
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const DEBUG_DIRECTIVES: &str =
    "debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest::connect=warn,rustls=warn";

#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity {
    pub verbose: u8,
    pub quiet: bool,
}

impl Verbosity {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

/// 0 = info, 1 or dry-run = debug (hyper and friends clamped), 2+ = trace.
fn directives(verbosity: Verbosity, dry_run: bool) -> &'static str {
    if verbosity.quiet {
        "error"
    } else if verbosity.verbose >= 2 {
        "trace"
    } else if verbosity.verbose == 1 || dry_run {
        DEBUG_DIRECTIVES
    } else {
        "info"
    }
}

fn build_filter(verbosity: Verbosity, dry_run: bool) -> EnvFilter {
    // In quiet mode, only errors regardless of RUST_LOG
    if verbosity.quiet {
        return EnvFilter::new("error");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(verbosity, dry_run)))
}

fn json_requested() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Console only, for the short interactive commands.
pub fn init_console(verbosity: Verbosity) -> Result<()> {
    init_logging(verbosity, false, None)
}

/// Console on stderr plus, when `log_file` is given, an append-only file that
/// is never rotated. The file's directory must exist.
pub fn init_logging(verbosity: Verbosity, dry_run: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = build_filter(verbosity, dry_run);

    let console = if json_requested() {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .boxed()
    };

    let file = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name)
                .build(dir)?;

            Some(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(())
}
