use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};
use tracing_subscriber::fmt::{self, time::ChronoUtc, writer::BoxMakeWriter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Install the global subscriber.
///
/// `log_file` switches from stderr to a daily-rotated file; `json` overrides
/// the terminal-based choice between JSON and plain text.
pub fn init_logging_with_file(
    verbose_level: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    json: Option<bool>,
) -> Result<()> {
    // 0 = info, 1 = debug (with hyper/reqwest connection noise suppressed), 2+ = trace
    let filter = if quiet {
        // In quiet mode, only show errors
        EnvFilter::new("error")
    } else if verbose_level > 0 {
        // Use verbose level or RUST_LOG environment variable
        let filter_str = match verbose_level {
            1 => {
                // -v: debug level but suppress noisy hyper logs
                "debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest::connect=info"
            },
            _ => {
                // -vv and above: trace level (includes everything, including hyper logs)
                "trace"
            },
        };
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_str))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let json = match std::env::var("RUST_LOG_JSON") {
        Ok(v) => v == "true",
        Err(_) => json.unwrap_or_else(|| !io::stdout().is_terminal()),
    };

    let (writer, ansi) = match log_file {
        Some(path) => (BoxMakeWriter::new(rolling_appender(&path)?), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let layer = fmt::layer()
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(ansi)
        .with_writer(writer);

    let registry = Registry::default().with(filter);
    if json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }

    Ok(())
}

fn rolling_appender(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    // Files will be named: seedpick.2026-01-17, seedpick.2026-01-18, etc.
    let log_prefix = log_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(log_filename);

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix))
}
