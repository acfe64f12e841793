use clap::builder::styling::{AnsiColor, Styles};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::Cyan.on_default().bold())
    .placeholder(AnsiColor::Cyan.on_default())
    .error(AnsiColor::Red.on_default().bold());

const AFTER_HELP: &str = "\x1b[1;32mSequence:\x1b[0m
  initialize -> gopls/handshake -> textDocument/didChange (uri \"dammyURI\", version 2)

  \x1b[1;36mStart the server first\x1b[0m, e.g.:
    gopls -listen=:37374
    lsp-probe --port 37374

  Single-dash flags are accepted too: lsp-probe -port 37374";

/// Long flags that may also be spelled with a single dash (`-port 37374`).
const LONG_FLAGS: &[&str] =
    &["port", "host", "root", "settle-ms", "poll-ms", "timeout", "verbose", "help", "version"];

#[derive(Parser, Debug)]
#[command(name = "lsp-probe")]
#[command(about = "Exercise a running language server over TCP: initialize, handshake, didChange")]
#[command(version)]
#[command(styles = STYLES)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// TCP port of the already-running language server
    #[arg(long, default_value_t = 37374)]
    pub port: u16,

    /// Host the language server listens on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Workspace root sent in `initialize` (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Pause between steps, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub settle_ms: u64,

    /// How often the background listener checks for cancellation, in milliseconds
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_ms: u64,

    /// Give up on a call after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse the process arguments, accepting Go-style single-dash long flags.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Rewrite `-port` / `-port=N` style arguments to their `--` form.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}
