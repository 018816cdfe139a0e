use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod add;
pub mod blast;
pub mod echo;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a server until interrupted.
    Serve(ServeArgs),
    /// Call the ADD operation once.
    Add(AddArgs),
    /// Call the ECHO operation once.
    Echo(EchoArgs),
    /// Fire N concurrent ECHO calls and report the tally.
    Blast(BlastArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Add(args) => add::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Blast(args) => blast::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Tcp,
    Udp,
}

impl TransportKind {
    pub fn name(self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind, e.g. 0.0.0.0:5000.
    pub addr: SocketAddr,
    /// Transport to serve.
    #[arg(long, short = 't', value_enum, default_value_t = TransportKind::Tcp)]
    pub transport: TransportKind,
    /// Simulated per-request processing time (e.g. 3s, 250ms).
    #[arg(long, default_value = "0s")]
    pub delay: String,
    /// Maximum request payload size in bytes.
    #[arg(long, default_value_t = wirecall_frame::DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
    /// Cap on ECHO reply size; longer inputs are truncated.
    #[arg(long)]
    pub echo_cap: Option<usize>,
    /// Shutdown-flag polling period (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub poll_interval: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Server address, e.g. 127.0.0.1:5000.
    pub addr: SocketAddr,
    /// First operand.
    pub a: i32,
    /// Second operand.
    pub b: i32,
    /// Transport to call over.
    #[arg(long, short = 't', value_enum, default_value_t = TransportKind::Tcp)]
    pub transport: TransportKind,
    /// Response deadline (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Server address, e.g. 127.0.0.1:5000.
    pub addr: SocketAddr,
    /// Payload string.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Transport to call over.
    #[arg(long, short = 't', value_enum, default_value_t = TransportKind::Tcp)]
    pub transport: TransportKind,
    /// Response deadline (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct BlastArgs {
    /// Server address, e.g. 127.0.0.1:5000.
    pub addr: SocketAddr,
    /// Number of concurrent calls.
    pub count: usize,
    /// Base message; each call sends MESSAGE-<idx>.
    #[arg(long, default_value = "PING")]
    pub message: String,
    /// Transport to call over.
    #[arg(long, short = 't', value_enum, default_value_t = TransportKind::Tcp)]
    pub transport: TransportKind,
    /// Per-call response deadline (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `3s` / `150ms` / bare-seconds durations. Zero is allowed; callers
/// that need a positive value check themselves.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

/// Parse a duration that must be positive (deadlines).
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let duration = parse_duration(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }
    Ok(duration)
}
