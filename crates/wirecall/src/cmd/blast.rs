use std::net::SocketAddr;
use std::time::Instant;

use tracing::warn;
use wirecall_rpc::client::{self, CallOptions};

use crate::cmd::{parse_timeout, BlastArgs, TransportKind};
use crate::exit::{CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{now_unix_seconds, print_blast, BlastOutput, OutputFormat};

pub fn run(args: BlastArgs, format: OutputFormat) -> CliResult<i32> {
    if args.count == 0 {
        return Err(CliError::new(USAGE, "count must be greater than zero"));
    }
    let options = CallOptions {
        timeout: Some(parse_timeout(&args.timeout)?),
        ..CallOptions::default()
    };

    let start = Instant::now();
    let workers: Vec<_> = (0..args.count)
        .map(|idx| {
            let addr = args.addr;
            let transport = args.transport;
            let message = format!("{}-{idx}", args.message);
            let options = options.clone();
            std::thread::spawn(move || one_echo(addr, transport, &message, &options))
        })
        .collect();

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => succeeded += 1,
            Ok(Err(err)) => {
                warn!(error = %err, "call failed");
                failed += 1;
            }
            Err(_) => failed += 1,
        }
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let out = BlastOutput {
        transport: args.transport.name(),
        addr: args.addr.to_string(),
        total: args.count,
        succeeded,
        failed,
        elapsed_ms,
        timestamp: now_unix_seconds(),
    };
    print_blast(&out, format);

    Ok(if failed == 0 { SUCCESS } else { FAILURE })
}

/// One tagged round trip; the reply must match what was sent.
fn one_echo(
    addr: SocketAddr,
    transport: TransportKind,
    message: &str,
    options: &CallOptions,
) -> Result<(), String> {
    let reply = match transport {
        TransportKind::Tcp => client::echo_with_options(addr, message.as_bytes(), options),
        TransportKind::Udp => client::udp::echo_with_options(addr, message.as_bytes(), options),
    }
    .map_err(|err| err.to_string())?;

    if reply.as_ref() != message.as_bytes() {
        return Err(format!("reply does not match request for {message}"));
    }
    Ok(())
}
