use std::fs;
use std::time::Instant;

use wirecall_rpc::client::{self, CallOptions};

use crate::cmd::{parse_timeout, EchoArgs, TransportKind};
use crate::exit::{rpc_error, CliResult, SUCCESS};
use crate::output::{payload_preview, print_call, CallOutput, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let options = CallOptions {
        timeout: Some(parse_timeout(&args.timeout)?),
        ..CallOptions::default()
    };
    let payload = resolve_payload(&args)?;

    let start = Instant::now();
    let reply = match args.transport {
        TransportKind::Tcp => client::echo_with_options(args.addr, &payload, &options),
        TransportKind::Udp => client::udp::echo_with_options(args.addr, &payload, &options),
    }
    .map_err(|err| rpc_error("echo call failed", err))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let out = CallOutput::new(
        "ECHO",
        args.transport.name(),
        args.addr.to_string(),
        payload_preview(&reply),
        reply.len(),
        elapsed_ms,
    );
    print_call(&out, &reply, format);

    Ok(SUCCESS)
}

fn resolve_payload(args: &EchoArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}
