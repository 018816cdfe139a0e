use std::time::Instant;

use wirecall_rpc::client::{self, CallOptions};

use crate::cmd::{parse_timeout, AddArgs, TransportKind};
use crate::exit::{rpc_error, CliResult, SUCCESS};
use crate::output::{print_call, CallOutput, OutputFormat};

pub fn run(args: AddArgs, format: OutputFormat) -> CliResult<i32> {
    let options = CallOptions {
        timeout: Some(parse_timeout(&args.timeout)?),
        ..CallOptions::default()
    };

    let start = Instant::now();
    let sum = match args.transport {
        TransportKind::Tcp => client::add_with_options(args.addr, args.a, args.b, &options),
        TransportKind::Udp => client::udp::add_with_options(args.addr, args.a, args.b, &options),
    }
    .map_err(|err| rpc_error("add call failed", err))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let out = CallOutput::new(
        "ADD",
        args.transport.name(),
        args.addr.to_string(),
        sum.to_string(),
        4,
        elapsed_ms,
    );
    print_call(&out, &sum.to_be_bytes(), format);

    Ok(SUCCESS)
}
