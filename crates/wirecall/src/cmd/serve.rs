use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wirecall_frame::FrameConfig;
use wirecall_rpc::{Dispatcher, DispatcherConfig, RpcServer, ServerConfig, UdpServer};

use crate::cmd::{parse_duration, ServeArgs, TransportKind};
use crate::exit::{rpc_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let work_delay = parse_duration(&args.delay)?;
    let poll_interval = parse_duration(&args.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(CliError::new(USAGE, "poll interval must be greater than zero"));
    }

    let dispatcher = Dispatcher::new(DispatcherConfig {
        work_delay,
        echo_reply_cap: args.echo_cap.unwrap_or(args.max_payload),
    });
    let config = ServerConfig {
        frame: FrameConfig {
            max_payload: args.max_payload,
        },
        poll_interval,
    };

    match args.transport {
        TransportKind::Tcp => {
            let server = RpcServer::bind_with_config(args.addr, dispatcher, config)
                .map_err(|err| rpc_error("bind failed", err))?;
            install_ctrlc_handler(server.shutdown_handle())?;
            server.serve().map_err(|err| rpc_error("serve failed", err))?;
        }
        TransportKind::Udp => {
            let server = UdpServer::bind_with_config(args.addr, dispatcher, config)
                .map_err(|err| rpc_error("bind failed", err))?;
            install_ctrlc_handler(server.shutdown_handle())?;
            server.serve().map_err(|err| rpc_error("serve failed", err))?;
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
