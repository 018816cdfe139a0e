//! Minimal round trip — starts a server on an ephemeral port and makes
//! one ADD and one ECHO call against it.
//!
//! Run with:
//!   cargo run --example roundtrip

use std::sync::atomic::Ordering;

use wirecall_rpc::{client, Dispatcher, RpcServer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = RpcServer::bind("127.0.0.1:0".parse()?, Dispatcher::with_defaults())?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();

    let loop_thread = std::thread::spawn(move || server.serve());
    eprintln!("serving on {addr}");

    let sum = client::add(addr, 7, 35)?;
    println!("add(7, 35) = {sum}");

    let reply = client::echo(addr, b"ping")?;
    println!("echo(\"ping\") = {:?} ({} bytes)", reply, reply.len());

    shutdown.store(true, Ordering::SeqCst);
    loop_thread.join().expect("server thread should finish")?;
    Ok(())
}
