//! quantastore diagnostic tool
//!
//! Drives an in-process store through a write/read/trim session and prints
//! the structure dump, so the chain layout under a given geometry can be
//! inspected from the command line.

use clap::Parser;
use quantastore::{Caller, Config, ControlCommand, ControlReply, OpenMode, Store, Whence};
use tracing_subscriber::{fmt, EnvFilter};

/// quantastore structure explorer
#[derive(Parser, Debug)]
#[command(name = "quantactl")]
#[command(about = "Exercise a quantastore device and dump its chain layout")]
#[command(version)]
struct Args {
    /// Quantum size in bytes
    #[arg(short, long, default_value = "4000")]
    quantum: usize,

    /// Slots per chain node
    #[arg(short = 's', long, default_value = "1000")]
    qset: usize,

    /// Number of devices in the store
    #[arg(short, long, default_value = "4")]
    devices: usize,

    /// Offset to write at
    #[arg(short, long, default_value = "0")]
    offset: u64,

    /// Number of bytes to write
    #[arg(short = 'n', long, default_value = "5000")]
    bytes: usize,
}

fn main() -> quantastore::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quantastore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("quantastore v{}", quantastore::VERSION);

    let store = Store::new(
        Config::builder()
            .quantum(args.quantum)
            .qset(args.qset)
            .nr_devices(args.devices)
            .build(),
    )?;

    // Confirm the geometry through the control plane, the way a remote
    // client would see it
    let caller = Caller::admin();
    if let ControlReply::Value(q) =
        store
            .control()
            .dispatch(&caller, ControlCommand::QueryQuantum, None, None)?
    {
        tracing::info!(quantum = q, "control plane reports");
    }

    // Fill: one-quantum-per-call discipline, reissuing until done
    let payload: Vec<u8> = (0..args.bytes).map(|i| (i % 251) as u8).collect();
    let mut handle = store.open(0, OpenMode::ReadWrite)?;
    handle.seek(args.offset as i64, Whence::Set)?;

    let mut written = 0;
    while written < payload.len() {
        let n = handle.write(&&payload[written..])?;
        tracing::debug!(n, written, "write call");
        written += n;
    }
    tracing::info!(written, size = store.device(0)?.size(), "fill complete");

    // Read everything back through the same handle
    handle.seek(args.offset as i64, Whence::Set)?;
    let mut read_back = vec![0u8; payload.len()];
    let mut read = 0;
    while read < read_back.len() {
        let n = handle.read(&mut &mut read_back[read..])?;
        if n == 0 {
            break; // hole or end-of-data
        }
        read += n;
    }
    tracing::info!(read, verified = (read_back[..read] == payload[..read]), "readback");

    println!("{}", store.dump());
    Ok(())
}
