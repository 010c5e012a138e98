use clap::Parser;
use log::{error, info};
use server::network::Server;
use shared::DEFAULT_PORT;
use tokio::sync::watch;
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Broadcast rate (updates per second)
    #[clap(short, long, default_value_t = 60)]
    tick_rate: u32,
    /// Maximum number of connected clients
    #[clap(short, long, default_value_t = 32)]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1)));

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, tick_duration, args.max_clients).await?;
    info!(
        "Broadcasting at {}Hz to at most {} clients",
        args.tick_rate.max(1),
        args.max_clients
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(server.run(shutdown_rx));

    tokio::select! {
        result = &mut server_handle => {
            match result {
                Ok(Err(e)) => error!("Server stopped: {}", e),
                Err(e) => error!("Server task panicked: {}", e),
                Ok(Ok(())) => {}
            }
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    let _ = shutdown_tx.send(true);
    server_handle.await??;

    Ok(())
}
