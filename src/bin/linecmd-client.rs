//! linecmd-client - talks to a linecmd server from the terminal.
//!
//! Sends each `--command` (or, without any, each line of stdin) to the
//! server, then closes the sending side and prints everything the server
//! writes until it closes the connection.
//!
//! ```text
//! $ linecmd-client -c ping -c exit
//! WELCOME
//! Ignoring command 'ping'.
//! Thank You Very Much.
//! Bye.
//! ```

use anyhow::Context;
use clap::Parser;
use linecmd::{DEFAULT_HOST, DEFAULT_PORT};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linecmd-client")]
#[command(version)]
#[command(about = "Send newline-delimited commands to a linecmd server", long_about = None)]
struct Args {
    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Command to send (repeatable); stdin is used when none is given
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("failed to connect to {address}"))?;
    debug!(%address, "Connected");

    let (mut reader, mut writer) = stream.into_split();

    let printer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        let received = io::copy(&mut reader, &mut stdout).await?;
        stdout.flush().await?;
        Ok::<u64, io::Error>(received)
    });

    // The server may already have hung up after `exit` or `stop`
    if let Err(e) = send_commands(&mut writer, &args.commands).await {
        warn!(error = %e, "Stopped sending commands");
    }
    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "Shutdown of the sending side failed");
    }

    let received = printer.await.context("output task panicked")??;
    debug!(bytes = received, "Server closed the connection");
    Ok(())
}

async fn send_commands(writer: &mut OwnedWriteHalf, commands: &[String]) -> io::Result<()> {
    if commands.is_empty() {
        let mut lines = BufReader::new(io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            send_line(writer, &line).await?;
        }
    } else {
        for command in commands {
            send_line(writer, command).await?;
        }
    }
    Ok(())
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    debug!(command = line, "Sent");
    Ok(())
}
