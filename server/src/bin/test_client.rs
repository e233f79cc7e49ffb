//! Console client for poking at a running server by hand
//!
//! Prints every frame the server sends and forwards each line typed on stdin
//! as a frame, e.g. `MOVE:1,1,X`, `CHAT:hello` or `RESET`.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use shared::{Frame, FrameCodec, DEFAULT_HOST, DEFAULT_PORT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};

#[derive(Parser, Debug)]
#[command(author, version, about = "Line-based test client", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT))]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    println!("Connected to {} from {}", stream.peer_addr()?, stream.local_addr()?);

    let (reader, writer) = stream.into_split();
    let mut incoming = FramedRead::new(reader, FrameCodec::new());
    let mut outgoing = FramedWrite::new(writer, FrameCodec::new());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = incoming.next() => {
                match line {
                    Some(Ok(line)) => match line.parse::<Frame>() {
                        Ok(frame) => println!("<- {:<20} {:?}", line, frame),
                        Err(e) => println!("<- {:<20} (unparsed: {})", line, e),
                    },
                    Some(Err(e)) => {
                        println!("Connection error: {}", e);
                        break;
                    }
                    None => {
                        println!("Server closed the connection");
                        break;
                    }
                }
            },

            typed = stdin.next_line() => {
                let Some(typed) = typed? else {
                    break;
                };
                let typed = typed.trim();
                if typed.is_empty() {
                    continue;
                }

                match typed.parse::<Frame>() {
                    Ok(frame) => {
                        outgoing.send(frame).await?;
                        println!("-> {}", typed);
                    }
                    Err(e) => println!("Not sent: {}", e),
                }
            },
        }
    }

    Ok(())
}
