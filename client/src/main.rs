use clap::Parser;
use client::cache::ClientCache;
use client::input::{InputDispatcher, KeyboardInput};
use client::network::Client;
use client::rendering::Renderer;
use log::{error, info, warn};
use macroquad::prelude::*;
use macroquad::window::Conf;
use shared::{Frame, DEFAULT_HOST, DEFAULT_PORT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Longest the window thread waits for a redraw signal per frame
const REDRAW_WAIT: Duration = Duration::from_millis(5);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT))]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "600")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "720")]
    height: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: 1-9 or click to move, 0 to chat, R to reset");

    // macroquad owns the main thread, the network runs on tokio's workers
    let runtime = tokio::runtime::Runtime::new()?;
    let cache = Arc::new(ClientCache::new());
    let client = runtime.block_on(Client::connect(args.server.as_str(), Arc::clone(&cache)))?;

    let (outbound, rx) = mpsc::unbounded_channel();
    runtime.spawn(async move {
        if let Err(e) = client.run(rx).await {
            error!("Connection ended with error: {}", e);
        }
    });

    let conf = Conf {
        window_title: "Tic-Tac-Toe".to_string(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, ui_loop(cache, outbound, args.width, args.height));

    runtime.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}

async fn ui_loop(
    cache: Arc<ClientCache>,
    outbound: mpsc::UnboundedSender<Frame>,
    width: usize,
    height: usize,
) {
    let dispatcher = InputDispatcher::new(Arc::clone(&cache));
    let mut input = KeyboardInput::new();
    let mut renderer = Renderer::new(width, height);
    let mut latest = cache.snapshot();

    loop {
        for event in input.poll(latest.chat_mode, renderer.layout()) {
            if let Some(frame) = dispatcher.handle(event) {
                if outbound.send(frame).is_err() {
                    warn!("Connection is closed, dropping input");
                }
            }
        }

        if let Some(snapshot) = cache.wait_for_redraw(REDRAW_WAIT) {
            latest = snapshot;
        }

        renderer.render(&latest, input.chat_buffer());
        next_frame().await;
    }
}
