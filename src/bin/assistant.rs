use clap::Parser;
use tokio::sync::mpsc;

use chess_assistant::config::AssistantArgs;
use chess_assistant::observer::{read_keys, watch_page, KEY_HELP};
use chess_assistant::{Assistant, Observer, OverlayFile, RelayClient, SnapshotFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = AssistantArgs::parse();
    let http = reqwest::Client::builder().build()?;

    let snapshot = SnapshotFile::new(&args.snapshot);
    let relay = RelayClient::new(http, &args.relay_url);
    let overlay = OverlayFile::new(&args.overlay);
    let observer = Observer::new(Assistant::new(snapshot.clone(), relay, overlay), args.settle_delay());

    log::info!("Reading board from {}", snapshot.path().display());
    log::info!("Writing overlay to {}", args.overlay.display());
    log::info!("Relay at {}", args.relay_url);
    log::info!("Chess assistant loaded with the following keyboard shortcuts:");
    for line in KEY_HELP {
        log::info!("{}", line);
    }

    let (tx, rx) = mpsc::channel(64);
    let watcher = tokio::spawn(watch_page(snapshot, args.poll_interval(), tx.clone()));
    read_keys(tx);

    observer.assistant().reinitialize()?;
    observer.run(rx).await;

    watcher.abort();
    Ok(())
}
