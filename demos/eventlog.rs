//! Event-log demo
//!
//! Appends a random visitor entry to an in-memory backing node through
//! the block store once a second, keeps the identifiers as a local log
//! index, and prints the latest five visitors each tick.
//!
//! Run with: `cargo run --example eventlog`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use blockbridge::{block_cid, BlockStore, MemoryNode, Storage};
use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};

const CREATURES: [&str; 8] = ["🐙", "🐷", "🐬", "🐞", "🐈", "🙉", "🐸", "🐓"];

#[derive(Serialize, Deserialize)]
struct Visitor {
    avatar: String,
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let node = Arc::new(MemoryNode::new());
    let store = BlockStore::builder()
        .node(node)
        .pin(true)
        .timeout(Duration::from_secs(1))
        .open()?;

    // The store does not enumerate blocks, so the demo keeps its own
    // append-only index of identifiers.
    let mut log: Vec<String> = Vec::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        ticker.tick().await;

        let visitor = Visitor {
            avatar: CREATURES[rand::thread_rng().gen_range(0..CREATURES.len())].to_string(),
            user_id: rand::thread_rng().gen_range(100..1000),
        };
        let payload = serde_json::to_vec(&visitor)?;
        let id = block_cid(&payload).to_string();

        store.put(&id, Bytes::from(payload)).await?;
        log.push(id);

        let mut output = String::new();
        output.push_str("[Latest Visitors]\n");
        output.push_str("--------------------\n");
        output.push_str("ID  | Visitor\n");
        output.push_str("--------------------\n");
        for id in log.iter().rev().take(5) {
            if let Some(bytes) = store.get(id).await? {
                let visitor: Visitor = serde_json::from_slice(&bytes)?;
                output.push_str(&format!("{} | {}\n", visitor.user_id, visitor.avatar));
            }
        }
        println!("{output}");
    }
}
