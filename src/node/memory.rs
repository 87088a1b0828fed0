//! In-memory backing node
//!
//! Keeps blocks and pins in process memory. Used by the test suite and
//! the event-log demo; also the reference for what a real node binding
//! must provide.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use futures_util::stream;
use parking_lot::RwLock;

use super::{BlockNode, PinStream};
use crate::Result;

/// A [`BlockNode`] that stores everything in process memory.
#[derive(Default)]
pub struct MemoryNode {
    blocks: RwLock<HashMap<Cid, Bytes>>,
    pins: RwLock<HashSet<Cid>>,
    pin_adds: AtomicU64,
}

impl MemoryNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently held
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Whether the node holds no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Whether the node holds a block for `cid`
    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.read().contains_key(cid)
    }

    /// Whether `cid` is in the pin set
    pub fn pinned(&self, cid: &Cid) -> bool {
        self.pins.read().contains(cid)
    }

    /// How many times `pin_add` has been invoked on this node
    pub fn pin_add_calls(&self) -> u64 {
        self.pin_adds.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BlockNode for MemoryNode {
    async fn block_put(&self, cid: &Cid, data: Bytes) -> Result<()> {
        self.blocks.write().insert(*cid, data);
        Ok(())
    }

    async fn block_get(&self, cid: &Cid) -> Result<Option<Bytes>> {
        Ok(self.blocks.read().get(cid).cloned())
    }

    async fn pin_is_pinned(&self, cid: &Cid) -> Result<bool> {
        Ok(self.pins.read().contains(cid))
    }

    async fn pin_add(&self, cid: &Cid) -> Result<PinStream> {
        self.pin_adds.fetch_add(1, Ordering::Relaxed);
        self.pins.write().insert(*cid);
        let confirmed = *cid;
        Ok(Box::pin(stream::iter(std::iter::once(Ok(confirmed)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_cid;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_put_then_get() {
        let node = MemoryNode::new();
        let data = Bytes::from_static(b"payload");
        let cid = block_cid(&data);

        node.block_put(&cid, data.clone()).await.unwrap();
        assert_eq!(node.block_get(&cid).await.unwrap(), Some(data));
        assert_eq!(node.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let node = MemoryNode::new();
        let cid = block_cid(b"never stored");
        assert_eq!(node.block_get(&cid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pin_add_confirms_and_counts() {
        let node = MemoryNode::new();
        let cid = block_cid(b"pin me");

        assert!(!node.pin_is_pinned(&cid).await.unwrap());

        let mut confirmations = node.pin_add(&cid).await.unwrap();
        assert_eq!(confirmations.next().await.unwrap().unwrap(), cid);
        assert!(confirmations.next().await.is_none());

        assert!(node.pin_is_pinned(&cid).await.unwrap());
        assert_eq!(node.pin_add_calls(), 1);
    }
}
