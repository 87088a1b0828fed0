//! Timeout-bounded block store over a backing node
//!
//! Every `put`/`get` races the node request against the configured
//! timeout and against a per-operation cancellation handle. Handles live
//! in an instance-scoped set so `close` can revoke all in-flight
//! operations at once; a guard removes each handle when its operation
//! finishes, success or failure alike.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cid::Cid;
use futures_util::stream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::node::BlockNode;
use crate::store::{BlockStream, Storage};
use crate::{Error, Result};

/// Default per-call timeout applied to `put` and `get`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracked cancellation handles for in-flight operations
#[derive(Default)]
struct CancelSet {
    next_id: u64,
    handles: HashMap<u64, watch::Sender<bool>>,
}

/// Removes an operation's handle from the set when the operation
/// completes. Removal is mandatory: a stale handle would be revoked
/// incorrectly by a later `close`.
struct CancelGuard<'a> {
    set: &'a Mutex<CancelSet>,
    id: u64,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().handles.remove(&self.id);
    }
}

/// A content-addressed block store backed by a [`BlockNode`].
///
/// Cheap to share behind an `Arc`; concurrent operations on one handle
/// carry independent timeouts and cancellation handles and do not
/// disturb one another's deadlines.
pub struct BlockStore {
    node: Arc<dyn BlockNode>,
    pin: bool,
    timeout: Duration,
    cancels: Mutex<CancelSet>,
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore")
            .field("pin", &self.pin)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BlockStore`]; the backing node is the only required
/// field.
pub struct BlockStoreBuilder {
    node: Option<Arc<dyn BlockNode>>,
    pin: bool,
    timeout: Duration,
}

impl Default for BlockStoreBuilder {
    fn default() -> Self {
        BlockStoreBuilder {
            node: None,
            pin: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BlockStoreBuilder {
    /// Set the backing node
    pub fn node(mut self, node: Arc<dyn BlockNode>) -> Self {
        self.node = Some(node);
        self
    }

    /// Pin successfully-put blocks against the node's garbage collection
    pub fn pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    /// Per-call timeout for `put` and `get`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finish construction.
    ///
    /// Fails with [`Error::Config`] if no backing node was supplied.
    pub fn open(self) -> Result<BlockStore> {
        let node = self
            .node
            .ok_or_else(|| Error::Config("a backing node is required".into()))?;

        Ok(BlockStore {
            node,
            pin: self.pin,
            timeout: self.timeout,
            cancels: Mutex::new(CancelSet::default()),
        })
    }
}

impl BlockStore {
    /// Start building a store
    pub fn builder() -> BlockStoreBuilder {
        BlockStoreBuilder::default()
    }

    /// Number of operations currently in flight
    pub fn outstanding(&self) -> usize {
        self.cancels.lock().handles.len()
    }

    /// Register a cancellation handle for a starting operation
    fn register(&self) -> (CancelGuard<'_>, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let mut set = self.cancels.lock();
        let id = set.next_id;
        set.next_id = set.next_id.wrapping_add(1);
        set.handles.insert(id, tx);
        (
            CancelGuard {
                set: &self.cancels,
                id,
            },
            rx,
        )
    }

    /// Race a node request against the timeout and the operation's
    /// cancellation handle.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let (_guard, mut cancelled) = self.register();
        tokio::select! {
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(Error::Timeout { after: self.timeout }),
            },
            // Resolves on revocation, or if the store was dropped mid-close.
            _ = cancelled.changed() => Err(Error::Closed),
        }
    }
}

#[async_trait::async_trait]
impl Storage for BlockStore {
    async fn put(&self, id: &str, data: Bytes) -> Result<()> {
        let cid = Cid::try_from(id)?;
        let size = data.len();

        self.bounded(self.node.block_put(&cid, data)).await?;
        tracing::debug!(%cid, size, "stored block");

        if self.pin {
            if self.node.pin_is_pinned(&cid).await? {
                tracing::trace!(%cid, "already pinned, skipping");
            } else {
                let mut confirmations = self.node.pin_add(&cid).await?;
                while let Some(confirmed) = confirmations.next().await {
                    confirmed?;
                }
                tracing::debug!(%cid, "pinned block");
            }
        }

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Bytes>> {
        let cid = Cid::try_from(id)?;

        let block = self.bounded(self.node.block_get(&cid)).await?;
        match &block {
            Some(data) => tracing::debug!(%cid, size = data.len(), "fetched block"),
            None => tracing::trace!(%cid, "block not present"),
        }

        Ok(block)
    }

    async fn del(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn iterator(&self) -> BlockStream {
        stream::empty().boxed()
    }

    async fn merge(&self, _other: &dyn Storage) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let handles: Vec<watch::Sender<bool>> = {
            let mut set = self.cancels.lock();
            set.handles.drain().map(|(_, tx)| tx).collect()
        };

        if !handles.is_empty() {
            tracing::debug!(revoked = handles.len(), "revoking outstanding operations");
        }
        for tx in handles {
            // The receiver may already be gone; revocation is best-effort.
            let _ = tx.send(true);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MemoryNode;
    use crate::block_cid;

    #[test]
    fn test_builder_requires_node() {
        let err = BlockStore::builder().open().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let store = BlockStore::builder()
            .node(Arc::new(MemoryNode::new()))
            .open()
            .unwrap();

        assert!(!store.pin);
        assert_eq!(store.timeout, DEFAULT_TIMEOUT);
        assert_eq!(store.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_handle_removed_after_operation() {
        let store = BlockStore::builder()
            .node(Arc::new(MemoryNode::new()))
            .open()
            .unwrap();

        let data = Bytes::from_static(b"tracked");
        let id = block_cid(&data).to_string();

        store.put(&id, data).await.unwrap();
        assert_eq!(store.outstanding(), 0);

        store.get(&id).await.unwrap();
        assert_eq!(store.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_malformed_identifier_registers_no_handle() {
        let store = BlockStore::builder()
            .node(Arc::new(MemoryNode::new()))
            .open()
            .unwrap();

        // Parsing fails before any handle is registered.
        assert!(store.get("not-a-cid").await.is_err());
        assert_eq!(store.outstanding(), 0);
    }

    /// Node whose block operations never complete.
    struct PendingNode;

    #[async_trait::async_trait]
    impl BlockNode for PendingNode {
        async fn block_put(&self, _cid: &Cid, _data: Bytes) -> Result<()> {
            futures_util::future::pending().await
        }

        async fn block_get(&self, _cid: &Cid) -> Result<Option<Bytes>> {
            futures_util::future::pending().await
        }

        async fn pin_is_pinned(&self, _cid: &Cid) -> Result<bool> {
            Ok(false)
        }

        async fn pin_add(&self, _cid: &Cid) -> Result<crate::node::PinStream> {
            Ok(stream::empty().boxed())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_removed_after_timeout() {
        let store = BlockStore::builder()
            .node(Arc::new(PendingNode))
            .timeout(Duration::from_millis(1))
            .open()
            .unwrap();

        let data = Bytes::from_static(b"stuck");
        let id = block_cid(&data).to_string();

        let err = store.get(&id).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(store.outstanding(), 0);
    }
}
