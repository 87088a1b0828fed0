//! Block storage adapter
//!
//! This module implements the uniform storage contract over a backing
//! content-addressable node: [`Storage`] names the seven operations,
//! [`BlockStore`] implements them with per-call timeouts and pin
//! management.

mod block_store;

pub use block_store::{BlockStore, BlockStoreBuilder, DEFAULT_TIMEOUT};

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use futures_util::stream::BoxStream;

/// Lazy sequence of stored blocks yielded by [`Storage::iterator`]
pub type BlockStream = BoxStream<'static, Result<(Cid, Bytes)>>;

/// Uniform contract for a block storage backend.
///
/// Implementations address immutable byte blocks by the canonical string
/// encoding of their content identifier. `del`, `merge` and `clear` are
/// reserved extension points with a defined no-op contract; a future
/// version may give them real semantics.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `id`.
    ///
    /// Fails with [`Error::InvalidCid`](crate::Error::InvalidCid) before
    /// any node traffic if `id` is malformed.
    async fn put(&self, id: &str, data: Bytes) -> Result<()>;

    /// Fetch the block stored under `id`.
    ///
    /// Returns `Ok(None)` when the node does not have the block; absence
    /// is a normal outcome, distinct from an I/O failure.
    async fn get(&self, id: &str) -> Result<Option<Bytes>>;

    /// Delete the block stored under `id`.
    ///
    /// Reserved: currently a no-op that always succeeds, including for
    /// identifiers that were never stored.
    async fn del(&self, id: &str) -> Result<()>;

    /// Iterate over stored blocks.
    ///
    /// Finite and restartable; each call yields a fresh sequence.
    /// Currently always empty (no enumeration against the backing node).
    fn iterator(&self) -> BlockStream;

    /// Reconcile with another store. Reserved: currently a no-op.
    async fn merge(&self, other: &dyn Storage) -> Result<()>;

    /// Remove all blocks. Reserved: currently a no-op.
    async fn clear(&self) -> Result<()>;

    /// Shut the store down, cancelling every in-flight operation.
    ///
    /// Idempotent and infallible; closing with nothing outstanding is a
    /// safe no-op.
    async fn close(&self) -> Result<()>;
}
