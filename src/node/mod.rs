//! Backing node capability
//!
//! All persistence is delegated to a content-addressable node reached
//! through the narrow [`BlockNode`] trait: raw block put/get plus pin
//! bookkeeping. Anything that satisfies it can back a
//! [`BlockStore`](crate::BlockStore).

mod memory;

pub use memory::MemoryNode;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use futures_util::stream::BoxStream;

/// Confirmation stream returned by [`BlockNode::pin_add`].
///
/// Nodes may confirm a pin in several steps (a recursive pin yields one
/// item per retained block). Callers drain the stream to completion
/// before treating the pin as durable.
pub type PinStream = BoxStream<'static, Result<Cid>>;

/// Narrow capability interface onto the backing content-addressable node.
///
/// The node exclusively owns persisted block bytes and the pin set; the
/// adapter holds no cached copies. Node-level failures are reported as
/// [`Error::Backing`](crate::Error::Backing) and propagated verbatim.
#[async_trait]
pub trait BlockNode: Send + Sync {
    /// Persist `data` as the raw block addressed by `cid`.
    async fn block_put(&self, cid: &Cid, data: Bytes) -> Result<()>;

    /// Fetch the block addressed by `cid`, or `None` if the node does
    /// not have it. Absence is an ordinary outcome, not a failure.
    async fn block_get(&self, cid: &Cid) -> Result<Option<Bytes>>;

    /// Whether `cid` is already in the node's pin set.
    async fn pin_is_pinned(&self, cid: &Cid) -> Result<bool>;

    /// Add `cid` to the pin set, returning the confirmation stream.
    async fn pin_add(&self, cid: &Cid) -> Result<PinStream>;
}
