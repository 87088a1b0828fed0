//! # blockbridge
//!
//! A content-addressed block storage adapter.
//!
//! blockbridge puts a uniform, timeout-bounded facade over a backing
//! content-addressable node: immutable byte blocks go in and come out
//! under their content identifier (CID), optionally pinned against the
//! node's garbage collection. The node itself is reached through the
//! narrow [`BlockNode`] capability trait, so a remote daemon binding,
//! a local disk store, or the bundled [`MemoryNode`] can all back the
//! same [`BlockStore`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blockbridge::{block_cid, BlockStore, MemoryNode, Storage};
//!
//! let node = Arc::new(MemoryNode::new());
//! let store = BlockStore::builder().node(node).pin(true).open()?;
//!
//! let data = b"hello".to_vec();
//! let id = block_cid(&data).to_string();
//! store.put(&id, data.into()).await?;
//! let block = store.get(&id).await?;
//! ```

pub mod manifest;
pub mod node;
pub mod store;

mod error;

pub use error::{Error, Result};
pub use manifest::Manifest;
pub use node::{BlockNode, MemoryNode, PinStream};
pub use store::{BlockStore, BlockStoreBuilder, BlockStream, Storage, DEFAULT_TIMEOUT};

use multihash_codetable::{Code, MultihashDigest};

/// Multicodec code for raw binary block payloads
pub const RAW_CODEC: u64 = 0x55;

/// Derive the canonical identifier for a raw block payload.
///
/// Deterministic: identical bytes always produce the identical CID
/// (CIDv1, raw codec, SHA2-256).
pub fn block_cid(data: &[u8]) -> cid::Cid {
    cid::Cid::new_v1(RAW_CODEC, Code::Sha2_256.digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_cid_deterministic() {
        let a = block_cid(b"hello");
        let b = block_cid(b"hello");
        let c = block_cid(b"world");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_block_cid_string_roundtrip() {
        let cid = block_cid(b"some block");
        let parsed = cid::Cid::try_from(cid.to_string().as_str()).unwrap();
        assert_eq!(cid, parsed);
    }
}
