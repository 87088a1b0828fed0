//! Database manifest creation
//!
//! A manifest records the facts needed to join a database: its name, its
//! store type, and the address of its access controller. It is
//! serialized to canonical JSON and stored as a raw block through the
//! backing node; the resulting identifier is the database's address
//! root. A hash-only mode computes the identifier without storing
//! anything.

use bytes::Bytes;
use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::node::BlockNode;
use crate::{block_cid, Result};

/// Facts needed to join a database
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Database name
    pub name: String,
    /// Store type (e.g. "eventlog")
    #[serde(rename = "type")]
    pub store_type: String,
    /// Path to the access controller entry
    #[serde(rename = "accessController")]
    pub access_controller: String,
}

impl Manifest {
    /// Build a manifest, expanding the access controller address into
    /// its canonical path form.
    pub fn new(
        name: impl Into<String>,
        store_type: impl Into<String>,
        access_controller_address: &str,
    ) -> Self {
        Manifest {
            name: name.into(),
            store_type: store_type.into(),
            access_controller: format!("/ipfs/{}", access_controller_address),
        }
    }
}

/// Compute the manifest's identifier without storing it
pub fn manifest_identifier(manifest: &Manifest) -> Result<Cid> {
    let json = serde_json::to_vec(manifest)?;
    Ok(block_cid(&json))
}

/// Serialize the manifest and store it as a block on `node`, returning
/// its identifier
pub async fn create_manifest(node: &dyn BlockNode, manifest: &Manifest) -> Result<Cid> {
    let json = serde_json::to_vec(manifest)?;
    let cid = block_cid(&json);
    node.block_put(&cid, Bytes::from(json)).await?;
    tracing::debug!(%cid, name = %manifest.name, "stored manifest");
    Ok(cid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MemoryNode;

    fn example() -> Manifest {
        Manifest::new("visitors", "eventlog", "bafyexamplecontroller")
    }

    #[test]
    fn test_access_controller_path() {
        let manifest = example();
        assert_eq!(manifest.access_controller, "/ipfs/bafyexamplecontroller");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(example()).unwrap();
        assert_eq!(json["name"], "visitors");
        assert_eq!(json["type"], "eventlog");
        assert_eq!(json["accessController"], "/ipfs/bafyexamplecontroller");
    }

    #[tokio::test]
    async fn test_hash_only_matches_stored() {
        let node = MemoryNode::new();
        let manifest = example();

        let hashed = manifest_identifier(&manifest).unwrap();
        let stored = create_manifest(&node, &manifest).await.unwrap();

        assert_eq!(hashed, stored);
        assert!(node.contains(&stored));
    }

    #[tokio::test]
    async fn test_stored_manifest_roundtrips() {
        let node = MemoryNode::new();
        let manifest = example();

        let cid = create_manifest(&node, &manifest).await.unwrap();
        let bytes = node.block_get(&cid).await.unwrap().unwrap();
        let restored: Manifest = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(restored, manifest);
    }
}
