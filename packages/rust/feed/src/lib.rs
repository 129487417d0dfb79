//! KEV feed snapshot reading.
//!
//! A snapshot is a local JSON file in one of two accepted forms:
//! - a bare array of advisory records, or
//! - the upstream catalog envelope
//!   (`{"title", "catalogVersion", "dateReleased", "count", "vulnerabilities": [...]}`).
//!
//! This crate also computes the snapshot's content digest, which the
//! transformation stage records as provenance. Feed retrieval over the
//! network is out of scope; snapshots arrive on disk.

mod records;

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use vulnfeed_shared::{ArtifactRef, Result, VulnfeedError};

pub use records::KevRecord;

use records::KevCatalog;

/// Parse snapshot content into raw records.
///
/// An empty record list is valid; malformed JSON is a parse error.
pub fn parse_snapshot(content: &str) -> Result<Vec<KevRecord>> {
    let trimmed = content.trim_start();

    if trimmed.starts_with('[') {
        let records: Vec<KevRecord> = serde_json::from_str(content)
            .map_err(|e| VulnfeedError::parse(format!("snapshot record array: {e}")))?;
        return Ok(records);
    }

    let catalog: KevCatalog = serde_json::from_str(content)
        .map_err(|e| VulnfeedError::parse(format!("snapshot catalog: {e}")))?;

    debug!(
        title = catalog.title.as_deref().unwrap_or("(untitled)"),
        catalog_version = catalog.catalog_version.as_deref().unwrap_or("-"),
        date_released = catalog.date_released.as_deref().unwrap_or("-"),
        "parsed catalog envelope"
    );

    if let Some(count) = catalog.count {
        if count != catalog.vulnerabilities.len() {
            return Err(VulnfeedError::validation(format!(
                "catalog count {} does not match {} records",
                count,
                catalog.vulnerabilities.len()
            )));
        }
    }

    Ok(catalog.vulnerabilities)
}

/// Read and parse a snapshot file from disk.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Vec<KevRecord>> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|e| VulnfeedError::io(path, e))?;

    let records = parse_snapshot(&content)?;
    info!(records = records.len(), "snapshot read");
    Ok(records)
}

/// Compute the SHA-256 content digest of a snapshot file.
///
/// The returned descriptor is what the provenance stamper consumes; the
/// stamper itself performs no hashing.
pub fn snapshot_digest(path: impl AsRef<Path>) -> Result<ArtifactRef> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| VulnfeedError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = format!("{:x}", hasher.finalize());

    Ok(ArtifactRef {
        path: path.display().to_string(),
        digest,
        algorithm: "sha256".into(),
    })
}
