//! Canonical domain types for normalized vulnerability data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Metadata identifying which ingestion run and source artifact produced a
/// set of entities. Created once per batch and shared by every entity in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Data source name (e.g., `kev`).
    pub provider: String,
    /// Source version as published by the upstream processor.
    pub version: u32,
    /// Identifier of the agent that produced the snapshot (e.g., `vulnfeed@0.1.0`).
    pub processor: String,
    /// When the snapshot was captured, UTC.
    pub captured_at: DateTime<Utc>,
    /// Content digest of the source artifact, formatted `<algorithm>:<hex>`.
    pub input_digest: String,
}

// ---------------------------------------------------------------------------
// Known Exploited Vulnerability entity
// ---------------------------------------------------------------------------

/// Full detail record for one known-exploited-vulnerability advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownExploitedBlob {
    /// Advisory identifier (CVE-style string).
    pub cve: String,
    /// Vendor or project name.
    pub vendor_project: String,
    /// Affected product name.
    pub product: String,
    /// Date the advisory was added to the feed, UTC midnight.
    pub date_added: DateTime<Utc>,
    /// Required remediation action, verbatim from the feed (may contain
    /// bracket-embedded URLs; never rewritten).
    pub required_action: String,
    /// Remediation due date, absent when the source field is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Free-form ransomware-campaign-use status (e.g., `known`, `unknown`).
    pub known_ransomware_campaign_use: String,
    /// Free-text notes.
    pub notes: String,
    /// Reference URLs: explicit feed references first, then URLs extracted
    /// from the required-action text, deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    /// Weakness classification codes (CWE), deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwes: Vec<String>,
}

/// Key + detail pair for one advisory. The key always equals the blob's own
/// `cve` field: it is never supplied independently. The field is private and
/// every construction path, including deserialization, goes through
/// [`KnownExploitedEntry::from_blob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnownExploitedEntry {
    cve: String,
    /// The full detail record.
    pub blob: KnownExploitedBlob,
}

impl KnownExploitedEntry {
    /// Build an entry whose key is taken from the blob's own identifier.
    pub fn from_blob(blob: KnownExploitedBlob) -> Self {
        Self {
            cve: blob.cve.clone(),
            blob,
        }
    }

    /// The entry key. Always equal to `blob.cve`.
    pub fn cve(&self) -> &str {
        &self.cve
    }
}

impl<'de> Deserialize<'de> for KnownExploitedEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // The wire form carries a redundant `cve` key field; accept it only
        // when it agrees with the blob, and rebuild the entry from the blob
        // so the key/blob invariant survives deserialization.
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            cve: Option<String>,
            blob: KnownExploitedBlob,
        }

        let raw = Raw::deserialize(deserializer)?;
        if let Some(cve) = raw.cve {
            if cve != raw.blob.cve {
                return Err(serde::de::Error::custom(format!(
                    "entry key {cve:?} does not match blob identifier {:?}",
                    raw.blob.cve
                )));
            }
        }
        Ok(Self::from_blob(raw.blob))
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A normalized entity, tagged by kind. The store dispatcher matches on the
/// variant to route each entity to its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A known-exploited-vulnerability advisory.
    KnownExploited(KnownExploitedEntry),
}

/// Output of one transformation batch: the batch provenance plus every
/// successfully transformed entity, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Provenance shared by all entities in this envelope.
    pub provenance: Provenance,
    /// Transformed entities. May be empty for an empty feed snapshot.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

// ---------------------------------------------------------------------------
// Ingestion state
// ---------------------------------------------------------------------------

/// Descriptor of the source artifact a snapshot was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Path of the snapshot file.
    pub path: String,
    /// Hex content digest, as computed by the upstream fetch/verify stage.
    pub digest: String,
    /// Digest algorithm name (e.g., `sha256`).
    pub algorithm: String,
}

/// Per-run ingestion state handed to the transformation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestState {
    /// Data source name.
    pub provider: String,
    /// Source version.
    pub version: u32,
    /// Processing agent identifier.
    pub processor: String,
    /// Capture timestamp, UTC.
    pub timestamp: DateTime<Utc>,
    /// Source artifact descriptor. Required for provenance stamping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<ArtifactRef>,
}
