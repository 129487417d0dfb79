//! Record transformation stage: raw feed records + ingestion state in,
//! provenance-stamped envelopes out.
//!
//! The stage is synchronous and pure apart from logging: each record is
//! transformed independently with no shared mutable state, and the output
//! aliases nothing from the input. Batch-level failure policy (skip the
//! record vs. abort the batch) belongs to the caller and is passed in as
//! [`ErrorPolicy`].

pub mod dates;
pub mod refs;

mod kev;

use std::str::FromStr;

use tracing::{info, instrument, warn};

use vulnfeed_feed::KevRecord;
use vulnfeed_shared::{Entity, Envelope, IngestState, Result, VulnfeedError};

pub use kev::{build_envelope, stamp_provenance, transform_record};

// ---------------------------------------------------------------------------
// Error policy
// ---------------------------------------------------------------------------

/// What to do when a single record fails to transform.
///
/// Provenance failures are always fatal to the batch regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Drop the malformed record, log a warning, keep going.
    #[default]
    Skip,
    /// Fail the whole batch on the first malformed record.
    Abort,
}

impl FromStr for ErrorPolicy {
    type Err = VulnfeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(VulnfeedError::config(format!(
                "unknown error policy {other:?} (expected \"skip\" or \"abort\")"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Output of one batch transformation.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Envelopes ready for the persistence dispatcher. One per batch today.
    pub envelopes: Vec<Envelope>,
    /// Identifiers of records dropped under [`ErrorPolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Transform a whole snapshot batch.
///
/// Stamps provenance once (fatal if the ingestion state lacks a usable
/// digest), maps each record under the given policy, and aggregates the
/// survivors into an envelope. Record order is preserved.
#[instrument(skip_all, fields(provider = %state.provider, records = records.len()))]
pub fn transform_snapshot(
    records: &[KevRecord],
    state: &IngestState,
    policy: ErrorPolicy,
) -> Result<TransformResult> {
    let provenance = kev::stamp_provenance(state)?;

    let mut entities: Vec<Entity> = Vec::with_capacity(records.len());
    let mut skipped: Vec<String> = Vec::new();

    for record in records {
        match kev::transform_record(record) {
            Ok(entry) => entities.push(Entity::KnownExploited(entry)),
            Err(e) => match policy {
                ErrorPolicy::Abort => return Err(e),
                ErrorPolicy::Skip => {
                    warn!(record = %record.cve_id, error = %e, "skipping malformed record");
                    skipped.push(record.cve_id.clone());
                }
            },
        }
    }

    info!(
        entities = entities.len(),
        skipped = skipped.len(),
        "batch transformed"
    );

    Ok(TransformResult {
        envelopes: vec![kev::build_envelope(provenance, entities)],
        skipped,
    })
}
