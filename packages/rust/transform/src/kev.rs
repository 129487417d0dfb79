//! KEV record transformation: provenance stamping, record mapping, and
//! envelope aggregation.

use vulnfeed_feed::KevRecord;
use vulnfeed_shared::{
    Entity, Envelope, IngestState, KnownExploitedBlob, KnownExploitedEntry, Provenance, Result,
    VulnfeedError,
};

use crate::{dates, refs};

/// Build the batch provenance record from ingestion state.
///
/// The digest is trusted as supplied by the upstream fetch/verification
/// stage; no re-hashing happens here. Fails with a missing-provenance error
/// when the listing is absent or its digest/algorithm is empty, since no
/// entity may be emitted without provenance.
pub fn stamp_provenance(state: &IngestState) -> Result<Provenance> {
    let listing = state.listing.as_ref().ok_or_else(|| {
        VulnfeedError::missing_provenance("ingestion state has no source artifact listing")
    })?;

    if listing.digest.trim().is_empty() {
        return Err(VulnfeedError::missing_provenance(
            "source artifact digest is empty",
        ));
    }
    if listing.algorithm.trim().is_empty() {
        return Err(VulnfeedError::missing_provenance(
            "source artifact digest algorithm is empty",
        ));
    }

    Ok(Provenance {
        provider: state.provider.clone(),
        version: state.version,
        processor: state.processor.clone(),
        captured_at: state.timestamp,
        input_digest: format!("{}:{}", listing.algorithm, listing.digest),
    })
}

/// Map one raw advisory record into a normalized entity.
///
/// Dates are parsed (mandatory `date_added`, optional `due_date`), reference
/// URLs are merged from the explicit list and the required-action text, and
/// weakness codes are deduplicated. Scalar fields are copied verbatim. The
/// entry key is taken from the blob's own identifier, never supplied
/// independently.
pub fn transform_record(record: &KevRecord) -> Result<KnownExploitedEntry> {
    let date_added = dates::parse_date(&record.cve_id, &record.date_added)?;
    let due_date = dates::parse_optional_date(&record.cve_id, &record.due_date)?;
    let urls = refs::merge_urls(&record.urls, &record.required_action);

    let blob = KnownExploitedBlob {
        cve: record.cve_id.clone(),
        vendor_project: record.vendor_project.clone(),
        product: record.product.clone(),
        date_added,
        required_action: record.required_action.clone(),
        due_date,
        known_ransomware_campaign_use: record.known_ransomware_campaign_use.clone(),
        notes: record.notes.clone(),
        urls,
        cwes: dedup_codes(&record.cwes),
    };

    Ok(KnownExploitedEntry::from_blob(blob))
}

/// Aggregate the batch provenance and transformed entities into one
/// envelope. An empty entity list is valid: a snapshot with zero records
/// yields an envelope with no entities, not an error.
pub fn build_envelope(provenance: Provenance, entities: Vec<Entity>) -> Envelope {
    Envelope {
        provenance,
        entities,
    }
}

/// Collapse duplicate weakness codes, preserving first-seen order.
fn dedup_codes(codes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        if !out.contains(code) {
            out.push(code.clone());
        }
    }
    out
}
