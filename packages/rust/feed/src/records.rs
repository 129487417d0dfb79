//! Raw feed record types.
//!
//! Everything here is string-typed exactly as published by the feed; no
//! normalization happens at this layer. Date parsing, URL merging, and
//! deduplication belong to the transformation stage.

use serde::Deserialize;

/// One raw advisory record from a KEV feed snapshot, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KevRecord {
    /// Advisory identifier (CVE-style string).
    #[serde(rename = "cveID")]
    pub cve_id: String,
    /// Vendor or project name.
    pub vendor_project: String,
    /// Affected product name.
    pub product: String,
    /// Date the advisory was added, as published (`YYYY-MM-DD`).
    pub date_added: String,
    /// Required remediation action text. May embed URLs in square brackets.
    pub required_action: String,
    /// Remediation due date, as published. Empty when not set.
    #[serde(default)]
    pub due_date: String,
    /// Ransomware-campaign-use status string.
    #[serde(default)]
    pub known_ransomware_campaign_use: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
    /// Explicit reference URLs, in feed order.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Weakness classification codes, in feed order (may contain duplicates).
    #[serde(default)]
    pub cwes: Vec<String>,
}

/// The upstream catalog envelope wrapping a list of records.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KevCatalog {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub catalog_version: Option<String>,
    #[serde(default)]
    pub date_released: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    pub vulnerabilities: Vec<KevRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_from_feed_keys() {
        let json = r#"{
            "cveID": "CVE-2024-1234",
            "vendorProject": "Acme",
            "product": "Widget",
            "dateAdded": "2024-03-01",
            "requiredAction": "Apply updates per vendor instructions.",
            "dueDate": "2024-03-22",
            "knownRansomwareCampaignUse": "known",
            "notes": "",
            "urls": ["https://nvd.nist.gov/vuln/detail/CVE-2024-1234"],
            "cwes": ["CWE-79"]
        }"#;

        let record: KevRecord = serde_json::from_str(json).expect("deserialize record");
        assert_eq!(record.cve_id, "CVE-2024-1234");
        assert_eq!(record.vendor_project, "Acme");
        assert_eq!(record.date_added, "2024-03-01");
        assert_eq!(record.urls.len(), 1);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{
            "cveID": "CVE-2024-1234",
            "vendorProject": "Acme",
            "product": "Widget",
            "dateAdded": "2024-03-01",
            "requiredAction": "Apply updates."
        }"#;

        let record: KevRecord = serde_json::from_str(json).expect("deserialize record");
        assert!(record.due_date.is_empty());
        assert!(record.notes.is_empty());
        assert!(record.urls.is_empty());
        assert!(record.cwes.is_empty());
    }

    #[test]
    fn unknown_fields_ignored() {
        let json = r#"{
            "cveID": "CVE-2024-1234",
            "vendorProject": "Acme",
            "product": "Widget",
            "dateAdded": "2024-03-01",
            "requiredAction": "Apply updates.",
            "vulnerabilityName": "Acme Widget Injection",
            "shortDescription": "Not carried into the normalized blob."
        }"#;

        let record: KevRecord = serde_json::from_str(json).expect("deserialize record");
        assert_eq!(record.cve_id, "CVE-2024-1234");
    }
}
