//! libSQL persistence layer for normalized vulnerability data.
//!
//! The [`Store`] struct wraps an embedded libSQL database holding provenance
//! rows, known-exploited entities, and ingestion-run history. The entry point
//! for the transformation pipeline is [`Store::dispatch_envelope`], which
//! routes each entity to its table by matching on the entity's variant tag.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use uuid::Uuid;

use vulnfeed_shared::{
    Entity, Envelope, KnownExploitedEntry, Provenance, Result, VulnfeedError,
};

/// Map a libSQL error into the workspace error type.
fn db_err(e: libsql::Error) -> VulnfeedError {
    VulnfeedError::Storage(e.to_string())
}

/// Primary storage handle wrapping a libSQL database.
pub struct Store {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Store {
    /// Open or create the database at `path` and bring its schema up to the
    /// latest version.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VulnfeedError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path).build().await.map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        let store = Self { db, conn };
        store.migrate().await?;
        Ok(store)
    }

    /// Apply pending schema migrations, oldest first.
    async fn migrate(&self) -> Result<()> {
        let applied = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version <= applied {
                continue;
            }
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            self.conn.execute_batch(migration.sql).await.map_err(|e| {
                VulnfeedError::Storage(format!("migration v{} failed: {e}", migration.version))
            })?;
        }
        Ok(())
    }

    /// Latest applied schema version. A fresh database (no migrations table
    /// yet) reports 0.
    async fn schema_version(&self) -> u32 {
        let Ok(mut rows) = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await
        else {
            return 0;
        };

        match rows.next().await {
            Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
            _ => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Envelope dispatch
    // -----------------------------------------------------------------------

    /// Persist one envelope: upsert the provenance row, then route each
    /// entity to its table by variant. Returns the number of entities
    /// written. An empty envelope writes only provenance.
    pub async fn dispatch_envelope(&self, envelope: &Envelope) -> Result<usize> {
        self.upsert_provider(&envelope.provenance).await?;

        let provider_id = envelope.provenance.provider.as_str();
        let mut written = 0;

        for entity in &envelope.entities {
            match entity {
                Entity::KnownExploited(entry) => {
                    self.upsert_entry(provider_id, entry).await?;
                    written += 1;
                }
            }
        }

        tracing::debug!(provider = provider_id, written, "envelope dispatched");
        Ok(written)
    }

    // -----------------------------------------------------------------------
    // Provider operations
    // -----------------------------------------------------------------------

    /// Insert or refresh the provenance row for a data source.
    pub async fn upsert_provider(&self, provenance: &Provenance) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO providers (id, version, processor, captured_at, input_digest)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                   version = excluded.version,
                   processor = excluded.processor,
                   captured_at = excluded.captured_at,
                   input_digest = excluded.input_digest",
                params![
                    provenance.provider.as_str(),
                    provenance.version as i64,
                    provenance.processor.as_str(),
                    provenance.captured_at.to_rfc3339(),
                    provenance.input_digest.as_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Get the provenance row for a data source.
    pub async fn get_provider(&self, id: &str) -> Result<Option<Provenance>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, version, processor, captured_at, input_digest
                 FROM providers WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_provenance(&row)?)),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Known-exploited entity operations
    // -----------------------------------------------------------------------

    /// Upsert one entity (insert or replace on conflict by `provider_id + cve`).
    pub async fn upsert_entry(
        &self,
        provider_id: &str,
        entry: &KnownExploitedEntry,
    ) -> Result<()> {
        let blob_json = serde_json::to_string(&entry.blob)
            .map_err(|e| VulnfeedError::Storage(format!("blob serialization: {e}")))?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO known_exploited (cve, provider_id, blob_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(provider_id, cve) DO UPDATE SET
                   blob_json = excluded.blob_json,
                   updated_at = excluded.updated_at",
                params![entry.cve(), provider_id, blob_json.as_str(), now.as_str()],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Get one entity by provider and advisory id.
    pub async fn get_entry(
        &self,
        provider_id: &str,
        cve: &str,
    ) -> Result<Option<KnownExploitedEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT blob_json FROM known_exploited
                 WHERE provider_id = ?1 AND cve = ?2",
                params![provider_id, cve],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// List all entities for a provider, ordered by advisory id.
    pub async fn list_entries(&self, provider_id: &str) -> Result<Vec<KnownExploitedEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT blob_json FROM known_exploited
                 WHERE provider_id = ?1 ORDER BY cve",
                params![provider_id],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_entry(&row)?);
        }
        Ok(results)
    }

    /// Count entities stored for a provider.
    pub async fn count_entries(&self, provider_id: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM known_exploited WHERE provider_id = ?1",
                params![provider_id],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(db_err)? as u64),
            None => Ok(0),
        }
    }

    // -----------------------------------------------------------------------
    // Ingest run operations
    // -----------------------------------------------------------------------

    /// Insert a new ingest run. Returns the generated run ID.
    pub async fn insert_ingest_run(&self, provider_id: &str) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO ingest_runs (id, provider_id, started_at) VALUES (?1, ?2, ?3)",
                params![id.as_str(), provider_id, now.as_str()],
            )
            .await
            .map_err(db_err)?;
        Ok(id)
    }

    /// Mark an ingest run finished with its stats.
    pub async fn finish_ingest_run(&self, run_id: &str, stats_json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE ingest_runs SET finished_at = ?1, stats_json = ?2 WHERE id = ?3",
                params![now.as_str(), stats_json, run_id],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

/// Convert a provider row to a [`Provenance`].
fn row_to_provenance(row: &libsql::Row) -> Result<Provenance> {
    let captured_at: String = row.get(3).map_err(db_err)?;
    let captured_at = chrono::DateTime::parse_from_rfc3339(&captured_at)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| VulnfeedError::Storage(format!("invalid captured_at: {e}")))?;

    Ok(Provenance {
        provider: row.get(0).map_err(db_err)?,
        version: row.get::<i64>(1).map_err(db_err)? as u32,
        processor: row.get(2).map_err(db_err)?,
        captured_at,
        input_digest: row.get(4).map_err(db_err)?,
    })
}

/// Convert a known_exploited row (blob_json column) back to an entry.
///
/// The entry key is reconstructed from the blob itself rather than the key
/// column, so a stored row can never resurface with a mismatched key.
fn row_to_entry(row: &libsql::Row) -> Result<KnownExploitedEntry> {
    let blob_json: String = row.get(0).map_err(db_err)?;
    let blob = serde_json::from_str(&blob_json)
        .map_err(|e| VulnfeedError::Storage(format!("blob deserialization: {e}")))?;
    Ok(KnownExploitedEntry::from_blob(blob))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vulnfeed_shared::KnownExploitedBlob;

    /// Create a temp file store for testing.
    async fn test_store() -> Store {
        let tmp = std::env::temp_dir().join(format!("vulnfeed_test_{}.db", Uuid::now_v7()));
        Store::open(&tmp).await.expect("open test db")
    }

    fn sample_provenance() -> Provenance {
        Provenance {
            provider: "kev".into(),
            version: 12,
            processor: "vulnfeed@0.1.0".into(),
            captured_at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            input_digest: "sha256:123456".into(),
        }
    }

    fn sample_entry(cve: &str) -> KnownExploitedEntry {
        KnownExploitedEntry::from_blob(KnownExploitedBlob {
            cve: cve.into(),
            vendor_project: "Palo Alto Networks".into(),
            product: "PAN-OS".into(),
            date_added: Utc.with_ymd_and_hms(2025, 2, 18, 0, 0, 0).unwrap(),
            required_action: "Apply mitigations per vendor instructions.".into(),
            due_date: Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap()),
            known_ransomware_campaign_use: "unknown".into(),
            notes: "remaining information".into(),
            urls: vec![format!("https://nvd.nist.gov/vuln/detail/{cve}")],
            cwes: vec!["CWE-306".into()],
        })
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = test_store().await;
        let version = store.schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("vulnfeed_test_{}.db", Uuid::now_v7()));
        let s1 = Store::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Store::open(&tmp).await.expect("second open");
        assert_eq!(s2.schema_version().await, 1);
    }

    #[tokio::test]
    async fn provider_roundtrip() {
        let store = test_store().await;
        let provenance = sample_provenance();

        store
            .upsert_provider(&provenance)
            .await
            .expect("upsert provider");

        let found = store.get_provider("kev").await.expect("get provider");
        assert_eq!(found, Some(provenance.clone()));

        // Refresh with a new digest
        let refreshed = Provenance {
            input_digest: "sha256:abcdef".into(),
            ..provenance
        };
        store
            .upsert_provider(&refreshed)
            .await
            .expect("upsert again");
        let found = store.get_provider("kev").await.unwrap().unwrap();
        assert_eq!(found.input_digest, "sha256:abcdef");
    }

    #[tokio::test]
    async fn entry_roundtrip() {
        let store = test_store().await;
        store
            .upsert_provider(&sample_provenance())
            .await
            .unwrap();

        let entry = sample_entry("CVE-2025-0108");
        store
            .upsert_entry("kev", &entry)
            .await
            .expect("upsert entry");

        let found = store
            .get_entry("kev", "CVE-2025-0108")
            .await
            .expect("get entry");
        assert_eq!(found, Some(entry));
    }

    #[tokio::test]
    async fn dispatch_persists_and_redispatch_upserts() {
        let store = test_store().await;

        let envelope = Envelope {
            provenance: sample_provenance(),
            entities: vec![
                Entity::KnownExploited(sample_entry("CVE-2025-0108")),
                Entity::KnownExploited(sample_entry("CVE-2024-3400")),
            ],
        };

        let written = store
            .dispatch_envelope(&envelope)
            .await
            .expect("dispatch");
        assert_eq!(written, 2);
        assert_eq!(store.count_entries("kev").await.unwrap(), 2);

        // Re-dispatching the same envelope must not duplicate rows
        store
            .dispatch_envelope(&envelope)
            .await
            .expect("re-dispatch");
        assert_eq!(store.count_entries("kev").await.unwrap(), 2);

        let entries = store.list_entries("kev").await.expect("list entries");
        assert_eq!(entries.len(), 2);
        // Ordered by advisory id
        assert_eq!(entries[0].cve(), "CVE-2024-3400");
        assert_eq!(entries[1].cve(), "CVE-2025-0108");
    }

    #[tokio::test]
    async fn dispatch_empty_envelope_writes_provenance_only() {
        let store = test_store().await;

        let envelope = Envelope {
            provenance: sample_provenance(),
            entities: vec![],
        };

        let written = store
            .dispatch_envelope(&envelope)
            .await
            .expect("dispatch");
        assert_eq!(written, 0);
        assert!(store.get_provider("kev").await.unwrap().is_some());
        assert_eq!(store.count_entries("kev").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ingest_run_lifecycle() {
        let store = test_store().await;

        let run_id = store
            .insert_ingest_run("kev")
            .await
            .expect("insert ingest run");
        assert!(!run_id.is_empty());

        store
            .finish_ingest_run(&run_id, r#"{"entities": 2, "skipped": 0}"#)
            .await
            .expect("finish ingest run");
    }
}
