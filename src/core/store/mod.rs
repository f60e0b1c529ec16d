mod types;

pub use types::{InsertOutcome, WorkOrder};

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tokio::sync::Mutex;
use tracing::info;

use crate::core::error::StoreError;
use crate::core::severity::Severity;

const WORK_ORDER_COLUMNS: &str = "fingerprint, category, severity, summary, source, \
     created_at, last_seen_at, occurrence_count, notified";

/// Durable table of work orders keyed by fingerprint.
///
/// WAL journaling keeps writes crash-consistent and lets external readers
/// inspect the file while this process is writing. Uniqueness of the
/// fingerprint column, not application locking, enforces the one-row-per-
/// fingerprint invariant.
pub struct WorkOrderStore {
    db: Arc<Mutex<Connection>>,
}

impl WorkOrderStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Connection::open(path.as_ref())?;
        db.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS work_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                severity INTEGER NOT NULL,
                summary TEXT NOT NULL,
                source TEXT,
                created_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                occurrence_count INTEGER NOT NULL DEFAULT 1,
                notified INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_work_orders_created ON work_orders(created_at)",
            [],
        )?;

        info!("Work order store ready at {}", path.as_ref().display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Insert a work order unless one already exists for the fingerprint.
    ///
    /// A single `INSERT .. ON CONFLICT DO NOTHING` statement guarded by the
    /// UNIQUE constraint decides created-vs-duplicate; there is no separate
    /// existence check that a crash could split.
    pub async fn insert_if_absent(
        &self,
        fingerprint: &str,
        category: &str,
        severity: Severity,
        summary: &str,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let db = self.db.lock().await;
        let stamp = format_stamp(now);
        let inserted = db.execute(
            "INSERT INTO work_orders
                (fingerprint, category, severity, summary, source,
                 created_at, last_seen_at, occurrence_count, notified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 1, 0)
             ON CONFLICT(fingerprint) DO NOTHING",
            params![fingerprint, category, severity.rank(), summary, source, stamp],
        )?;

        let order = fetch(&db, fingerprint)?
            .ok_or_else(|| StoreError::NotFound(fingerprint.to_string()))?;
        if inserted > 0 {
            Ok(InsertOutcome::Created(order))
        } else {
            Ok(InsertOutcome::Duplicate(order))
        }
    }

    /// Record a re-occurrence of a known fingerprint.
    ///
    /// Severity is escalation-only: `MAX(severity, incoming)` in SQL, so a
    /// lower-severity repeat never masks an earlier higher assessment.
    /// Unknown fingerprints are a caller contract violation.
    pub async fn touch_duplicate(
        &self,
        fingerprint: &str,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> Result<WorkOrder, StoreError> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE work_orders
             SET occurrence_count = occurrence_count + 1,
                 last_seen_at = ?1,
                 severity = MAX(severity, ?2)
             WHERE fingerprint = ?3",
            params![format_stamp(now), severity.rank(), fingerprint],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(fingerprint.to_string()));
        }
        fetch(&db, fingerprint)?.ok_or_else(|| StoreError::NotFound(fingerprint.to_string()))
    }

    /// Idempotent; unknown fingerprints are ignored.
    pub async fn mark_notified(&self, fingerprint: &str) -> Result<(), StoreError> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE work_orders SET notified = 1 WHERE fingerprint = ?1",
            params![fingerprint],
        )?;
        Ok(())
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<WorkOrder>, StoreError> {
        let db = self.db.lock().await;
        fetch(&db, fingerprint)
    }

    /// All work orders ordered by first occurrence, oldest first.
    ///
    /// Materialized under the connection lock, so the returned snapshot
    /// never reflects writes that land mid-iteration.
    pub async fn scan_ordered(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_work_order)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }

    /// Latest work orders, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<WorkOrder>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], row_to_work_order)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }
}

fn format_stamp(at: DateTime<Utc>) -> String {
    // Fixed-width UTC stamps so lexicographic column order is chronological.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn fetch(db: &Connection, fingerprint: &str) -> Result<Option<WorkOrder>, StoreError> {
    let order = db
        .query_row(
            &format!("SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE fingerprint = ?1"),
            params![fingerprint],
            row_to_work_order,
        )
        .optional()?;
    Ok(order)
}

fn row_to_work_order(row: &Row<'_>) -> rusqlite::Result<WorkOrder> {
    let rank: i64 = row.get(2)?;
    let severity = Severity::from_rank(rank).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            format!("severity rank {rank} out of range").into(),
        )
    })?;
    Ok(WorkOrder {
        fingerprint: row.get(0)?,
        category: row.get(1)?,
        severity,
        summary: row.get(3)?,
        source: row.get(4)?,
        created_at: parse_stamp(row, 5)?,
        last_seen_at: parse_stamp(row, 6)?,
        occurrence_count: row.get(7)?,
        notified: row.get::<_, i64>(8)? != 0,
    })
}

fn parse_stamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
