//! Health-check history.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use pagerline_core::HealthCheck;

use crate::backend::{self, from_json, key, prefix_bounds, time_segment, to_json};
use crate::Result;

// key = service_id/checked_at/uuid, value = HealthCheck (JSON)
const HEALTH_TABLE: TableDefinition<&str, &str> = TableDefinition::new("health_checks");

#[derive(Clone)]
pub struct HealthStore {
    db: Arc<Database>,
}

impl HealthStore {
    /// Open the store at `dir/health.redb`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let db = backend::open_file(dir.as_ref(), "health.redb", &[HEALTH_TABLE])?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn memory() -> Result<Self> {
        let db = backend::open_memory(&[HEALTH_TABLE])?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn record(&self, check: &HealthCheck) -> Result<()> {
        backend::check_key_segment("service", &check.service_id)?;
        let row_key = key(&[
            &check.service_id,
            &time_segment(&check.checked_at),
            &uuid::Uuid::new_v4().to_string(),
        ]);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(HEALTH_TABLE)?;
            table.insert(row_key.as_str(), to_json(check)?.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Most recent check for a service.
    pub fn latest(&self, service_id: &str) -> Result<Option<HealthCheck>> {
        Ok(self.history(service_id, 1)?.into_iter().next())
    }

    /// Up to `limit` checks for a service, newest first.
    pub fn history(&self, service_id: &str, limit: usize) -> Result<Vec<HealthCheck>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HEALTH_TABLE)?;
        let (start, end) = prefix_bounds(&[service_id]);

        let mut out = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())?.rev().take(limit) {
            let (_, value) = entry?;
            out.push(from_json(value.value())?);
        }
        Ok(out)
    }
}
