//! Services, users and escalation chains.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};

use pagerline_core::{EscalationChainEntry, Service, User};

use crate::backend::{self, all_rows, get_row, key, prefix_bounds, to_json, JsonTable};
use crate::{Error, Result};

const SERVICES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("services");
const USERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("users");

// key = service_id/level (zero-padded), value = EscalationChainEntry (JSON)
const CHAIN_TABLE: TableDefinition<&str, &str> = TableDefinition::new("escalation_chain");

const TABLES: [TableDefinition<&str, &str>; 3] = [SERVICES_TABLE, USERS_TABLE, CHAIN_TABLE];

fn chain_key(service_id: &str, level: u32) -> String {
    key(&[service_id, &format!("{:010}", level)])
}

/// Directory of monitored services and the people paged for them.
#[derive(Clone)]
pub struct DirectoryStore {
    db: Arc<Database>,
}

impl DirectoryStore {
    /// Open the store at `dir/directory.redb`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let db = backend::open_file(dir.as_ref(), "directory.redb", &TABLES)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn memory() -> Result<Self> {
        let db = backend::open_memory(&TABLES)?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Services ==========

    pub fn insert_service(&self, service: &Service) -> Result<()> {
        service.validate()?;
        backend::check_key_segment("service", &service.id)?;
        self.insert_new(SERVICES_TABLE, "service", &service.id, service)
    }

    pub fn get_service(&self, id: &str) -> Result<Option<Service>> {
        self.get(SERVICES_TABLE, id)
    }

    pub fn list_services(&self) -> Result<Vec<Service>> {
        let mut services: Vec<Service> = self.list(SERVICES_TABLE)?;
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    /// Replace a service. `created_at` is carried over from the stored row.
    pub fn update_service(&self, service: &Service) -> Result<Service> {
        service.validate()?;
        let existing = self
            .get_service(&service.id)?
            .ok_or_else(|| Error::NotFound(format!("service {}", service.id)))?;
        let mut updated = service.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        self.put(SERVICES_TABLE, &updated.id, &updated)?;
        Ok(updated)
    }

    /// Delete a service together with its escalation chain.
    pub fn delete_service(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut services = write_txn.open_table(SERVICES_TABLE)?;
            let removed = services.remove(id)?.is_some();

            let (start, end) = prefix_bounds(&[id]);
            let mut chain = write_txn.open_table(CHAIN_TABLE)?;
            let keys: Vec<String> = chain
                .range(start.as_str()..end.as_str())?
                .map(|entry| entry.map(|(k, _)| k.value().to_string()))
                .collect::<std::result::Result<_, _>>()?;
            for k in &keys {
                chain.remove(k.as_str())?;
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // ========== Users ==========

    pub fn insert_user(&self, user: &User) -> Result<()> {
        user.validate()?;
        backend::check_key_segment("user", &user.id)?;
        self.insert_new(USERS_TABLE, "user", &user.id, user)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.get(USERS_TABLE, id)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.list(USERS_TABLE)?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    pub fn update_user(&self, user: &User) -> Result<User> {
        user.validate()?;
        let existing = self
            .get_user(&user.id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", user.id)))?;
        let mut updated = user.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        self.put(USERS_TABLE, &updated.id, &updated)?;
        Ok(updated)
    }

    /// Delete a user. Chain entries that name the user stay in place and
    /// are skipped when the chain is resolved.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut users = write_txn.open_table(USERS_TABLE)?;
            let removed = users.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // ========== Escalation chain ==========

    /// Add or replace the entry at `entry.level` for its service.
    pub fn set_chain_entry(&self, entry: &EscalationChainEntry) -> Result<()> {
        entry.validate()?;
        backend::check_key_segment("service", &entry.service_id)?;
        self.put(CHAIN_TABLE, &chain_key(&entry.service_id, entry.level), entry)
    }

    /// Chain entries for a service, ascending by level.
    pub fn escalation_chain(&self, service_id: &str) -> Result<Vec<EscalationChainEntry>> {
        let read_txn = self.db.begin_read()?;
        let chain = read_txn.open_table(CHAIN_TABLE)?;
        let (start, end) = prefix_bounds(&[service_id]);

        let mut entries = Vec::new();
        for entry in chain.range(start.as_str()..end.as_str())? {
            let (_, value) = entry?;
            entries.push(backend::from_json::<EscalationChainEntry>(value.value())?);
        }
        Ok(entries)
    }

    pub fn remove_chain_entry(&self, service_id: &str, level: u32) -> Result<bool> {
        let k = chain_key(service_id, level);
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut chain = write_txn.open_table(CHAIN_TABLE)?;
            let removed = chain.remove(k.as_str())?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // ========== Helpers ==========

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        table: JsonTable,
        id: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        get_row(&table, id)
    }

    fn list<T: serde::de::DeserializeOwned>(&self, table: JsonTable) -> Result<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        all_rows(&table)
    }

    fn put<T: serde::Serialize>(&self, table: JsonTable, id: &str, row: &T) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(id, to_json(row)?.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn insert_new<T: serde::Serialize>(
        &self,
        table: JsonTable,
        kind: &str,
        id: &str,
        row: &T,
    ) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.get(id)?.is_some() {
                return Err(Error::AlreadyExists(format!("{} {}", kind, id)));
            }
            table.insert(id, to_json(row)?.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
