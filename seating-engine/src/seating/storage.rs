//! redb-based storage for wedding seating data
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `weddings` | `wedding_id` | `Wedding` | Wedding records |
//! | `settings` | `wedding_id` | `SeatingSettings` | Per-wedding settings |
//! | `guests` | `(wedding_id, guest_id)` | `Guest` | Guest parties |
//! | `groups` | `(wedding_id, group_id)` | `GuestGroup` | Guest groups |
//! | `seating_tables` | `(wedding_id, table_id)` | `SeatingTable` | Real tables |
//! | `adjacency` | `(wedding_id, table_id, adjacent_id)` | `()` | Table adjacency edges |
//! | `preferences` | `(wedding_id, preference_id)` | `SeatingPreference` | Preference edges |
//! | `assignments` | `(wedding_id, partition, guest_id)` | `SeatAssignment` | Real / simulation rows |
//! | `simulated_tables` | `(wedding_id, table_id)` | `SeatingTable` | Tables opened by simulation runs |
//! | `run_log` | `(wedding_id, partition)` | `RunResult` | Last run per partition |
//!
//! Values are JSON. A run's writes land in a single write transaction, so a
//! failed commit leaves the previous seating untouched.

use super::context::WeddingData;
use redb::{
    Database, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{
    AssignmentType, Guest, GuestGroup, RunResult, SeatAssignment, SeatingPreference,
    SeatingSettings, SeatingTable, TableAdjacency, Wedding,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

type Bytes = &'static [u8];
type WeddingKey = (i64, i64);
type AssignmentKey = (i64, u8, i64);

const WEDDINGS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("weddings");

const SETTINGS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("settings");

const GUESTS_TABLE: TableDefinition<WeddingKey, &[u8]> = TableDefinition::new("guests");

const GROUPS_TABLE: TableDefinition<WeddingKey, &[u8]> = TableDefinition::new("groups");

const SEATING_TABLES_TABLE: TableDefinition<WeddingKey, &[u8]> =
    TableDefinition::new("seating_tables");

/// Directed edges as declared; the solver treats them as symmetric
const ADJACENCY_TABLE: TableDefinition<(i64, i64, i64), ()> = TableDefinition::new("adjacency");

const PREFERENCES_TABLE: TableDefinition<WeddingKey, &[u8]> = TableDefinition::new("preferences");

/// key = (wedding_id, AssignmentType::as_u8, guest_id)
const ASSIGNMENTS_TABLE: TableDefinition<AssignmentKey, &[u8]> =
    TableDefinition::new("assignments");

const SIMULATED_TABLES_TABLE: TableDefinition<WeddingKey, &[u8]> =
    TableDefinition::new("simulated_tables");

const RUN_LOG_TABLE: TableDefinition<(i64, u8), &[u8]> = TableDefinition::new("run_log");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Wedding not found: {0}")]
    WeddingNotFound(i64),

    #[error("Seating settings missing for wedding {0}")]
    SettingsMissing(i64),

    #[error("Guest not found: {0}")]
    GuestNotFound(i64),

    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("Guest {0} still has seat assignments")]
    GuestHasAssignments(i64),

    #[error("Table {0} still has seat assignments")]
    TableHasAssignments(i64),

    #[error("Table number {0} already exists")]
    TableNumberExists(i32),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Everything one run writes
#[derive(Debug, Clone)]
pub struct RunCommit {
    pub wedding_id: i64,
    pub assignment_type: AssignmentType,
    /// New content of the partition
    pub assignments: Vec<SeatAssignment>,
    /// Real tables to insert or update
    pub upsert_tables: Vec<SeatingTable>,
    /// Real tables to delete (with their adjacency edges)
    pub remove_table_ids: Vec<i64>,
    /// `Some` replaces the wedding's simulated tables
    pub simulated_tables: Option<Vec<SeatingTable>>,
    pub run_result: Option<RunResult>,
}

/// Seating storage backed by redb
#[derive(Clone)]
pub struct SeatingStorage {
    db: Arc<Database>,
}

impl SeatingStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WEDDINGS_TABLE)?;
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
            let _ = write_txn.open_table(GUESTS_TABLE)?;
            let _ = write_txn.open_table(GROUPS_TABLE)?;
            let _ = write_txn.open_table(SEATING_TABLES_TABLE)?;
            let _ = write_txn.open_table(ADJACENCY_TABLE)?;
            let _ = write_txn.open_table(PREFERENCES_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENTS_TABLE)?;
            let _ = write_txn.open_table(SIMULATED_TABLES_TABLE)?;
            let _ = write_txn.open_table(RUN_LOG_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Weddings & Settings ==========

    pub fn put_wedding(&self, wedding: &Wedding) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(WEDDINGS_TABLE)?;
            table.insert(wedding.id, to_json(wedding)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_wedding(&self, wedding_id: i64) -> StorageResult<Option<Wedding>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEDDINGS_TABLE)?;
        match table.get(wedding_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Delete a wedding and every record keyed under it
    pub fn delete_wedding(&self, wedding_id: i64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            txn.open_table(WEDDINGS_TABLE)?.remove(wedding_id)?;
            txn.open_table(SETTINGS_TABLE)?.remove(wedding_id)?;
            clear_wedding_rows(&mut txn.open_table(GUESTS_TABLE)?, wedding_id)?;
            clear_wedding_rows(&mut txn.open_table(GROUPS_TABLE)?, wedding_id)?;
            clear_wedding_rows(&mut txn.open_table(SEATING_TABLES_TABLE)?, wedding_id)?;
            clear_wedding_rows(&mut txn.open_table(PREFERENCES_TABLE)?, wedding_id)?;
            clear_wedding_rows(&mut txn.open_table(SIMULATED_TABLES_TABLE)?, wedding_id)?;

            let mut assignments = txn.open_table(ASSIGNMENTS_TABLE)?;
            for t in [AssignmentType::Real, AssignmentType::Simulation] {
                clear_partition(&mut assignments, wedding_id, t)?;
            }

            let mut adjacency = txn.open_table(ADJACENCY_TABLE)?;
            let edges = collect_adjacency(&adjacency, wedding_id)?;
            for edge in edges {
                adjacency.remove((wedding_id, edge.table_id, edge.adjacent_table_id))?;
            }

            let mut runs = txn.open_table(RUN_LOG_TABLE)?;
            for t in [AssignmentType::Real, AssignmentType::Simulation] {
                runs.remove((wedding_id, t.as_u8()))?;
            }
        }
        txn.commit()?;
        tracing::info!(wedding_id, "Wedding deleted");
        Ok(())
    }

    pub fn put_settings(&self, settings: &SeatingSettings) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        ensure_wedding(&txn, settings.wedding_id)?;
        {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            table.insert(settings.wedding_id, to_json(settings)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_settings(&self, wedding_id: i64) -> StorageResult<Option<SeatingSettings>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;
        match table.get(wedding_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Guests & Groups ==========

    pub fn put_guest(&self, guest: &Guest) -> StorageResult<()> {
        self.put_row(GUESTS_TABLE, guest.wedding_id, guest.id, guest)
    }

    pub fn get_guest(&self, wedding_id: i64, guest_id: i64) -> StorageResult<Option<Guest>> {
        self.get_row(GUESTS_TABLE, wedding_id, guest_id)
    }

    pub fn list_guests(&self, wedding_id: i64) -> StorageResult<Vec<Guest>> {
        self.list_rows(GUESTS_TABLE, wedding_id)
    }

    /// Delete a guest; rejected while any assignment row references it
    pub fn delete_guest(&self, wedding_id: i64, guest_id: i64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let assignments = txn.open_table(ASSIGNMENTS_TABLE)?;
            for t in [AssignmentType::Real, AssignmentType::Simulation] {
                if assignments.get((wedding_id, t.as_u8(), guest_id))?.is_some() {
                    return Err(StorageError::GuestHasAssignments(guest_id));
                }
            }
            let tables: Vec<SeatingTable> =
                load_wedding_rows(&txn.open_table(SEATING_TABLES_TABLE)?, wedding_id)?;
            if tables.iter().any(|t| t.assigned_guests.contains(&guest_id)) {
                return Err(StorageError::GuestHasAssignments(guest_id));
            }

            let mut guests = txn.open_table(GUESTS_TABLE)?;
            if guests.remove((wedding_id, guest_id))?.is_none() {
                return Err(StorageError::GuestNotFound(guest_id));
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn put_group(&self, group: &GuestGroup) -> StorageResult<()> {
        self.put_row(GROUPS_TABLE, group.wedding_id, group.id, group)
    }

    pub fn get_group(&self, wedding_id: i64, group_id: i64) -> StorageResult<Option<GuestGroup>> {
        self.get_row(GROUPS_TABLE, wedding_id, group_id)
    }

    pub fn list_groups(&self, wedding_id: i64) -> StorageResult<Vec<GuestGroup>> {
        self.list_rows(GROUPS_TABLE, wedding_id)
    }

    /// Guests keep their `group_id`; a missing group counts as ungrouped
    pub fn delete_group(&self, wedding_id: i64, group_id: i64) -> StorageResult<bool> {
        self.delete_row(GROUPS_TABLE, wedding_id, group_id)
    }

    // ========== Tables & Adjacency ==========

    /// Insert or update a table; `table_number` must stay unique per wedding
    pub fn put_table(&self, table: &SeatingTable) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        ensure_wedding(&txn, table.wedding_id)?;
        {
            let mut tables = txn.open_table(SEATING_TABLES_TABLE)?;
            let existing: Vec<SeatingTable> = load_wedding_rows(&tables, table.wedding_id)?;
            if existing
                .iter()
                .any(|t| t.id != table.id && t.table_number == table.table_number)
            {
                return Err(StorageError::TableNumberExists(table.table_number));
            }
            tables.insert((table.wedding_id, table.id), to_json(table)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_table(&self, wedding_id: i64, table_id: i64) -> StorageResult<Option<SeatingTable>> {
        self.get_row(SEATING_TABLES_TABLE, wedding_id, table_id)
    }

    pub fn list_tables(&self, wedding_id: i64) -> StorageResult<Vec<SeatingTable>> {
        self.list_rows(SEATING_TABLES_TABLE, wedding_id)
    }

    /// Delete a table and its adjacency edges; rejected while guests sit there
    pub fn delete_table(&self, wedding_id: i64, table_id: i64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let assignments = txn.open_table(ASSIGNMENTS_TABLE)?;
            for t in [AssignmentType::Real, AssignmentType::Simulation] {
                let rows = load_partition(&assignments, wedding_id, t)?;
                if rows.iter().any(|a| a.table_id == table_id) {
                    return Err(StorageError::TableHasAssignments(table_id));
                }
            }

            let mut tables = txn.open_table(SEATING_TABLES_TABLE)?;
            let table: SeatingTable = match tables.get((wedding_id, table_id))? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::TableNotFound(table_id)),
            };
            if !table.assigned_guests.is_empty() {
                return Err(StorageError::TableHasAssignments(table_id));
            }
            tables.remove((wedding_id, table_id))?;

            remove_table_edges(&mut txn.open_table(ADJACENCY_TABLE)?, wedding_id, table_id)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn put_adjacency(&self, edge: &TableAdjacency) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let tables = txn.open_table(SEATING_TABLES_TABLE)?;
            for id in [edge.table_id, edge.adjacent_table_id] {
                if tables.get((edge.wedding_id, id))?.is_none() {
                    return Err(StorageError::TableNotFound(id));
                }
            }
            let mut adjacency = txn.open_table(ADJACENCY_TABLE)?;
            adjacency.insert((edge.wedding_id, edge.table_id, edge.adjacent_table_id), ())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn delete_adjacency(&self, edge: &TableAdjacency) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut adjacency = txn.open_table(ADJACENCY_TABLE)?;
            adjacency
                .remove((edge.wedding_id, edge.table_id, edge.adjacent_table_id))?
                .is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_adjacency(&self, wedding_id: i64) -> StorageResult<Vec<TableAdjacency>> {
        let read_txn = self.db.begin_read()?;
        collect_adjacency(&read_txn.open_table(ADJACENCY_TABLE)?, wedding_id)
    }

    // ========== Preferences ==========

    pub fn put_preference(&self, preference: &SeatingPreference) -> StorageResult<()> {
        self.put_row(
            PREFERENCES_TABLE,
            preference.wedding_id,
            preference.id,
            preference,
        )
    }

    pub fn list_preferences(&self, wedding_id: i64) -> StorageResult<Vec<SeatingPreference>> {
        self.list_rows(PREFERENCES_TABLE, wedding_id)
    }

    pub fn delete_preference(&self, wedding_id: i64, preference_id: i64) -> StorageResult<bool> {
        self.delete_row(PREFERENCES_TABLE, wedding_id, preference_id)
    }

    // ========== Import & Snapshot ==========

    /// Upsert every record of a wedding in one transaction
    pub fn import(&self, data: &WeddingData) -> StorageResult<()> {
        let wedding_id = data.wedding.id;
        let txn = self.db.begin_write()?;
        {
            txn.open_table(WEDDINGS_TABLE)?
                .insert(wedding_id, to_json(&data.wedding)?.as_slice())?;

            let mut settings = data.settings.clone();
            settings.wedding_id = wedding_id;
            txn.open_table(SETTINGS_TABLE)?
                .insert(wedding_id, to_json(&settings)?.as_slice())?;

            let mut guests = txn.open_table(GUESTS_TABLE)?;
            for guest in &data.guests {
                guests.insert((wedding_id, guest.id), to_json(guest)?.as_slice())?;
            }
            let mut groups = txn.open_table(GROUPS_TABLE)?;
            for group in &data.groups {
                groups.insert((wedding_id, group.id), to_json(group)?.as_slice())?;
            }
            let mut tables = txn.open_table(SEATING_TABLES_TABLE)?;
            for table in &data.tables {
                tables.insert((wedding_id, table.id), to_json(table)?.as_slice())?;
            }
            let mut adjacency = txn.open_table(ADJACENCY_TABLE)?;
            for edge in &data.adjacency {
                adjacency.insert((wedding_id, edge.table_id, edge.adjacent_table_id), ())?;
            }
            let mut preferences = txn.open_table(PREFERENCES_TABLE)?;
            for pref in &data.preferences {
                preferences.insert((wedding_id, pref.id), to_json(pref)?.as_slice())?;
            }
        }
        txn.commit()?;

        tracing::info!(
            wedding_id,
            guests = data.guests.len(),
            tables = data.tables.len(),
            preferences = data.preferences.len(),
            "Wedding data imported"
        );
        Ok(())
    }

    /// Read everything a run needs in one read transaction
    pub fn load_wedding_data(&self, wedding_id: i64) -> StorageResult<WeddingData> {
        let read_txn = self.db.begin_read()?;

        let wedding: Wedding = match read_txn.open_table(WEDDINGS_TABLE)?.get(wedding_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::WeddingNotFound(wedding_id)),
        };
        let settings: SeatingSettings = match read_txn.open_table(SETTINGS_TABLE)?.get(wedding_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::SettingsMissing(wedding_id)),
        };

        Ok(WeddingData {
            wedding,
            settings,
            guests: load_wedding_rows(&read_txn.open_table(GUESTS_TABLE)?, wedding_id)?,
            groups: load_wedding_rows(&read_txn.open_table(GROUPS_TABLE)?, wedding_id)?,
            tables: load_wedding_rows(&read_txn.open_table(SEATING_TABLES_TABLE)?, wedding_id)?,
            adjacency: collect_adjacency(&read_txn.open_table(ADJACENCY_TABLE)?, wedding_id)?,
            preferences: load_wedding_rows(&read_txn.open_table(PREFERENCES_TABLE)?, wedding_id)?,
        })
    }

    // ========== Assignments & Runs ==========

    /// Assignment rows of one partition, ordered by guest id
    pub fn get_assignments(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> StorageResult<Vec<SeatAssignment>> {
        let read_txn = self.db.begin_read()?;
        load_partition(
            &read_txn.open_table(ASSIGNMENTS_TABLE)?,
            wedding_id,
            assignment_type,
        )
    }

    pub fn get_simulated_tables(&self, wedding_id: i64) -> StorageResult<Vec<SeatingTable>> {
        self.list_rows(SIMULATED_TABLES_TABLE, wedding_id)
    }

    pub fn get_last_run(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> StorageResult<Option<RunResult>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RUN_LOG_TABLE)?;
        match table.get((wedding_id, assignment_type.as_u8()))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Apply a run's writes atomically
    pub fn commit_run(&self, commit: &RunCommit) -> StorageResult<()> {
        let wedding_id = commit.wedding_id;
        let txn = self.db.begin_write()?;
        ensure_wedding(&txn, wedding_id)?;
        {
            let mut assignments = txn.open_table(ASSIGNMENTS_TABLE)?;
            clear_partition(&mut assignments, wedding_id, commit.assignment_type)?;
            for row in &commit.assignments {
                let key = (wedding_id, commit.assignment_type.as_u8(), row.guest_id);
                assignments.insert(key, to_json(row)?.as_slice())?;
            }

            let mut tables = txn.open_table(SEATING_TABLES_TABLE)?;
            let mut adjacency = txn.open_table(ADJACENCY_TABLE)?;
            for &table_id in &commit.remove_table_ids {
                tables.remove((wedding_id, table_id))?;
                remove_table_edges(&mut adjacency, wedding_id, table_id)?;
            }
            for table in &commit.upsert_tables {
                tables.insert((wedding_id, table.id), to_json(table)?.as_slice())?;
            }

            if let Some(simulated) = &commit.simulated_tables {
                let mut sim_tables = txn.open_table(SIMULATED_TABLES_TABLE)?;
                clear_wedding_rows(&mut sim_tables, wedding_id)?;
                for table in simulated {
                    sim_tables.insert((wedding_id, table.id), to_json(table)?.as_slice())?;
                }
            }

            if let Some(result) = &commit.run_result {
                txn.open_table(RUN_LOG_TABLE)?.insert(
                    (wedding_id, commit.assignment_type.as_u8()),
                    to_json(result)?.as_slice(),
                )?;
            }
        }
        txn.commit()?;

        tracing::debug!(
            wedding_id,
            assignment_type = %commit.assignment_type,
            rows = commit.assignments.len(),
            upserted_tables = commit.upsert_tables.len(),
            removed_tables = commit.remove_table_ids.len(),
            "Run committed"
        );
        Ok(())
    }

    // ========== Row helpers ==========

    fn put_row<T: Serialize>(
        &self,
        def: TableDefinition<'static, WeddingKey, Bytes>,
        wedding_id: i64,
        id: i64,
        value: &T,
    ) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        ensure_wedding(&txn, wedding_id)?;
        {
            let mut table = txn.open_table(def)?;
            table.insert((wedding_id, id), to_json(value)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, WeddingKey, Bytes>,
        wedding_id: i64,
        id: i64,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(def)?;
        match table.get((wedding_id, id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_rows<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, WeddingKey, Bytes>,
        wedding_id: i64,
    ) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        load_wedding_rows(&read_txn.open_table(def)?, wedding_id)
    }

    fn delete_row(
        &self,
        def: TableDefinition<'static, WeddingKey, Bytes>,
        wedding_id: i64,
        id: i64,
    ) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = txn.open_table(def)?.remove((wedding_id, id))?.is_some();
        txn.commit()?;
        Ok(removed)
    }
}

fn to_json<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn ensure_wedding(txn: &WriteTransaction, wedding_id: i64) -> StorageResult<()> {
    let weddings = txn.open_table(WEDDINGS_TABLE)?;
    if weddings.get(wedding_id)?.is_none() {
        return Err(StorageError::WeddingNotFound(wedding_id));
    }
    Ok(())
}

fn load_wedding_rows<T: DeserializeOwned>(
    table: &impl ReadableTable<WeddingKey, Bytes>,
    wedding_id: i64,
) -> StorageResult<Vec<T>> {
    let mut rows = Vec::new();
    for result in table.range((wedding_id, i64::MIN)..=(wedding_id, i64::MAX))? {
        let (_key, value) = result?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

fn clear_wedding_rows(table: &mut Table<'_, WeddingKey, Bytes>, wedding_id: i64) -> StorageResult<()> {
    // Collect first: the range borrows the table
    let mut keys = Vec::new();
    for result in table.range((wedding_id, i64::MIN)..=(wedding_id, i64::MAX))? {
        let (key, _value) = result?;
        keys.push(key.value());
    }
    for key in keys {
        table.remove(key)?;
    }
    Ok(())
}

fn load_partition(
    table: &impl ReadableTable<AssignmentKey, Bytes>,
    wedding_id: i64,
    assignment_type: AssignmentType,
) -> StorageResult<Vec<SeatAssignment>> {
    let t = assignment_type.as_u8();
    let mut rows = Vec::new();
    for result in table.range((wedding_id, t, i64::MIN)..=(wedding_id, t, i64::MAX))? {
        let (_key, value) = result?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

fn clear_partition(
    table: &mut Table<'_, AssignmentKey, Bytes>,
    wedding_id: i64,
    assignment_type: AssignmentType,
) -> StorageResult<()> {
    let t = assignment_type.as_u8();
    let mut keys = Vec::new();
    for result in table.range((wedding_id, t, i64::MIN)..=(wedding_id, t, i64::MAX))? {
        let (key, _value) = result?;
        keys.push(key.value());
    }
    for key in keys {
        table.remove(key)?;
    }
    Ok(())
}

fn collect_adjacency(
    table: &impl ReadableTable<(i64, i64, i64), ()>,
    wedding_id: i64,
) -> StorageResult<Vec<TableAdjacency>> {
    let mut edges = Vec::new();
    let range = (wedding_id, i64::MIN, i64::MIN)..=(wedding_id, i64::MAX, i64::MAX);
    for result in table.range(range)? {
        let (key, _value) = result?;
        let (wedding_id, table_id, adjacent_table_id) = key.value();
        edges.push(TableAdjacency {
            wedding_id,
            table_id,
            adjacent_table_id,
        });
    }
    Ok(edges)
}

fn remove_table_edges(
    adjacency: &mut Table<'_, (i64, i64, i64), ()>,
    wedding_id: i64,
    table_id: i64,
) -> StorageResult<()> {
    let edges = collect_adjacency(&*adjacency, wedding_id)?;
    for edge in edges
        .iter()
        .filter(|e| e.table_id == table_id || e.adjacent_table_id == table_id)
    {
        adjacency.remove((wedding_id, edge.table_id, edge.adjacent_table_id))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{RsvpStatus, TableType};

    fn wedding(id: i64) -> Wedding {
        Wedding {
            id,
            name: format!("Wedding {}", id),
            event_date: None,
        }
    }

    fn guest(id: i64) -> Guest {
        Guest {
            id,
            wedding_id: 1,
            name: format!("Guest {}", id),
            adults_attending: 2,
            children_attending: 0,
            rsvp_status: RsvpStatus::Confirmed,
            group_id: None,
            created_at: id,
        }
    }

    fn table(id: i64, number: i32) -> SeatingTable {
        SeatingTable {
            id,
            wedding_id: 1,
            table_name: format!("T{}", number),
            table_number: number,
            capacity: 10,
            table_type: TableType::Mixed,
            assigned_guests: Vec::new(),
            zone: None,
            auto_created: false,
            capacity_override: false,
        }
    }

    fn row(table_id: i64, guest_id: i64, t: AssignmentType) -> SeatAssignment {
        SeatAssignment {
            wedding_id: 1,
            table_id,
            guest_id,
            seats_count: 2,
            assignment_type: t,
        }
    }

    fn seeded() -> SeatingStorage {
        let storage = SeatingStorage::open_in_memory().unwrap();
        storage.put_wedding(&wedding(1)).unwrap();
        storage
            .put_settings(&SeatingSettings::for_wedding(1))
            .unwrap();
        storage
    }

    fn commit(storage: &SeatingStorage, t: AssignmentType, rows: Vec<SeatAssignment>) {
        storage
            .commit_run(&RunCommit {
                wedding_id: 1,
                assignment_type: t,
                assignments: rows,
                upsert_tables: Vec::new(),
                remove_table_ids: Vec::new(),
                simulated_tables: None,
                run_result: None,
            })
            .unwrap();
    }

    #[test]
    fn test_load_requires_wedding_and_settings() {
        let storage = SeatingStorage::open_in_memory().unwrap();
        assert!(matches!(
            storage.load_wedding_data(1),
            Err(StorageError::WeddingNotFound(1))
        ));

        storage.put_wedding(&wedding(1)).unwrap();
        assert!(matches!(
            storage.load_wedding_data(1),
            Err(StorageError::SettingsMissing(1))
        ));
    }

    #[test]
    fn test_rows_are_scoped_per_wedding() {
        let storage = seeded();
        storage.put_wedding(&wedding(2)).unwrap();
        storage.put_guest(&guest(1)).unwrap();
        let mut other = guest(1);
        other.wedding_id = 2;
        other.name = "Other".to_string();
        storage.put_guest(&other).unwrap();

        let guests = storage.list_guests(1).unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].name, "Guest 1");
        assert_eq!(storage.list_guests(2).unwrap()[0].name, "Other");
    }

    #[test]
    fn test_put_guest_requires_wedding() {
        let storage = SeatingStorage::open_in_memory().unwrap();
        assert!(matches!(
            storage.put_guest(&guest(1)),
            Err(StorageError::WeddingNotFound(1))
        ));
    }

    #[test]
    fn test_table_number_unique() {
        let storage = seeded();
        storage.put_table(&table(1, 1)).unwrap();
        storage.put_table(&table(1, 1)).unwrap();
        assert!(matches!(
            storage.put_table(&table(2, 1)),
            Err(StorageError::TableNumberExists(1))
        ));
    }

    #[test]
    fn test_delete_guards() {
        let storage = seeded();
        storage.put_guest(&guest(5)).unwrap();
        storage.put_table(&table(1, 1)).unwrap();
        commit(&storage, AssignmentType::Simulation, vec![row(1, 5, AssignmentType::Simulation)]);

        assert!(matches!(
            storage.delete_guest(1, 5),
            Err(StorageError::GuestHasAssignments(5))
        ));
        assert!(matches!(
            storage.delete_table(1, 1),
            Err(StorageError::TableHasAssignments(1))
        ));

        commit(&storage, AssignmentType::Simulation, Vec::new());
        storage.delete_guest(1, 5).unwrap();
        storage.delete_table(1, 1).unwrap();
        assert!(storage.get_guest(1, 5).unwrap().is_none());
        assert!(matches!(
            storage.delete_table(1, 1),
            Err(StorageError::TableNotFound(1))
        ));
    }

    #[test]
    fn test_commit_replaces_only_its_partition() {
        let storage = seeded();
        commit(
            &storage,
            AssignmentType::Real,
            vec![row(1, 1, AssignmentType::Real), row(1, 2, AssignmentType::Real)],
        );
        commit(&storage, AssignmentType::Simulation, vec![row(2, 1, AssignmentType::Simulation)]);
        commit(&storage, AssignmentType::Real, vec![row(3, 2, AssignmentType::Real)]);

        let real = storage.get_assignments(1, AssignmentType::Real).unwrap();
        assert_eq!(real, vec![row(3, 2, AssignmentType::Real)]);
        let sim = storage.get_assignments(1, AssignmentType::Simulation).unwrap();
        assert_eq!(sim, vec![row(2, 1, AssignmentType::Simulation)]);
    }

    #[test]
    fn test_removing_table_drops_its_edges() {
        let storage = seeded();
        for (id, number) in [(1, 1), (2, 2), (3, 3)] {
            storage.put_table(&table(id, number)).unwrap();
        }
        for (a, b) in [(1, 2), (3, 1), (2, 3)] {
            storage
                .put_adjacency(&TableAdjacency {
                    wedding_id: 1,
                    table_id: a,
                    adjacent_table_id: b,
                })
                .unwrap();
        }

        storage
            .commit_run(&RunCommit {
                wedding_id: 1,
                assignment_type: AssignmentType::Real,
                assignments: Vec::new(),
                upsert_tables: vec![table(4, 4)],
                remove_table_ids: vec![1],
                simulated_tables: None,
                run_result: None,
            })
            .unwrap();

        let edges = storage.list_adjacency(1).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].table_id, edges[0].adjacent_table_id), (2, 3));
        let ids: Vec<i64> = storage.list_tables(1).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_adjacency_requires_tables() {
        let storage = seeded();
        storage.put_table(&table(1, 1)).unwrap();
        let edge = TableAdjacency {
            wedding_id: 1,
            table_id: 1,
            adjacent_table_id: 9,
        };
        assert!(matches!(
            storage.put_adjacency(&edge),
            Err(StorageError::TableNotFound(9))
        ));
    }

    #[test]
    fn test_import_and_delete_wedding() {
        let storage = SeatingStorage::open_in_memory().unwrap();
        let data = WeddingData {
            wedding: wedding(1),
            settings: SeatingSettings::default(),
            guests: vec![guest(1), guest(2)],
            groups: Vec::new(),
            tables: vec![table(1, 1)],
            adjacency: Vec::new(),
            preferences: Vec::new(),
        };
        storage.import(&data).unwrap();

        let loaded = storage.load_wedding_data(1).unwrap();
        assert_eq!(loaded.settings.wedding_id, 1);
        assert_eq!(loaded.guests.len(), 2);
        assert_eq!(loaded.tables.len(), 1);

        storage.delete_wedding(1).unwrap();
        assert!(storage.get_wedding(1).unwrap().is_none());
        assert!(storage.list_guests(1).unwrap().is_empty());
        assert!(storage.list_tables(1).unwrap().is_empty());
    }
}
