// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the dairy collection back-office.
//!
//! Built on Diesel over `SQLite`. Migrations are embedded and applied on
//! open. Natural-key uniqueness (tenant name, farmer triple, staff pair)
//! lives in the schema, so a check-then-insert race ends in
//! `PersistenceError::UniqueViolation` for the loser.
//!
//! ## Testing
//!
//! `Persistence::new_in_memory()` gives every caller its own shared-cache
//! in-memory database, so tests never see each other's rows.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dairy_domain::{
    CollectionRecord, FarmerPrincipal, MemberCode, StaffPrincipal, Tenant, TenantId,
};
use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use time::{Date, Time};
use tracing::{debug, warn};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Minimum work factor accepted by bcrypt.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Plain text behind the decoy hash. Never a real credential.
const DECOY_PASSWORD: &str = "no principal matched this login";

/// Persistence adapter for tenants, principals and collection records.
pub struct Persistence {
    conn: SqliteConnection,
    bcrypt_cost: u32,
    /// bcrypt hash at `bcrypt_cost` checked when a login matches nobody.
    decoy_hash: Option<String>,
}

/// Type alias kept for callers that name the backend explicitly.
pub type SqlitePersistence = Persistence;

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_dairy_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self {
            conn,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            decoy_hash: None,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self {
            conn,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            decoy_hash: None,
        })
    }

    /// Overrides the bcrypt work factor used for new passwords.
    ///
    /// Values below [`MIN_BCRYPT_COST`] are raised to it.
    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost.max(MIN_BCRYPT_COST);
        self.decoy_hash = None;
        self
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Opens a transaction spanning every following call until
    /// [`Self::commit_transaction`] or [`Self::rollback_transaction`].
    ///
    /// Calls that use their own transaction inside it run as savepoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub fn begin_transaction(&mut self) -> Result<(), PersistenceError> {
        <AnsiTransactionManager as TransactionManager<SqliteConnection>>::begin_transaction(
            &mut self.conn,
        )?;
        debug!("Transaction opened");
        Ok(())
    }

    /// Commits the transaction opened by [`Self::begin_transaction`].
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the transaction is rolled back.
    pub fn commit_transaction(&mut self) -> Result<(), PersistenceError> {
        <AnsiTransactionManager as TransactionManager<SqliteConnection>>::commit_transaction(
            &mut self.conn,
        )?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Discards everything written since [`Self::begin_transaction`].
    ///
    /// A failed rollback is logged; there is nothing left to undo for the
    /// caller.
    pub fn rollback_transaction(&mut self) {
        match <AnsiTransactionManager as TransactionManager<SqliteConnection>>::rollback_transaction(
            &mut self.conn,
        ) {
            Ok(()) => debug!("Transaction rolled back"),
            Err(e) => warn!(error = %e, "Transaction rollback failed"),
        }
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Tenants
    // ========================================================================

    /// Creates a tenant and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if a tenant with the same
    /// name (ignoring case) exists.
    pub fn create_tenant(
        &mut self,
        name: &str,
        location: &str,
        contact: Option<&str>,
    ) -> Result<Tenant, PersistenceError> {
        let tenant_id: TenantId =
            mutations::tenants::create_tenant(&mut self.conn, name, location, contact)?;
        queries::tenants::get_tenant(&mut self.conn, tenant_id)?.ok_or_else(|| {
            PersistenceError::NotFound(format!("Tenant {tenant_id} vanished after insert"))
        })
    }

    /// Retrieves a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_tenant(&mut self, tenant_id: TenantId) -> Result<Option<Tenant>, PersistenceError> {
        queries::tenants::get_tenant(&mut self.conn, tenant_id)
    }

    /// Retrieves a tenant by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_tenant_by_name(&mut self, name: &str) -> Result<Option<Tenant>, PersistenceError> {
        queries::tenants::find_tenant_by_name(&mut self.conn, name)
    }

    /// Lists one page of tenants and the total tenant count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tenants(
        &mut self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Tenant>, i64), PersistenceError> {
        queries::tenants::list_tenants(&mut self.conn, offset, limit)
    }

    // ========================================================================
    // Principals
    // ========================================================================

    /// Registers a farmer and returns the stored principal.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` for a duplicate
    /// `(tenant, phone, member code)`.
    pub fn create_farmer(
        &mut self,
        tenant_id: TenantId,
        name: &str,
        phone: &str,
        member_code: &MemberCode,
        password: &str,
    ) -> Result<FarmerPrincipal, PersistenceError> {
        mutations::principals::create_farmer(
            &mut self.conn,
            tenant_id,
            name,
            phone,
            member_code,
            password,
            self.bcrypt_cost,
        )?;
        queries::principals::find_farmer(&mut self.conn, tenant_id, phone, member_code)?
            .ok_or_else(|| PersistenceError::NotFound(String::from("Farmer vanished after insert")))
    }

    /// Looks up a farmer by its natural key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_farmer(
        &mut self,
        tenant_id: TenantId,
        phone: &str,
        member_code: &MemberCode,
    ) -> Result<Option<FarmerPrincipal>, PersistenceError> {
        queries::principals::find_farmer(&mut self.conn, tenant_id, phone, member_code)
    }

    /// Looks up the first farmer registered under a member code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_farmer_by_member_code(
        &mut self,
        tenant_id: TenantId,
        member_code: &MemberCode,
    ) -> Result<Option<FarmerPrincipal>, PersistenceError> {
        queries::principals::find_farmer_by_member_code(&mut self.conn, tenant_id, member_code)
    }

    /// Maps member codes registered in a tenant to farmer names.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn farmer_names_by_member_code(
        &mut self,
        tenant_id: TenantId,
    ) -> Result<HashMap<String, String>, PersistenceError> {
        queries::principals::farmer_names_by_member_code(&mut self.conn, tenant_id)
    }

    /// Creates a staff member and returns the stored principal.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` for a duplicate `(tenant, phone)`.
    pub fn create_staff(
        &mut self,
        tenant_id: TenantId,
        name: &str,
        phone: &str,
        password: &str,
    ) -> Result<StaffPrincipal, PersistenceError> {
        mutations::principals::create_staff(
            &mut self.conn,
            tenant_id,
            name,
            phone,
            password,
            self.bcrypt_cost,
        )?;
        queries::principals::find_staff(&mut self.conn, tenant_id, phone)?
            .ok_or_else(|| PersistenceError::NotFound(String::from("Staff vanished after insert")))
    }

    /// Looks up a staff member by `(tenant, phone)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_staff(
        &mut self,
        tenant_id: TenantId,
        phone: &str,
    ) -> Result<Option<StaffPrincipal>, PersistenceError> {
        queries::principals::find_staff(&mut self.conn, tenant_id, phone)
    }

    /// Lists one page of a tenant's staff and the tenant's staff count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_staff(
        &mut self,
        tenant_id: TenantId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<StaffPrincipal>, i64), PersistenceError> {
        queries::principals::list_staff(&mut self.conn, tenant_id, offset, limit)
    }

    /// Verifies a plain-text password against a stored bcrypt hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash is malformed.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        Ok(bcrypt::verify(password, password_hash)?)
    }

    /// Returns a hash at the configured cost that matches no real password.
    ///
    /// Verifying against it when a login matches no principal makes that
    /// failure cost as much as a wrong password. Generated on first use and
    /// cached until the cost changes.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn decoy_password_hash(&mut self) -> Result<String, PersistenceError> {
        if let Some(hash) = &self.decoy_hash {
            return Ok(hash.clone());
        }
        let hash: String = bcrypt::hash(DECOY_PASSWORD, self.bcrypt_cost)?;
        self.decoy_hash = Some(hash.clone());
        Ok(hash)
    }

    // ========================================================================
    // Collection records
    // ========================================================================

    /// Inserts a batch of collection records atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be stored; nothing from the
    /// batch is kept in that case.
    pub fn insert_collection_records(
        &mut self,
        records: &[CollectionRecord],
    ) -> Result<usize, PersistenceError> {
        mutations::collection_records::insert_collection_records(&mut self.conn, records)
    }

    /// Lists all records for a member code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_member_records(
        &mut self,
        tenant_id: TenantId,
        member_code: &MemberCode,
    ) -> Result<Vec<CollectionRecord>, PersistenceError> {
        queries::collection_records::list_member_records(&mut self.conn, tenant_id, member_code)
    }

    /// Lists a member code's records for one auxiliary month.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_member_monthly_records(
        &mut self,
        tenant_id: TenantId,
        member_code: &MemberCode,
        auxiliary_month: &str,
        auxiliary_year: &str,
    ) -> Result<Vec<CollectionRecord>, PersistenceError> {
        queries::collection_records::list_member_monthly_records(
            &mut self.conn,
            tenant_id,
            member_code,
            auxiliary_month,
            auxiliary_year,
        )
    }

    /// Lists a tenant's records for one auxiliary month.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tenant_monthly_records(
        &mut self,
        tenant_id: TenantId,
        auxiliary_month: &str,
        auxiliary_year: &str,
    ) -> Result<Vec<CollectionRecord>, PersistenceError> {
        queries::collection_records::list_tenant_monthly_records(
            &mut self.conn,
            tenant_id,
            auxiliary_month,
            auxiliary_year,
        )
    }

    /// Checks for a record at `(tenant, member code, date, time)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn collection_record_exists(
        &mut self,
        tenant_id: TenantId,
        member_code: &MemberCode,
        collection_date: Date,
        collection_time: Time,
    ) -> Result<bool, PersistenceError> {
        queries::collection_records::collection_record_exists(
            &mut self.conn,
            tenant_id,
            member_code,
            collection_date,
            collection_time,
        )
    }

    /// Counts a tenant's stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_tenant_records(&mut self, tenant_id: TenantId) -> Result<i64, PersistenceError> {
        queries::collection_records::count_tenant_records(&mut self.conn, tenant_id)
    }
}
