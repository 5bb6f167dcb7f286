use crate::Error;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::Store;

pub const MIGRATION_VERSION_KEY: &[u8] = b"db-version";
pub const INIT_DB_VERSION: &str = "20260901000000";
/// Version of the most recent migration known to this binary.
pub const LATEST_DB_VERSION: &str = INIT_DB_VERSION;

fn internal_error(reason: String) -> Error {
    Error::DBInternalError(reason)
}

#[derive(Default)]
pub struct Migrations {
    migrations: BTreeMap<String, Arc<dyn Migration>>,
}

impl Migrations {
    pub fn add_migration(&mut self, migration: Arc<dyn Migration>) {
        self.migrations
            .insert(migration.version().to_string(), migration);
    }

    /// Compares the database version with the version of this binary.
    ///
    /// `Less` means the database must be migrated, `Greater` that it was written
    /// by a newer binary.
    pub fn check(&self, db: &Store) -> Result<Ordering, Error> {
        let Some(db_version) = self.get_migration_version(db)? else {
            return Ok(Ordering::Less);
        };

        debug!(
            "Current database version: [{}], latest db version: [{}]",
            db_version, LATEST_DB_VERSION
        );
        Ok(db_version.as_str().cmp(LATEST_DB_VERSION))
    }

    fn run_migrate<'a>(&self, mut db: &'a Store, v: &str) -> Result<&'a Store, Error> {
        let latest = self
            .migrations
            .values()
            .last()
            .map(|m| m.version())
            .ok_or_else(|| internal_error("No migration registered".to_string()))?;
        if latest != LATEST_DB_VERSION {
            error!(
                "The latest migration version {} is not the latest db version {}",
                latest, LATEST_DB_VERSION
            );
            return Err(internal_error(
                "The latest migration version is not equal to the latest db version".to_string(),
            ));
        }

        for (version, m) in self.migrations.iter().filter(|(mv, _)| mv.as_str() > v) {
            info!("Running migration {}", version);
            db = m.migrate(db)?;
            db.put(MIGRATION_VERSION_KEY, m.version())
                .map_err(|e| internal_error(e.to_string()))?;
        }
        Ok(db)
    }

    fn get_migration_version(&self, db: &Store) -> Result<Option<String>, Error> {
        db.get(MIGRATION_VERSION_KEY)
            .map_err(|e| internal_error(e.to_string()))?
            .map(|version_bytes| {
                String::from_utf8(version_bytes)
                    .map_err(|e| internal_error(format!("Invalid db version: {}", e)))
            })
            .transpose()
    }

    /// Writes the latest version into a fresh database.
    pub fn init_db_version(&self, db: &Store) -> Result<(), Error> {
        if self.need_init(db)? {
            info!("Init database version {}", LATEST_DB_VERSION);
            db.put(MIGRATION_VERSION_KEY, LATEST_DB_VERSION)
                .map_err(|e| internal_error(e.to_string()))?;
        }
        Ok(())
    }

    pub fn need_init(&self, db: &Store) -> Result<bool, Error> {
        Ok(self.get_migration_version(db)?.is_none())
    }

    pub fn migrate<'a>(&self, db: &'a Store) -> Result<&'a Store, Error> {
        match self.get_migration_version(db)? {
            Some(ref v) => {
                info!("Current database version {}", v);
                self.check_migration_downgrade(v)?;
                self.run_migrate(db, v.as_str())
            }
            None => Ok(db),
        }
    }

    fn check_migration_downgrade(&self, cur_version: &str) -> Result<(), Error> {
        if let Some(m) = self.migrations.values().last() {
            if m.version() < cur_version {
                error!(
                    "Database downgrade detected, the database schema version {} is newer than {}",
                    cur_version,
                    m.version()
                );
                return Err(internal_error(
                    "Database downgrade is not supported".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub trait Migration: Send + Sync {
    fn migrate<'a>(&self, db: &'a Store) -> Result<&'a Store, Error>;

    /// Migration version, a `date +'%Y%m%d%H%M%S'` timestamp.
    fn version(&self) -> &str;
}

pub struct DefaultMigration {
    version: String,
}

impl Default for DefaultMigration {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultMigration {
    pub fn new() -> Self {
        Self {
            version: INIT_DB_VERSION.to_string(),
        }
    }
}

impl Migration for DefaultMigration {
    fn migrate<'a>(&self, db: &'a Store) -> Result<&'a Store, Error> {
        Ok(db)
    }

    fn version(&self) -> &str {
        &self.version
    }
}
