use super::migration::{DefaultMigration, Migration, Migrations};
use super::Store;
use crate::Error;
use std::{cmp::Ordering, path::Path, sync::Arc};
use tracing::{error, info};

/// Checks and upgrades the schema version of a store.
pub struct DbMigrate<'a> {
    migrations: Migrations,
    db: &'a Store,
}

impl<'a> DbMigrate<'a> {
    pub fn new(db: &'a Store) -> Self {
        let mut migrations = Migrations::default();
        migrations.add_migration(Arc::new(DefaultMigration::new()));
        DbMigrate { migrations, db }
    }

    pub fn add_migration(&mut self, migration: Arc<dyn Migration>) {
        self.migrations.add_migration(migration);
    }

    pub fn check(&self) -> Result<Ordering, Error> {
        self.migrations.check(self.db)
    }

    pub fn migrate(&self) -> Result<&Store, Error> {
        self.migrations.migrate(self.db)
    }

    pub fn init_db_version(&self) -> Result<(), Error> {
        self.migrations.init_db_version(self.db)
    }

    pub fn db(&self) -> &Store {
        self.db
    }

    pub fn need_init(&self) -> Result<bool, Error> {
        self.migrations.need_init(self.db)
    }

    pub fn init_or_check<P: AsRef<Path>>(&self, path: P) -> Result<&Store, String> {
        if self.need_init().map_err(|e| e.to_string())? {
            info!("begin to init db version ...");
            self.init_db_version().map_err(|e| e.to_string())?;
            return Ok(self.db());
        }
        match self.check().map_err(|e| e.to_string())? {
            Ordering::Greater => {
                error!(
                    "The database was created by a newer wtledger binary and cannot be opened by this one"
                );
                Err("incompatible database, need to upgrade wtledger binary".to_string())
            }
            Ordering::Equal => Ok(self.db()),
            Ordering::Less => Err(format!(
                "The database needs to be migrated, please run `wtledger --ledger-store-path {} migrate` first.",
                path.as_ref().display()
            )),
        }
    }
}
