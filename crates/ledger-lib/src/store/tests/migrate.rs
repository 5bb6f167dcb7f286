use crate::store::db_migrate::DbMigrate;
use crate::store::migration::{
    DefaultMigration, Migration, Migrations, LATEST_DB_VERSION, MIGRATION_VERSION_KEY,
};
use crate::store::Store;
use crate::tests::test_utils::TempDir;
use crate::Error;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

fn open_store() -> (Store, TempDir) {
    let dir = TempDir::new("test-store-migrate");
    let store = Store::open_db(dir.as_ref()).unwrap();
    (store, dir)
}

#[test]
fn test_default_migration() {
    let (store, _dir) = open_store();
    let migrate = DbMigrate::new(&store);
    assert!(migrate.need_init().unwrap());
    assert_eq!(migrate.check().unwrap(), Ordering::Less);
    migrate.init_db_version().unwrap();
    assert!(!migrate.need_init().unwrap());
    assert_eq!(migrate.check().unwrap(), Ordering::Equal);
    assert_eq!(
        store.get(MIGRATION_VERSION_KEY).unwrap(),
        Some(LATEST_DB_VERSION.as_bytes().to_vec())
    );
}

#[test]
fn test_store_new_initializes_version() {
    let dir = TempDir::new("test-store-init");
    {
        let store = Store::new(dir.as_ref()).unwrap();
        assert_eq!(DbMigrate::new(&store).check().unwrap(), Ordering::Equal);
    }
    // Re-opening an initialized store passes the version check.
    assert!(Store::new(dir.as_ref()).is_ok());
}

#[test]
fn test_reject_store_from_newer_binary() {
    let dir = TempDir::new("test-store-newer");
    {
        let store = Store::open_db(dir.as_ref()).unwrap();
        store.put(MIGRATION_VERSION_KEY, "99991231235959").unwrap();
    }
    let err = Store::new(dir.as_ref()).unwrap_err();
    assert!(err.contains("incompatible database"), "{}", err);
}

#[test]
fn test_require_migration_for_older_store() {
    let dir = TempDir::new("test-store-older");
    {
        let store = Store::open_db(dir.as_ref()).unwrap();
        store.put(MIGRATION_VERSION_KEY, "20000101000000").unwrap();
    }
    let err = Store::new(dir.as_ref()).unwrap_err();
    assert!(err.contains("wtledger --ledger-store-path"), "{}", err);
}

#[test]
fn test_run_migration() {
    let run_count = Arc::new(RwLock::new(0));

    struct CountingMigration {
        version: String,
        run_count: Arc<RwLock<usize>>,
    }

    impl Migration for CountingMigration {
        fn migrate<'a>(&self, db: &'a Store) -> Result<&'a Store, Error> {
            *self.run_count.write().unwrap() += 1;
            Ok(db)
        }

        fn version(&self) -> &str {
            &self.version
        }
    }

    let (store, _dir) = open_store();
    store.put(MIGRATION_VERSION_KEY, "20000101000000").unwrap();

    let mut migrations = Migrations::default();
    migrations.add_migration(Arc::new(CountingMigration {
        version: "20000101000000".to_string(),
        run_count: run_count.clone(),
    }));
    migrations.add_migration(Arc::new(DefaultMigration::new()));
    // Same version as the default migration, replaces it.
    migrations.add_migration(Arc::new(CountingMigration {
        version: LATEST_DB_VERSION.to_string(),
        run_count: run_count.clone(),
    }));

    migrations.migrate(&store).unwrap();
    // Only migrations newer than the stored version run.
    assert_eq!(*run_count.read().unwrap(), 1);
    assert_eq!(migrations.check(&store).unwrap(), Ordering::Equal);
}

#[test]
fn test_migration_downgrade_is_rejected() {
    let (store, _dir) = open_store();
    store.put(MIGRATION_VERSION_KEY, "99991231235959").unwrap();

    let migrate = DbMigrate::new(&store);
    assert_eq!(migrate.check().unwrap(), Ordering::Greater);
    assert!(matches!(migrate.migrate(), Err(Error::DBInternalError(_))));
}
