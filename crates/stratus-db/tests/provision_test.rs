//! Provisioning pipeline tests against a fake cluster.
//!
//! The fakes record every cluster action in a ledger so tests can
//! assert both the forward order and that a failure at any step
//! leaves no orphaned database, login or catalog row.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use stratus_core::error::{ProvisionStep, StratusError};
use stratus_core::models::tenant::CreateTenant;
use stratus_core::repository::TenantCatalog;
use stratus_db::provision::{
    ClusterAdmin, MigrationRunner, ProvisioningService, SeedRunner, TenantProvisioner,
};
use stratus_db::repository::SurrealTenantCatalog;
use stratus_db::{MigrationSet, PasswordCipher, run_migrations};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::engine::local::Mem;

type Ledger = Arc<Mutex<Vec<String>>>;

#[derive(Clone)]
struct FakeAdmin {
    ledger: Ledger,
    fail_at: Option<ProvisionStep>,
}

impl FakeAdmin {
    fn record(&self, action: &str, step: ProvisionStep) -> Result<(), StratusError> {
        self.ledger.lock().unwrap().push(action.to_string());
        if self.fail_at == Some(step) {
            return Err(StratusError::Database(format!("simulated {step} failure")));
        }
        Ok(())
    }
}

impl ClusterAdmin for FakeAdmin {
    async fn create_database(&self, db_name: &str) -> Result<(), StratusError> {
        self.record(&format!("create_database {db_name}"), ProvisionStep::CreateDatabase)
    }

    async fn create_login(
        &self,
        _db_name: &str,
        user: &str,
        _password: &str,
    ) -> Result<(), StratusError> {
        self.record(&format!("create_login {user}"), ProvisionStep::CreateLogin)
    }

    async fn grant_ownership(
        &self,
        _db_name: &str,
        user: &str,
        _password: &str,
    ) -> Result<(), StratusError> {
        self.record(&format!("grant_ownership {user}"), ProvisionStep::GrantOwnership)
    }

    async fn connect(
        &self,
        _db_name: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Surreal<Any>, StratusError> {
        self.record("connect", ProvisionStep::BindConnection)?;
        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StratusError::Database(e.to_string()))?;
        db.use_ns("test")
            .use_db("tenant")
            .await
            .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(db)
    }

    async fn terminate_sessions(&self, db_name: &str) -> Result<(), StratusError> {
        self.ledger
            .lock()
            .unwrap()
            .push(format!("terminate_sessions {db_name}"));
        Ok(())
    }

    async fn drop_login(&self, _db_name: &str, user: &str) -> Result<(), StratusError> {
        self.ledger.lock().unwrap().push(format!("drop_login {user}"));
        Ok(())
    }

    async fn drop_database(&self, db_name: &str) -> Result<(), StratusError> {
        self.ledger
            .lock()
            .unwrap()
            .push(format!("drop_database {db_name}"));
        Ok(())
    }
}

#[derive(Clone)]
struct FakeMigrations {
    ledger: Ledger,
    fail: bool,
}

impl MigrationRunner for FakeMigrations {
    async fn run(&self, _db: &Surreal<Any>) -> Result<(), StratusError> {
        self.ledger.lock().unwrap().push("migrate".into());
        if self.fail {
            return Err(StratusError::Database("simulated migrate failure".into()));
        }
        Ok(())
    }
}

#[derive(Clone)]
struct FakeSeeder {
    ledger: Ledger,
    fail: bool,
}

impl SeedRunner for FakeSeeder {
    async fn run(&self, _db: &Surreal<Any>) -> Result<(), StratusError> {
        self.ledger.lock().unwrap().push("seed".into());
        if self.fail {
            return Err(StratusError::Database("simulated seed failure".into()));
        }
        Ok(())
    }
}

struct Harness {
    service: ProvisioningService<
        SurrealTenantCatalog<surrealdb::engine::local::Db>,
        FakeAdmin,
        FakeMigrations,
        FakeSeeder,
    >,
    catalog: SurrealTenantCatalog<surrealdb::engine::local::Db>,
    ledger: Ledger,
}

async fn harness(fail_at: Option<ProvisionStep>) -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("master").await.unwrap();
    run_migrations(&db, MigrationSet::Master).await.unwrap();
    let catalog = SurrealTenantCatalog::new(db, PasswordCipher::new([7u8; 32]));

    let ledger: Ledger = Arc::new(Mutex::new(Vec::new()));
    let service = ProvisioningService::new(
        catalog.clone(),
        FakeAdmin {
            ledger: ledger.clone(),
            fail_at,
        },
        FakeMigrations {
            ledger: ledger.clone(),
            fail: fail_at == Some(ProvisionStep::Migrate),
        },
        FakeSeeder {
            ledger: ledger.clone(),
            fail: fail_at == Some(ProvisionStep::Seed),
        },
        "stratus_".into(),
    );

    Harness {
        service,
        catalog,
        ledger,
    }
}

fn sample(slug: &str) -> CreateTenant {
    CreateTenant {
        name: format!("Tenant {slug}"),
        slug: slug.into(),
        db_name: slug.replace('-', "_"),
        db_user: format!("{}_user", slug.replace('-', "_")),
        db_password: "password123".into(),
        expiration_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        position: None,
    }
}

#[tokio::test]
async fn successful_provision_runs_steps_in_order() {
    let h = harness(None).await;

    let tenant = h.service.provision(sample("acme")).await.unwrap();
    assert_eq!(tenant.slug, "acme");

    let ledger = h.ledger.lock().unwrap().clone();
    assert_eq!(
        ledger,
        vec![
            "create_database stratus_acme",
            "create_login acme_user",
            "grant_ownership acme_user",
            "connect",
            "migrate",
            "seed",
        ]
    );

    // The catalog row survives.
    assert!(h.catalog.get_by_slug("acme").await.is_ok());
}

#[tokio::test]
async fn taken_slug_fails_before_any_cluster_work() {
    let h = harness(None).await;

    h.service.provision(sample("acme")).await.unwrap();
    let before = h.ledger.lock().unwrap().len();

    let err = h.service.provision(sample("acme")).await.unwrap_err();
    assert!(matches!(err, StratusError::SlugInUse { .. }));

    // No additional cluster actions, no rollback.
    assert_eq!(h.ledger.lock().unwrap().len(), before);
}

#[tokio::test]
async fn failure_at_create_login_rolls_back_everything() {
    let h = harness(Some(ProvisionStep::CreateLogin)).await;

    let err = h.service.provision(sample("acme")).await.unwrap_err();
    let StratusError::Provisioning { step, source } = err else {
        panic!("expected provisioning error");
    };
    assert_eq!(step, ProvisionStep::CreateLogin);
    assert!(matches!(*source, StratusError::Database(_)));

    let ledger = h.ledger.lock().unwrap().clone();
    // Login removal precedes database removal.
    let drop_login = ledger.iter().position(|a| a == "drop_login acme_user").unwrap();
    let drop_db = ledger
        .iter()
        .position(|a| a == "drop_database stratus_acme")
        .unwrap();
    assert!(drop_login < drop_db);

    // The catalog row is gone.
    let err = h.catalog.get_by_slug("acme").await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn failure_at_migrate_names_the_step() {
    let h = harness(Some(ProvisionStep::Migrate)).await;

    let err = h.service.provision(sample("acme")).await.unwrap_err();
    let StratusError::Provisioning { step, .. } = err else {
        panic!("expected provisioning error");
    };
    assert_eq!(step, ProvisionStep::Migrate);

    // Database and login were created, so both get dropped.
    let ledger = h.ledger.lock().unwrap().clone();
    assert!(ledger.contains(&"drop_database stratus_acme".to_string()));
    assert!(ledger.contains(&"drop_login acme_user".to_string()));
}

#[tokio::test]
async fn failure_at_seed_still_removes_catalog_row() {
    let h = harness(Some(ProvisionStep::Seed)).await;

    let err = h.service.provision(sample("acme")).await.unwrap_err();
    assert!(matches!(
        err,
        StratusError::Provisioning {
            step: ProvisionStep::Seed,
            ..
        }
    ));

    let err = h.catalog.get_by_slug("acme").await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));

    // The slug is free again, so a retry is not blocked by the
    // failed attempt.
    assert!(!h.catalog.slug_in_use("acme", None).await.unwrap());
}
