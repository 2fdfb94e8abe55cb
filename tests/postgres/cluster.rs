//! Embedded `PostgreSQL` cluster shared by the adapter tests.
//!
//! The cluster starts once per test binary on a free port. Each test gets its
//! own database with the Kanban migration applied; the database is dropped
//! when its guard goes out of scope.

use crate::test_helpers::EnvVarGuard;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::{ExecutionPrivileges, bootstrap_for_tests};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::OnceLock;
use tokio::runtime::Runtime;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Schema applied to every test database.
const KANBAN_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_kanban_tables/up.sql");

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();

/// Shared `PostgreSQL` cluster handle for integration tests.
pub type PostgresCluster = &'static ManagedCluster;

/// Running embedded cluster. The server lives as long as the test binary.
pub struct ManagedCluster {
    settings: Settings,
    _postgres: PostgreSQL,
    _runtime: Runtime,
}

impl ManagedCluster {
    fn start() -> Result<Self, BoxError> {
        let port_guard = EnvVarGuard::set_many(&[(
            OsString::from("PG_PORT"),
            Some(OsString::from(free_port()?.to_string())),
        )]);
        let bootstrap = bootstrap_for_tests().map_err(boxed)?;
        drop(port_guard);
        if matches!(bootstrap.privileges, ExecutionPrivileges::Root) {
            return Err("embedded PostgreSQL must run as an unprivileged user".into());
        }

        let mut settings = bootstrap.settings;
        sync_password_from_file(&mut settings)?;
        let env: Vec<(OsString, Option<OsString>)> = bootstrap
            .environment
            .to_env()
            .into_iter()
            .map(|(key, value)| (OsString::from(key), value.map(OsString::from)))
            .collect();
        let env_guard = EnvVarGuard::set_many(&env);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(boxed)?;
        let mut postgres = PostgreSQL::new(settings);
        runtime
            .block_on(async {
                postgres.setup().await?;
                if !matches!(postgres.status(), Status::Started) {
                    postgres.start().await?;
                }
                Ok::<(), postgresql_embedded::Error>(())
            })
            .map_err(boxed)?;
        drop(env_guard);

        Ok(Self {
            settings: postgres.settings().clone(),
            _postgres: postgres,
            _runtime: runtime,
        })
    }

    /// Returns the connection URL for `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.settings.url(database)
    }

    /// Creates a fresh database carrying the Kanban schema.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be created or migrated.
    pub async fn migrated_database(&'static self) -> Result<TemporaryDatabase, BoxError> {
        tokio::task::spawn_blocking(move || {
            let name = format!("kanban_{}", Uuid::new_v4().simple());
            self.execute_admin_sql(&format!("CREATE DATABASE \"{name}\""))?;
            let database = TemporaryDatabase {
                cluster: self,
                url: self.database_url(&name),
                name,
            };
            let mut conn = PgConnection::establish(&database.url).map_err(boxed)?;
            conn.batch_execute(KANBAN_SCHEMA_SQL).map_err(boxed)?;
            Ok(database)
        })
        .await
        .map_err(boxed)?
    }

    fn execute_admin_sql(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = PgConnection::establish(&self.database_url("postgres")).map_err(boxed)?;
        diesel::sql_query(sql).execute(&mut conn).map_err(boxed)?;
        Ok(())
    }
}

/// Database dropped on scope exit.
pub struct TemporaryDatabase {
    cluster: PostgresCluster,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Connection URL for this database.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name);
        if let Err(err) = self.cluster.execute_admin_sql(&sql) {
            tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
        }
    }
}

/// Provides the shared cluster, starting it on first use.
///
/// # Panics
///
/// Panics with a `SKIP-TEST-CLUSTER` marker when the cluster cannot start.
#[fixture]
pub fn postgres_cluster() -> Result<PostgresCluster, BoxError> {
    Ok(SHARED_CLUSTER.get_or_init(|| {
        // Startup blocks on its own runtime, so keep it off the test runtime.
        let started = std::thread::spawn(ManagedCluster::start)
            .join()
            .unwrap_or_else(|_| Err("cluster startup panicked".into()));
        match started {
            Ok(cluster) => cluster,
            Err(err) => panic!("SKIP-TEST-CLUSTER: failed to start PostgreSQL: {err}"),
        }
    }))
}

fn boxed(err: impl std::error::Error + Send + Sync + 'static) -> BoxError {
    Box::new(err)
}

fn free_port() -> Result<u16, BoxError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(boxed)?;
    Ok(listener.local_addr().map_err(boxed)?.port())
}

fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let password_file = settings.password_file.to_string_lossy().into_owned();
    let path = Utf8Path::new(&password_file);
    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Ok(());
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(boxed)?;
    match dir.read_to_string(file_name) {
        Ok(contents) => {
            let password = contents.trim_end();
            if !password.is_empty() {
                password.clone_into(&mut settings.password);
            }
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(boxed(err)),
    }
}
