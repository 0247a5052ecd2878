//! Embedded `PostgreSQL` cluster shared by the integration tests.
//!
//! The cluster is started once per test binary. Unprivileged runs drive the
//! server in-process. Root runs hand setup and start to the `pg_worker`
//! binary, which drops to `nobody` because `initdb` refuses to run as root.
//! A cluster that cannot start fails the test that asked for it.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use diesel::prelude::*;
use eyre::{Result, WrapErr, eyre};
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{
    ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests, detect_execution_privileges,
};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::runtime::Runtime;

const WORKER_ENV: &str = "PG_EMBEDDED_WORKER";

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();

/// Shared cluster handle.
pub type PostgresCluster = &'static ManagedCluster;

/// A running embedded server and, for in-process runs, the runtime that
/// drives it.
pub struct ManagedCluster {
    settings: Settings,
    #[expect(dead_code, reason = "keeps the in-process server owned for the test binary")]
    postgres: Option<PostgreSQL>,
    #[expect(dead_code, reason = "the in-process server handle needs its runtime alive")]
    runtime: Option<Runtime>,
}

impl ManagedCluster {
    fn start() -> Result<Self> {
        let mut overrides = port_override()?;
        if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
            && std::env::var_os(WORKER_ENV).is_none()
        {
            let worker = stage_worker_binary()?;
            overrides.push((OsString::from(WORKER_ENV), Some(OsString::from(worker.as_str()))));
        }

        let mut bootstrap = with_env(&overrides, bootstrap_for_tests)
            .wrap_err("bootstrap embedded PostgreSQL")?;
        sync_password_from_file(&mut bootstrap.settings)?;
        let env_vars = bootstrap.environment.to_env();

        match bootstrap.privileges {
            ExecutionPrivileges::Root => Self::start_via_worker(&bootstrap, &env_vars),
            ExecutionPrivileges::Unprivileged => Self::start_in_process(&bootstrap, &env_vars),
        }
    }

    fn start_in_process(
        bootstrap: &TestBootstrapSettings,
        env_vars: &[(String, Option<String>)],
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("build cluster runtime")?;
        let mut postgres = PostgreSQL::new(bootstrap.settings.clone());
        with_env(&to_os_env(env_vars), || {
            runtime.block_on(async {
                postgres.setup().await?;
                if !matches!(postgres.status(), Status::Started) {
                    postgres.start().await?;
                }
                Ok::<(), postgresql_embedded::Error>(())
            })
        })
        .wrap_err("start embedded PostgreSQL")?;

        let mut settings = postgres.settings().clone();
        sync_port_from_pid(&mut settings)?;
        Ok(Self {
            settings,
            postgres: Some(postgres),
            runtime: Some(runtime),
        })
    }

    fn start_via_worker(
        bootstrap: &TestBootstrapSettings,
        env_vars: &[(String, Option<String>)],
    ) -> Result<Self> {
        let worker = bootstrap
            .worker_binary
            .as_deref()
            .ok_or_else(|| eyre!("{WORKER_ENV} was not picked up by the bootstrap"))?;
        let step = |operation: WorkerOperation, timeout: Duration| {
            let args = WorkerRequestArgs {
                worker,
                settings: &bootstrap.settings,
                env_vars,
                operation,
                timeout,
            };
            run_worker(&WorkerRequest::new(args))
        };
        step(WorkerOperation::Setup, bootstrap.setup_timeout).wrap_err("pg_worker setup")?;
        step(WorkerOperation::Start, bootstrap.start_timeout).wrap_err("pg_worker start")?;

        let mut settings = bootstrap.settings.clone();
        sync_port_from_pid(&mut settings)?;
        Ok(Self {
            settings,
            postgres: None,
            runtime: None,
        })
    }

    /// Returns the connection URL for `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.settings.url(database)
    }

    /// Creates an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error when the admin connection or the statement fails.
    pub fn create_database(&self, name: &str) -> Result<()> {
        self.execute_admin_sql(&format!("CREATE DATABASE {}", quote_identifier(name)))
    }

    /// Drops a database, terminating any connection still open on it.
    ///
    /// # Errors
    ///
    /// Returns an error when the admin connection or the statement fails.
    pub fn drop_database(&self, name: &str) -> Result<()> {
        self.execute_admin_sql(&format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(name)
        ))
    }

    fn execute_admin_sql(&self, sql: &str) -> Result<()> {
        let mut conn = PgConnection::establish(&self.database_url("postgres"))
            .wrap_err("connect to admin database")?;
        diesel::sql_query(sql)
            .execute(&mut conn)
            .wrap_err_with(|| format!("execute `{sql}`"))?;
        Ok(())
    }
}

/// Provides the shared cluster.
///
/// # Panics
///
/// Panics when the cluster cannot be started, so `PostgreSQL` coverage is
/// never reported as passing without having run.
#[fixture]
pub fn postgres_cluster() -> PostgresCluster {
    SHARED_CLUSTER.get_or_init(|| match ManagedCluster::start() {
        Ok(cluster) => cluster,
        Err(err) => panic!("SKIP-TEST-CLUSTER: failed to start PostgreSQL: {err:#}"),
    })
}

/// Copies `pg_worker` somewhere `nobody` can execute it; the build
/// directory usually sits under root's home.
fn stage_worker_binary() -> Result<Utf8PathBuf> {
    let source = Utf8Path::new(env!("CARGO_BIN_EXE_pg_worker"));
    let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir())
        .map_err(|err| eyre!("temporary directory is not UTF-8: {err}"))?;
    let staged_name = format!("tarefas_pg_worker_{}", std::process::id());

    let (source_dir, source_name) = open_parent_dir(source)?;
    let target_dir = open_dir(&temp_dir)?;
    source_dir
        .copy(source_name, &target_dir, &staged_name)
        .wrap_err("copy pg_worker to the temporary directory")?;
    #[cfg(unix)]
    {
        use cap_std::fs::{Permissions, PermissionsExt};
        target_dir
            .set_permissions(&staged_name, Permissions::from_mode(0o755))
            .wrap_err("make staged pg_worker executable")?;
    }
    Ok(temp_dir.join(staged_name))
}

fn open_dir(path: &Utf8Path) -> Result<Dir> {
    Dir::open_ambient_dir(path, ambient_authority()).wrap_err_with(|| format!("open {path}"))
}

fn open_parent_dir(path: &Utf8Path) -> Result<(Dir, &str)> {
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("{path} has no file name"))?;
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    Ok((open_dir(parent)?, name))
}

/// Reads the file at `path`, or `None` if it does not exist.
fn read_optional(path: &std::path::Path) -> Result<Option<String>> {
    let utf8 = Utf8Path::from_path(path).ok_or_else(|| eyre!("{} is not UTF-8", path.display()))?;
    let (dir, name) = open_parent_dir(utf8)?;
    match dir.read_to_string(name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).wrap_err_with(|| format!("read {utf8}")),
    }
}

/// The bootstrap may generate a password file instead of using the
/// configured password.
fn sync_password_from_file(settings: &mut Settings) -> Result<()> {
    let Some(contents) = read_optional(&settings.password_file)? else {
        return Ok(());
    };
    let password = contents.trim_end();
    if !password.is_empty() {
        password.clone_into(&mut settings.password);
    }
    Ok(())
}

/// Picks up the port the server actually bound from `postmaster.pid`.
fn sync_port_from_pid(settings: &mut Settings) -> Result<()> {
    let Some(contents) = read_optional(&settings.data_dir.join("postmaster.pid"))? else {
        return Ok(());
    };
    // The fourth line of postmaster.pid holds the port.
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}

/// Picks a free port unless `PG_PORT` is already set.
fn port_override() -> Result<Vec<(OsString, Option<OsString>)>> {
    if std::env::var_os("PG_PORT").is_some() {
        return Ok(Vec::new());
    }
    let listener = TcpListener::bind(("127.0.0.1", 0)).wrap_err("reserve a local port")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(vec![(
        OsString::from("PG_PORT"),
        Some(OsString::from(port.to_string())),
    )])
}

fn to_os_env(vars: &[(String, Option<String>)]) -> Vec<(OsString, Option<OsString>)> {
    vars.iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

/// Applies `vars` while `run` executes, then restores the previous values.
fn with_env<T>(vars: &[(OsString, Option<OsString>)], run: impl FnOnce() -> T) -> T {
    let previous: Vec<(OsString, Option<OsString>)> = vars
        .iter()
        .map(|(key, _)| (key.clone(), std::env::var_os(key)))
        .collect();
    apply_env(vars);
    let output = run();
    apply_env(&previous);
    output
}

fn apply_env(vars: &[(OsString, Option<OsString>)]) {
    for (key, value) in vars {
        // SAFETY: only cluster start-up mutates the environment, and it runs
        // once inside the `OnceLock` initializer.
        unsafe {
            match value {
                Some(new_value) => std::env::set_var(key, new_value),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
