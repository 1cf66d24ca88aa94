use crate::*;
use sqlx::{MySqlPool, PgPool, mysql::MySqlPoolOptions, postgres::PgPoolOptions};
use std::time::{Duration, Instant};
use testcontainers::{
    ContainerRequest, GenericImage, ImageExt,
    core::{IntoContainerPort as _, WaitFor, logs::LogFrame},
    runners::AsyncRunner as _,
};
use tokio::sync::OnceCell;

pub type Container = testcontainers::ContainerAsync<GenericImage>;

const PG_USER: &str = "postgres";
const PG_PASS: &str = "postgres";
const MYSQL_PASS: &str = "mysql";

// --- Container Singletons ---
pub async fn postgres() -> &'static Container {
    static POSTGRES: OnceCell<Container> = OnceCell::const_new();
    POSTGRES.get_or_init(|| start("postgres", image)).await
}

pub async fn mysql() -> &'static Container {
    static MYSQL: OnceCell<Container> = OnceCell::const_new();
    MYSQL.get_or_init(|| start("mysql", mysql_image)).await
}

async fn start(name: &str, image: fn() -> ContainerRequest<GenericImage>) -> Container {
    const TRIES: u8 = 5;
    for attempt in 1..=TRIES {
        match container(name, image()).await {
            Ok(container) => return container,
            Err(e) => {
                error!("Attempt {attempt}/{TRIES} failed: {e:?}");
                if attempt == TRIES {
                    error!("Fatal: All attempts failed");
                    std::process::exit(1);
                }
            }
        }
    }
    unreachable!()
}

// --- Pool Helpers ---
/// Connection URL for `database` inside the shared test container.
pub async fn database_url(database: &str) -> String {
    let container: &Container = postgres().await;
    format!(
        "postgres://{PG_USER}:{PG_PASS}@{}:{}/{database}",
        container.get_host().await.expect("container host"),
        container
            .get_host_port_ipv4(5432)
            .await
            .expect("container port")
    )
}

/// Create a new PostgreSQL connection pool to the test container.
pub(super) async fn pool(database: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config().max_connections)
        .connect(&database_url(database).await)
        .await
        .expect("db init connection failure")
}

/// Connection URL for `database` inside the shared mysql test container.
pub async fn mysql_database_url(database: &str) -> String {
    let container: &Container = mysql().await;
    format!(
        "mysql://root:{MYSQL_PASS}@{}:{}/{database}",
        container.get_host().await.expect("container host"),
        container
            .get_host_port_ipv4(3306)
            .await
            .expect("container port")
    )
}

pub(super) async fn mysql_pool(database: &str) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(config().max_connections)
        .connect(&mysql_database_url(database).await)
        .await
        .expect("db init connection failure")
}

// --- Container Setup ---
async fn container(name: &str, image: ContainerRequest<GenericImage>) -> Result<Container> {
    debug!("Starting {name} container for metadata tests");
    let container_startup = Instant::now();
    let container = image.start().await.expect("db startup failure");
    let container_startup = container_startup.elapsed();
    debug!("Container ready in {:#.2?}", container_startup);
    Ok(container)
}

fn image() -> ContainerRequest<GenericImage> {
    const PG_INIT_SQL: &[u8] = b" -- Initialize Postgres
        ALTER SYSTEM SET fsync = off;
        ALTER SYSTEM SET synchronous_commit = off;
        ALTER SYSTEM SET full_page_writes = off;
        ALTER SYSTEM SET shared_buffers = '128MB';
        ALTER SYSTEM SET max_wal_size = '128MB';
        ALTER SYSTEM SET work_mem = '16MB';
        ALTER SYSTEM SET maintenance_work_mem = '64MB';
        ALTER SYSTEM SET wal_level = 'replica';";

    const fn gb(gb: u64) -> u64 {
        gb * 1024 * 1024 * 1024
    }

    let mut image = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stderr("listening on IPv6 address"))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_copy_to("/docker-entrypoint-initdb.d/init.sql", PG_INIT_SQL.to_vec())
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASS)
        .with_env_var("POSTGRES_DB", "postgres");

    if config().container_logs {
        image = image.with_log_consumer(|line: &LogFrame| trace!("[postgres] {line:?}"));
    }

    if config().container_ramdisked {
        image = image
            .with_env_var("PGDATA", "/dev/shm/pgdata")
            .with_shm_size(gb(2)); // NOTE: Increase if test db runs out of space
    }

    image.with_startup_timeout(Duration::from_secs(60))
}

fn mysql_image() -> ContainerRequest<GenericImage> {
    let mut image = GenericImage::new("mysql", "8.4")
        .with_exposed_port(3306.tcp())
        // The init phase runs a temporary server on port 0 first.
        .with_wait_for(WaitFor::message_on_stderr("port: 3306"))
        .with_env_var("MYSQL_ROOT_PASSWORD", MYSQL_PASS);

    if config().container_logs {
        image = image.with_log_consumer(|line: &LogFrame| trace!("[mysql] {line:?}"));
    }

    image.with_startup_timeout(Duration::from_secs(120))
}
