//! An interactive database session: runs statements and keeps its completion
//! engine in step with the schema they change.
use crate::*;
use futures::{Stream, TryStreamExt as _};
use sqlx::{
    AssertSqlSafe, Column as _, Executor as _, MySqlPool, PgPool, SqlSafeStr as _,
    Statement as _, mysql::MySqlPoolOptions, postgres::PgPoolOptions,
};
use tokio::sync::Notify;

/// What executing a statement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `rows` stops counting at the session's `max_result`; `truncated` is set
    /// when the server had more.
    ResultSet {
        columns: Vec<String>,
        rows: u64,
        truncated: bool,
    },
    UpdateCount(u64),
}

enum Pool {
    Postgres(PgPool),
    MySql(MySqlPool),
}

/// One user's connection plus the completion engine serving their buffer.
pub struct Session {
    pool: Pool,
    engine: CompletionEngine<DatabaseSource>,
    trigger: RefreshTrigger,
    max_result: u64,
    cancel: Notify,
}

/// Count the rows of `rows`, stopping after `max_result`.
///
/// Returns the count and whether the stream had rows beyond it. Unread rows
/// are dropped with the stream.
pub async fn count_capped<T, E>(
    rows: impl Stream<Item = std::result::Result<T, E>>,
    max_result: u64,
) -> std::result::Result<(u64, bool), E> {
    let mut rows = std::pin::pin!(rows);
    let mut count = 0;
    while rows.try_next().await?.is_some() {
        if count == max_result {
            return Ok((count, true));
        }
        count += 1;
    }
    Ok((count, false))
}

// Same body for both pools; sqlx has no object-safe pool to share it through.
macro_rules! run_statement {
    ($name:ident, $pool:ty) => {
        async fn $name(pool: &$pool, sql: &str, max_result: u64) -> Result<Outcome> {
            let statement = pool.prepare(AssertSqlSafe(sql.to_owned()).into_sql_str()).await?;

            if statement.columns().is_empty() {
                let done = sqlx::query(AssertSqlSafe(sql.to_owned()))
                    .execute(pool)
                    .await?;
                return Ok(Outcome::UpdateCount(done.rows_affected()));
            }

            let columns = statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let rows = sqlx::query(AssertSqlSafe(sql.to_owned())).fetch(pool);
            let (rows, truncated) = count_capped(rows, max_result).await?;
            if truncated {
                debug!("Result set truncated after {rows} rows");
            }
            Ok(Outcome::ResultSet {
                columns,
                rows,
                truncated,
            })
        }
    };
}

run_statement!(run_postgres, PgPool);
run_statement!(run_mysql, MySqlPool);

impl Session {
    /// Connect to `url` and build the initial candidate set.
    ///
    /// The URL scheme picks the database: `postgres://` (or `postgresql://`)
    /// and `mysql://`. Anything else is `InvalidArgument`. Failing to reflect
    /// the schema does not fail the session; completions are unavailable until
    /// a later refresh succeeds.
    pub async fn open(url: &str, config: &Config) -> Result<Self> {
        let session = match Dialect::from_url(url)? {
            Dialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await?;
                Self::with_pool(pool, config).await
            }
            Dialect::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await?;
                Self::with_mysql_pool(pool, config).await
            }
        };
        Ok(session)
    }

    pub async fn with_pool(pool: PgPool, config: &Config) -> Self {
        let source = PgMetadataSource::new(pool.clone(), config.schema.clone());
        Self::connect(Pool::Postgres(pool), DatabaseSource::Postgres(source), config).await
    }

    pub async fn with_mysql_pool(pool: MySqlPool, config: &Config) -> Self {
        let source = MySqlMetadataSource::new(pool.clone(), config.schema.clone());
        Self::connect(Pool::MySql(pool), DatabaseSource::MySql(source), config).await
    }

    async fn connect(pool: Pool, source: DatabaseSource, config: &Config) -> Self {
        let engine = CompletionEngine::new(EngineOptions::from(config));
        let dialect = source.dialect();
        if let Err(e) = engine.on_connect(source).await {
            warn!("Session opened without completions: {e}");
        }
        debug!("Opened {dialect} session");
        Self {
            pool,
            engine,
            trigger: config.refresh_trigger(),
            max_result: config.max_result,
            cancel: Notify::new(),
        }
    }

    /// Run one statement.
    ///
    /// The statement is prepared first: if it describes result columns its rows
    /// are streamed and counted up to `max_result`, otherwise it is executed for
    /// its update count and the schema is refreshed in the background when the
    /// trigger allows. A concurrent [`cancel`](Self::cancel) ends it with
    /// `Error::Cancelled`.
    pub async fn execute(&self, sql: &str) -> Result<Outcome> {
        let run = async {
            match &self.pool {
                Pool::Postgres(pool) => run_postgres(pool, sql, self.max_result).await,
                Pool::MySql(pool) => run_mysql(pool, sql, self.max_result).await,
            }
        };
        let outcome = tokio::select! {
            outcome = run => outcome?,
            _ = self.cancel.notified() => {
                info!("Statement cancelled");
                return Err(Error::Cancelled);
            }
        };

        if let Outcome::UpdateCount(_) = outcome {
            if self.trigger.should_refresh(sql) {
                self.engine.notify_schema_may_have_changed();
            } else {
                trace!("Statement left the schema alone, no refresh ({})", self.trigger);
            }
        }
        Ok(outcome)
    }

    /// Abandon every statement currently running in [`execute`](Self::execute).
    ///
    /// The connection running it is dropped, which ends the statement on the
    /// server side. Statements started afterwards are unaffected.
    pub fn cancel(&self) {
        debug!("Cancelling running statements");
        self.cancel.notify_waiters();
    }

    /// Completions at `cursor`, empty when none are available.
    pub fn completion(&self, buffer: &str, cursor: usize) -> Vec<String> {
        self.engine.completion(buffer, cursor)
    }

    pub fn engine(&self) -> &CompletionEngine<DatabaseSource> {
        &self.engine
    }

    pub fn dialect(&self) -> Dialect {
        match self.pool {
            Pool::Postgres(_) => Dialect::Postgres,
            Pool::MySql(_) => Dialect::MySql,
        }
    }

    pub async fn close(self) {
        self.engine.on_disconnect();
        match self.pool {
            Pool::Postgres(pool) => pool.close().await,
            Pool::MySql(pool) => pool.close().await,
        }
        debug!("Session closed");
    }
}
