use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;

pub mod draws;
pub mod sync_meta;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const CREATE_TABLES: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS draws (
        draw_no INTEGER PRIMARY KEY NOT NULL,
        draw_date DATE NOT NULL,
        n1 INTEGER NOT NULL,
        n2 INTEGER NOT NULL,
        n3 INTEGER NOT NULL,
        n4 INTEGER NOT NULL,
        n5 INTEGER NOT NULL,
        n6 INTEGER NOT NULL,
        bonus INTEGER NOT NULL,
        first_prize_amount BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sync_meta (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )",
];

#[derive(Debug)]
struct SqliteConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // using WAL mode for better concurrency
        diesel::sql_query("PRAGMA journal_mode = WAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // ! may lose the last transaction on crash
        diesel::sql_query("PRAGMA synchronous = NORMAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        diesel::sql_query("PRAGMA busy_timeout = 30000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

/// Local draw history backed by SQLite.
#[derive(Clone)]
pub struct Datastore {
    pool: DbPool,
}

impl Datastore {
    /// Opens (or creates) the database at `database_url` and makes sure the
    /// tables exist.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        if let Some(parent) = std::path::Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow::anyhow!("Failed to create directory {}: {e}", parent.display())
                })?;
            }
        }

        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)
            .map_err(|e| {
                let err_message = format!("Error connecting to {database_url}: {e}");
                log::error!("{err_message}");
                anyhow::anyhow!("{err_message}")
            })?;

        let store = Self { pool };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> anyhow::Result<()> {
        let mut conn = self.connection()?;
        for statement in CREATE_TABLES {
            diesel::sql_query(statement)
                .execute(&mut conn)
                .map_err(|e| anyhow::anyhow!("Failed to create tables: {e}"))?;
        }
        Ok(())
    }

    pub(crate) fn connection(&self) -> anyhow::Result<DbConnection> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get DB connection: {e}"))
    }
}
