pub mod migrations;
pub mod queries;

use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use rusqlite::Connection;

/// Owned handle to the record store.
///
/// The connection is opened on first use and then reused by every request
/// until [`Store::close`] tears it down. Access is serialized through the
/// mutex, so a caller holding the closure passed to [`Store::with_conn`]
/// has the connection to itself.
pub struct Store {
    url: String,
    conn: Mutex<Option<Connection>>,
}

impl Store {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conn: Mutex::new(None),
        }
    }

    pub fn with_conn<T, E>(&self, f: impl FnOnce(&mut Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        if guard.is_none() {
            *guard = Some(open(&self.url)?);
        }

        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(anyhow::anyhow!("store connection unavailable").into()),
        }
    }

    /// Establishes the connection if needed and checks it answers.
    pub fn ping(&self) -> anyhow::Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .context("store did not answer ping")?;
            Ok(())
        })
    }

    pub fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Closes the connection. The next operation re-opens it.
    pub fn close(&self) -> anyhow::Result<()> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(conn) = conn {
            conn.close()
                .map_err(|(_, e)| e)
                .context("failed to close database")?;
            tracing::info!("store connection closed");
        }
        Ok(())
    }
}

fn open(url: &str) -> anyhow::Result<Connection> {
    let path = url.strip_prefix("sqlite://").unwrap_or(url);
    let in_memory = path == ":memory:";

    tracing::info!(in_memory, "connecting to store");

    let conn = if in_memory {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    }
    .context("failed to open database")?;

    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;
    if !in_memory {
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("failed to set journal mode")?;
    }

    migrations::run_migrations(&conn)?;

    tracing::info!("store connected");
    Ok(conn)
}
