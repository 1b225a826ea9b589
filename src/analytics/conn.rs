use deadpool_sqlite::Pool;
use rusqlite::Connection;
use std::time::Duration;

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle for bounded store calls. Each call checks out its own pooled
/// connection, so independent queries can run concurrently.
#[derive(Clone)]
pub struct SqliteReader {
    pool: Pool,
    timeout: Duration,
}

impl SqliteReader {
    pub fn new(pool: Pool) -> Self {
        Self::with_timeout(pool, QUERY_TIMEOUT)
    }

    pub fn with_timeout(pool: Pool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a blocking query on a pooled connection via `interact`.
    /// Waiting for a connection counts against the timeout.
    pub async fn query<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let call = async {
            let conn = self
                .pool
                .get()
                .await
                .map_err(|e| format!("pool error: {e}"))?;
            conn.interact(move |conn| f(conn))
                .await
                .map_err(|e| format!("interact error: {e}"))?
                .map_err(|e| format!("sqlite query error: {e}"))
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| format!("query timed out after {}ms", self.timeout.as_millis()))?
    }
}
