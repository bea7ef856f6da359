use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result};

/// A user who has started the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Telegram ID of the user
    pub telegram_id: i64,
    /// Telegram username, if the user has one
    pub username: Option<String>,
    /// RFC 3339 timestamp of the first `/start`
    pub joined_at: String,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and creates the
/// `users` table if it does not exist yet.
///
/// # Example
///
/// ```no_run
/// use imglinker::storage::db;
///
/// let pool = db::create_pool("database.sqlite")?;
/// # Ok::<(), r2d2::Error>(())
/// ```
pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = init_schema(&conn) {
        log::warn!("Failed to initialize schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool. It returns to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> std::result::Result<DbConnection, r2d2::Error> {
    pool.get()
}

fn init_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            username TEXT,
            joined_at TEXT NOT NULL
        );",
    )
}

/// Registers a user. Returns `true` when the row was newly inserted and
/// `false` when the user already existed (the stored row is left untouched).
pub fn add_user(conn: &DbConnection, telegram_id: i64, username: Option<&str>) -> Result<bool> {
    let joined_at = chrono::Utc::now().to_rfc3339();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (telegram_id, username, joined_at) VALUES (?1, ?2, ?3)",
        params![telegram_id, username, joined_at],
    )?;
    Ok(inserted > 0)
}

pub fn get_user(conn: &DbConnection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT telegram_id, username, joined_at FROM users WHERE telegram_id = ?1",
        params![telegram_id],
        |row| {
            Ok(User {
                telegram_id: row.get(0)?,
                username: row.get(1)?,
                joined_at: row.get(2)?,
            })
        },
    )
    .optional()
}

/// All users ordered by join time, used by `/broadcast`
pub fn get_all_users(conn: &DbConnection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT telegram_id, username, joined_at FROM users ORDER BY joined_at, telegram_id")?;
    let rows = stmt.query_map([], |row| {
        Ok(User {
            telegram_id: row.get(0)?,
            username: row.get(1)?,
            joined_at: row.get(2)?,
        })
    })?;

    rows.collect()
}

pub fn count_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
