use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;
use uuid::Uuid;

/// Stored user record. Not `Serialize`: responses go through [`UserSummary`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

pub struct UserDB {
    conn: Connection,
}

impl UserDB {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a user. A taken username fails with the store's UNIQUE
    /// constraint error.
    pub fn create(&self, new_user: NewUser<'_>) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp();

        self.conn.execute(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![id, new_user.username, new_user.password_hash, new_user.is_admin, now, now],
        )?;

        Ok(User {
            id,
            username: new_user.username.to_string(),
            password_hash: new_user.password_hash.to_string(),
            is_admin: new_user.is_admin,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash, is_admin, created_at, updated_at
                 FROM users WHERE username = ?",
                params![username],
                user_from_row,
            )
            .optional()
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash, is_admin, created_at, updated_at
                 FROM users WHERE id = ?",
                params![id],
                user_from_row,
            )
            .optional()
    }

    /// All users, oldest first, without password hashes
    pub fn list(&self) -> Result<Vec<UserSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, is_admin, created_at, updated_at
             FROM users ORDER BY created_at, rowid",
        )?;

        let users = stmt
            .query_map([], |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_admin: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}

/// Create the users table; the posts listing joins against it, so the blog
/// store calls this too.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Store timestamp: UTC, microsecond precision, so string order is time order.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
