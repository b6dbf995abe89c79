use crate::users::{self, timestamp};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;
use uuid::Uuid;

/// Number of posts returned by the public listing
pub const LATEST_LIMIT: usize = 18;

/// Post as stored, author by id
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Post with its author resolved to a username
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover: String,
    pub author: Option<AuthorRef>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
}

pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover: String,
    pub author: String,
}

/// Fields replaced by an update; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover: Option<String>,
}

pub struct BlogDB {
    conn: Connection,
}

impl BlogDB {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        users::ensure_schema(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                content TEXT NOT NULL,
                cover TEXT NOT NULL,
                author_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn create(&self, post: NewPost) -> Result<Post> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp();

        self.conn.execute(
            "INSERT INTO posts (id, title, summary, content, cover, author_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![id, post.title, post.summary, post.content, post.cover, post.author, now, now],
        )?;

        Ok(Post {
            id,
            title: post.title,
            summary: post.summary,
            content: post.content,
            cover: post.cover,
            author: post.author,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Post>> {
        self.conn
            .query_row(
                "SELECT id, title, summary, content, cover, author_id, created_at, updated_at
                 FROM posts WHERE id = ?",
                params![id],
                post_from_row,
            )
            .optional()
    }

    pub fn get_with_author(&self, id: &str) -> Result<Option<PostView>> {
        self.conn
            .query_row(
                "SELECT p.id, p.title, p.summary, p.content, p.cover, p.created_at, p.updated_at,
                        u.id, u.username
                 FROM posts p LEFT JOIN users u ON u.id = p.author_id
                 WHERE p.id = ?",
                params![id],
                view_from_row,
            )
            .optional()
    }

    /// Newest first; posts created in the same microsecond keep insertion order.
    pub fn list_latest(&self, limit: usize) -> Result<Vec<PostView>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.summary, p.content, p.cover, p.created_at, p.updated_at,
                    u.id, u.username
             FROM posts p LEFT JOIN users u ON u.id = p.author_id
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?",
        )?;

        let posts = stmt
            .query_map(params![limit as i64], view_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Apply `changes` and return the stored result, or `None` if no such post.
    pub fn update(&self, id: &str, changes: PostChanges) -> Result<Option<Post>> {
        let Some(mut post) = self.get(id)? else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(summary) = changes.summary {
            post.summary = summary;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(cover) = changes.cover {
            post.cover = cover;
        }
        post.updated_at = timestamp();

        self.conn.execute(
            "UPDATE posts SET title = ?, summary = ?, content = ?, cover = ?, updated_at = ?
             WHERE id = ?",
            params![post.title, post.summary, post.content, post.cover, post.updated_at, post.id],
        )?;

        Ok(Some(post))
    }

    /// Returns false if there was nothing to delete
    pub fn delete(&self, id: &str) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM posts WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}

fn post_from_row(row: &Row<'_>) -> Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        content: row.get(3)?,
        cover: row.get(4)?,
        author: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn view_from_row(row: &Row<'_>) -> Result<PostView> {
    let author_id: Option<String> = row.get(7)?;
    let author_name: Option<String> = row.get(8)?;
    let author = match (author_id, author_name) {
        (Some(id), Some(username)) => Some(AuthorRef { id, username }),
        _ => None,
    };

    Ok(PostView {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        content: row.get(3)?,
        cover: row.get(4)?,
        author,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
