use super::{BoardStore, StoreError};
use crate::model::{BoardRecord, Credentials};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the
/// parent directory exists. Leaves in-memory URLs untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }

    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let expanded = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{expanded}?{q}"),
        None => format!("sqlite://{expanded}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Load the singleton credential record, if it was created already.
#[instrument(skip_all)]
pub async fn load_credentials(pool: &Pool) -> Result<Option<Credentials>> {
    let row = sqlx::query(
        "SELECT login_user, login_pass, smtp_server, smtp_port, smtp_from, smtp_to, smtp_user, smtp_password \
         FROM credentials WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|row| Credentials {
        login_user: row.get("login_user"),
        login_pass: row.get("login_pass"),
        smtp_server: row.get("smtp_server"),
        smtp_port: row.get::<i64, _>("smtp_port") as u16,
        smtp_from: row.get("smtp_from"),
        smtp_to: row.get("smtp_to"),
        smtp_user: row.get("smtp_user"),
        smtp_password: row.get("smtp_password"),
    }))
}

/// Persist the singleton credential record. Fails if one exists already;
/// the table's check constraint keeps it to a single row.
#[instrument(skip_all)]
pub async fn save_credentials(pool: &Pool, creds: &Credentials) -> Result<()> {
    sqlx::query(
        "INSERT INTO credentials (id, login_user, login_pass, smtp_server, smtp_port, smtp_from, smtp_to, smtp_user, smtp_password, created_at) \
         VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&creds.login_user)
    .bind(&creds.login_pass)
    .bind(&creds.smtp_server)
    .bind(creds.smtp_port as i64)
    .bind(&creds.smtp_from)
    .bind(&creds.smtp_to)
    .bind(&creds.smtp_user)
    .bind(&creds.smtp_password)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// SQLite-backed `BoardStore`. Every call is a single statement, committed
/// before it returns.
#[derive(Clone)]
pub struct SqliteBoards {
    pool: Pool,
}

impl SqliteBoards {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoardStore for SqliteBoards {
    async fn get(&self, id: i64) -> Result<Option<BoardRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, my_country, date, phase, order_status, has_mail FROM boards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| BoardRecord {
            id: row.get("id"),
            name: row.get("name"),
            my_country: row.get("my_country"),
            date: row.get("date"),
            phase: row.get("phase"),
            order_status: row.get("order_status"),
            has_mail: row.get("has_mail"),
        }))
    }

    async fn insert(&self, record: &BoardRecord) -> Result<(), StoreError> {
        let now = Utc::now();
        let res = sqlx::query(
            "INSERT INTO boards (id, name, my_country, date, phase, order_status, has_mail, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.my_country)
        .bind(&record.date)
        .bind(&record.phase)
        .bind(&record.order_status)
        .bind(record.has_mail)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;
        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateKey(record.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &BoardRecord) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE boards SET date = ?, phase = ?, order_status = ?, has_mail = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&record.date)
        .bind(&record.phase)
        .bind(&record.order_status)
        .bind(record.has_mail)
        .bind(Utc::now())
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }
}
