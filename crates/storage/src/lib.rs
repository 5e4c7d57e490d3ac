use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for managing tenant sessions.
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A tenant session: the university scope plus the backend bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub university_name: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository storing tenant sessions.
///
/// Expiry is sliding: every successful lookup through [`SessionRepository::touch`]
/// pushes `expires_at` forward by the configured ttl.
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a session with a generated id.
    pub async fn create(
        &self,
        university_name: &str,
        access_token: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Session, SessionError> {
        let university_name = university_name.trim();
        let access_token = access_token.trim();
        if university_name.is_empty() {
            return Err(SessionError::MissingUniversity);
        }
        if access_token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            university_name: university_name.to_string(),
            access_token: access_token.to_string(),
            created_at: now,
            last_seen_at: now,
            expires_at: now + ttl,
        };

        sqlx::query(
            "INSERT INTO sessions \
             (id, university_name, access_token, created_at, last_seen_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.university_name)
        .bind(&session.access_token)
        .bind(to_rfc3339(session.created_at))
        .bind(to_rfc3339(session.last_seen_at))
        .bind(to_rfc3339(session.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Loads a session that has not expired at `now`.
    pub async fn find_active(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query(
            "SELECT id, university_name, access_token, created_at, last_seen_at, expires_at \
             FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(id)
        .bind(to_rfc3339(now))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Session {
                id: row.get("id"),
                university_name: row.get("university_name"),
                access_token: row.get("access_token"),
                created_at: parse_timestamp(row.get("created_at"))?,
                last_seen_at: parse_timestamp(row.get("last_seen_at"))?,
                expires_at: parse_timestamp(row.get("expires_at"))?,
            })
        })
        .transpose()
    }

    /// Records activity and extends the expiry. Returns `false` when the
    /// session no longer exists.
    pub async fn touch(
        &self,
        id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, SessionError> {
        let result =
            sqlx::query("UPDATE sessions SET last_seen_at = ?, expires_at = ? WHERE id = ?")
                .bind(to_rfc3339(now))
                .bind(to_rfc3339(now + ttl))
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes a session. Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of the sessions still active at `now`.
    pub async fn active_ids(&self, now: DateTime<Utc>) -> Result<Vec<String>, SessionError> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM sessions WHERE expires_at > ?")
            .bind(to_rfc3339(now))
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Deletes every session expired at `now`, returning the removed ids.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, SessionError> {
        let rows = sqlx::query("DELETE FROM sessions WHERE expires_at <= ? RETURNING id")
            .bind(to_rfc3339(now))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("university name is required")]
    MissingUniversity,
    #[error("access token is required")]
    MissingToken,
    #[error("stored timestamp is invalid: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(&value).map(|parsed| parsed.with_timezone(&Utc))
}
