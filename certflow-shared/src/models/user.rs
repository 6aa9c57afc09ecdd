/// User model and database operations
///
/// This module provides the User model for learner and administrator
/// accounts. Accounts are created by signup or by the assignment workflow's
/// credential provisioner; the workflow never deletes them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'org_admin', 'learner');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(255),
///     role user_role NOT NULL DEFAULT 'learner',
///     password_hash VARCHAR(255),
///     must_reset_password BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `password_hash` is nullable: accounts imported from an organization
/// roster may exist before their owner can sign in. The provisioner fills
/// the hash and sets `must_reset_password` so the first sign-in forces a
/// change.
///
/// # Example
///
/// ```no_run
/// use certflow_shared::models::user::{CreateUser, User, UserRole};
/// use certflow_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "learner@example.com".to_string(),
///     name: Some("Jane Learner".to_string()),
///     role: UserRole::Learner,
///     password_hash: Some("$argon2id$...".to_string()),
///     must_reset_password: true,
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "learner@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform administrator
    Admin,

    /// Administrator of a single organization
    OrgAdmin,

    /// Training participant
    Learner,
}

impl UserRole {
    /// Converts the role to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::OrgAdmin => "org_admin",
            UserRole::Learner => "learner",
        }
    }
}

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique and stored lowercase (CITEXT)
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Account role
    pub role: UserRole,

    /// Argon2id password hash (PHC string), None until a credential is set
    pub password_hash: Option<String>,

    /// Whether the next sign-in must change the password
    pub must_reset_password: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account has a usable credential
    pub fn has_credential(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address; callers normalize with [`normalize_email`] first
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Account role
    pub role: UserRole,

    /// Argon2id hash, or None for a roster-only account
    pub password_hash: Option<String>,

    /// Force a password change on first sign-in
    pub must_reset_password: bool,
}

/// Normalizes an email address for storage and lookup
///
/// Trims surrounding whitespace and lowercases. Applied at every point an
/// email enters the system so the unique index and lookups agree.
///
/// # Example
///
/// ```
/// use certflow_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
/// ```
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role, password_hash, must_reset_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, role, password_hash, must_reset_password,
                      created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.role)
        .bind(data.password_hash)
        .bind(data.must_reset_password)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, password_hash, must_reset_password,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Lookup is case-insensitive via the CITEXT column; callers still
    /// normalize so logs and stored values agree.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, password_hash, must_reset_password,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Sets a user's credential hash
    ///
    /// Used by the provisioner's backfill path: stores the new hash, flags
    /// the account for a forced reset, and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist (`RowNotFound`) or the
    /// database is unreachable.
    pub async fn set_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2, must_reset_password = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, password_hash, must_reset_password,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}
