/// Employee roster model
///
/// Employees are the secondary identity entity: roster entries imported by
/// an organization administrator before the matching user accounts exist.
/// An entry may point at a canonical user (`user_id`), carry only an email
/// for later matching, or both. The identity resolver consults this table
/// as its final lookup strategy.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE employees (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     email CITEXT,
///     name VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Employee roster entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    /// Unique employee ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Linked user account, if one has been matched
    pub user_id: Option<Uuid>,

    /// Email carried on the roster entry, if any
    pub email: Option<String>,

    /// Display name from the roster import
    pub name: Option<String>,

    /// When the entry was imported
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Finds an employee roster entry by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, org_id, user_id, email, name, created_at
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }
}
