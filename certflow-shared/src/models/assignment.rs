/// Assignment model and database operations
///
/// An assignment links a user to a course, optionally scoped to an
/// organization and attributed to the administrator who triggered it. The
/// batch workflow only ever creates rows in the `assigned` state; learners
/// move them forward as they work through the course.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE assignment_status AS ENUM ('assigned', 'in_progress', 'completed');
///
/// CREATE TABLE assignments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
///     org_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
///     assigned_by_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     progress REAL NOT NULL DEFAULT 0,
///     status assignment_status NOT NULL DEFAULT 'assigned',
///     details JSONB,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX uq_assignments_user_course ON assignments (user_id, course_id);
/// ```
///
/// The unique index arbitrates the duplicate-check race: two concurrent
/// batches can both pass the advisory guard, but only one insert lands.
///
/// # Example
///
/// ```no_run
/// use certflow_shared::models::assignment::{Assignment, CreateAssignment};
/// use certflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, course_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let assignment = Assignment::create(&pool, CreateAssignment {
///     user_id,
///     course_id,
///     org_id: None,
///     assigned_by_id: None,
///     details: None,
/// })
/// .await?;
///
/// let existing = Assignment::find_by_user_and_course(&pool, user_id, course_id).await?;
/// assert!(existing.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Lifecycle states of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Assigned, not yet started
    Assigned,

    /// Learner has started the course
    InProgress,

    /// Course completed
    Completed,
}

impl AssignmentStatus {
    /// Converts the status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }
}

/// Assignment model linking a user to a course
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    /// Unique assignment ID (UUID v4)
    pub id: Uuid,

    /// Assigned user
    pub user_id: Uuid,

    /// Target course
    pub course_id: Uuid,

    /// Organizational scope, if any
    pub org_id: Option<Uuid>,

    /// Administrator who triggered the batch, if known
    pub assigned_by_id: Option<Uuid>,

    /// Completion progress, 0.0 at creation
    pub progress: f32,

    /// Lifecycle status; the workflow only writes `Assigned`
    pub status: AssignmentStatus,

    /// Free-form batch metadata
    pub details: Option<JsonValue>,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new assignment
///
/// Progress and status are not inputs: new rows always start at 0 /
/// `assigned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssignment {
    /// Assigned user
    pub user_id: Uuid,

    /// Target course
    pub course_id: Uuid,

    /// Organizational scope, if any
    pub org_id: Option<Uuid>,

    /// Administrator who triggered the batch, if known
    pub assigned_by_id: Option<Uuid>,

    /// Free-form batch metadata
    pub details: Option<JsonValue>,
}

impl Assignment {
    /// Creates a new assignment in the `assigned` state
    ///
    /// # Errors
    ///
    /// Returns an error if the user/course pair already holds an assignment
    /// (unique constraint), a referenced row is missing (foreign key), or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateAssignment) -> Result<Self, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (user_id, course_id, org_id, assigned_by_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, course_id, org_id, assigned_by_id, progress,
                      status, details, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.org_id)
        .bind(data.assigned_by_id)
        .bind(data.details)
        .fetch_one(pool)
        .await?;

        Ok(assignment)
    }

    /// Finds the assignment for a user/course pair, if one exists
    ///
    /// This is the advisory duplicate guard used by the batch workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn find_by_user_and_course(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, user_id, course_id, org_id, assigned_by_id, progress,
                   status, details, created_at
            FROM assignments
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

        Ok(assignment)
    }
}
