/// Store seam for the assignment workflow
///
/// The workflow touches persistence only through the `WorkflowStore` trait,
/// so the orchestrator can be driven against Postgres in production and an
/// in-memory fake in tests. The production implementation delegates to the
/// shared models; it owns no connection state beyond the injected pool
/// handle.
///
/// `StoreError` separates unique-constraint violations from other database
/// failures: the assignment writer treats a unique violation on the
/// (user, course) index as "lost the duplicate race", not as an error.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use certflow_shared::models::{
    assignment::{Assignment, CreateAssignment},
    course::Course,
    employee::Employee,
    user::{CreateUser, User},
};

/// Error type for workflow store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (names the constraint)
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other storage failure
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Persistence operations the assignment workflow depends on
///
/// Not-found is `Ok(None)`, never an error; implementations reserve `Err`
/// for storage-layer failures.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Looks up a user by canonical ID
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Creates a user account
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Stores a credential hash on an existing user and flags the account
    /// for a forced password reset
    async fn set_user_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError>;

    /// Looks up an employee roster entry by ID
    async fn find_employee_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError>;

    /// Looks up a course by ID
    async fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>, StoreError>;

    /// Finds an existing assignment for a user/course pair (duplicate guard)
    async fn find_assignment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Assignment>, StoreError>;

    /// Creates an assignment row
    async fn create_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError>;

    /// Verifies the store is reachable (health endpoint)
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres-backed workflow store
///
/// Thin delegation to the shared models over an injected pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn set_user_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError> {
        Ok(User::set_password_hash(&self.pool, id, password_hash).await?)
    }

    async fn find_employee_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        Ok(Employee::find_by_id(&self.pool, id).await?)
    }

    async fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(Course::find_by_id(&self.pool, id).await?)
    }

    async fn find_assignment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(Assignment::find_by_user_and_course(&self.pool, user_id, course_id).await?)
    }

    async fn create_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError> {
        Ok(Assignment::create(&self.pool, data).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        certflow_shared::db::pool::health_check(&self.pool)
            .await
            .map_err(StoreError::from)
    }
}
