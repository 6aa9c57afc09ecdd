/// Database models for CertFlow
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Learner and administrator accounts
/// - `course`: Compliance-training courses (read-only from the workflow)
/// - `employee`: Organization roster entries imported by administrators
/// - `assignment`: Course assignments linking users to courses
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
/// let new_user = CreateUser {
///     email: "learner@example.com".to_string(),
///     name: Some("Jane Learner".to_string()),
///     role: UserRole::Learner,
///     password_hash: None,
///     must_reset_password: false,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod assignment;
pub mod course;
pub mod employee;
pub mod user;
