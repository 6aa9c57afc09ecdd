/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for exercising the batch
/// assignment workflow through the real router without external services:
///
/// - `InMemoryStore`: a `WorkflowStore` over hash maps, with failure
///   injection for per-reference isolation tests
/// - `RecordingMailer`: captures outbound messages, optionally failing
/// - `TestContext`: builds the axum app around the fakes and provides
///   request helpers

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt as _;
use uuid::Uuid;

use certflow_api::app::{build_router, AppState};
use certflow_api::config::{ApiConfig, AppConfig, BatchConfig, Config, DatabaseConfig};
use certflow_api::workflow::{StoreError, WorkflowStore};
use certflow_shared::mailer::{Mailer, MailerError, OutboundEmail};
use certflow_shared::models::assignment::{Assignment, AssignmentStatus, CreateAssignment};
use certflow_shared::models::course::Course;
use certflow_shared::models::employee::Employee;
use certflow_shared::models::user::{CreateUser, User, UserRole};

/// Base URL used in test notification links
pub const TEST_BASE_URL: &str = "https://training.example.com";

#[derive(Default)]
struct StoreData {
    users: HashMap<Uuid, User>,
    employees: HashMap<Uuid, Employee>,
    courses: HashMap<Uuid, Course>,
    assignments: Vec<Assignment>,
}

/// In-memory `WorkflowStore` with failure injection
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,

    /// User ids whose `find_user_by_id` fails with a store error
    poisoned_user_lookups: Mutex<HashSet<Uuid>>,

    /// When set, every assignment insert reports a unique violation,
    /// emulating a concurrent batch winning the duplicate race
    force_unique_violation: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a course and returns it
    pub fn add_course(&self, title: &str) -> Course {
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .courses
            .insert(course.id, course.clone());
        course
    }

    /// Seeds a user; `password_hash` None models a roster-only account
    pub fn add_user(&self, email: &str, password_hash: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: None,
            role: UserRole::Learner,
            password_hash: password_hash.map(str::to_string),
            must_reset_password: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.data.lock().unwrap().users.insert(user.id, user.clone());
        user
    }

    /// Seeds an employee roster entry
    pub fn add_employee(&self, user_id: Option<Uuid>, email: Option<&str>) -> Employee {
        let employee = Employee {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            user_id,
            email: email.map(str::to_string),
            name: None,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .employees
            .insert(employee.id, employee.clone());
        employee
    }

    /// Seeds an existing assignment for a user/course pair
    pub fn add_assignment(&self, user_id: Uuid, course_id: Uuid) -> Assignment {
        let assignment = Assignment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            org_id: None,
            assigned_by_id: None,
            progress: 0.0,
            status: AssignmentStatus::Assigned,
            details: None,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .assignments
            .push(assignment.clone());
        assignment
    }

    /// Makes `find_user_by_id` fail for the given id
    pub fn poison_user_lookup(&self, id: Uuid) {
        self.poisoned_user_lookups.lock().unwrap().insert(id);
    }

    /// Makes every assignment insert report a unique violation
    pub fn force_unique_violation(&self) {
        self.force_unique_violation.store(true, Ordering::SeqCst);
    }

    /// Snapshot of all assignments
    pub fn assignments(&self) -> Vec<Assignment> {
        self.data.lock().unwrap().assignments.clone()
    }

    /// Assignments held by one user for one course
    pub fn assignments_for(&self, user_id: Uuid, course_id: Uuid) -> Vec<Assignment> {
        self.assignments()
            .into_iter()
            .filter(|a| a.user_id == user_id && a.course_id == course_id)
            .collect()
    }

    /// Fetches a user by id
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.data.lock().unwrap().users.get(&id).cloned()
    }

    /// Fetches a user by email, emulating the CITEXT case-insensitive index
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.data
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Total number of users
    pub fn user_count(&self) -> usize {
        self.data.lock().unwrap().users.len()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        if self.poisoned_user_lookups.lock().unwrap().contains(&id) {
            return Err(StoreError::Database("injected lookup failure".to_string()));
        }
        Ok(self.data.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.user_by_email(email))
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut guard = self.data.lock().unwrap();

        if guard
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            role: data.role,
            password_hash: data.password_hash,
            must_reset_password: data.must_reset_password,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        guard.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_user_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError> {
        let mut guard = self.data.lock().unwrap();

        let user = guard
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Database("user not found".to_string()))?;

        user.password_hash = Some(password_hash.to_string());
        user.must_reset_password = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn find_employee_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        Ok(self.data.lock().unwrap().employees.get(&id).cloned())
    }

    async fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.data.lock().unwrap().courses.get(&id).cloned())
    }

    async fn find_assignment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .assignments
            .iter()
            .find(|a| a.user_id == user_id && a.course_id == course_id)
            .cloned())
    }

    async fn create_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError> {
        if self.force_unique_violation.load(Ordering::SeqCst) {
            return Err(StoreError::UniqueViolation(
                "uq_assignments_user_course".to_string(),
            ));
        }

        let mut guard = self.data.lock().unwrap();

        if guard
            .assignments
            .iter()
            .any(|a| a.user_id == data.user_id && a.course_id == data.course_id)
        {
            return Err(StoreError::UniqueViolation(
                "uq_assignments_user_course".to_string(),
            ));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            course_id: data.course_id,
            org_id: data.org_id,
            assigned_by_id: data.assigned_by_id,
            progress: 0.0,
            status: AssignmentStatus::Assigned,
            details: data.details,
            created_at: Utc::now(),
        };
        guard.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Mailer fake that records every message
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Snapshot of sent messages
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages addressed to one recipient
    pub fn sent_to(&self, to: &str) -> Vec<OutboundEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.to.eq_ignore_ascii_case(to))
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailerError::SendFailed("injected send failure".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Test context containing the app and its fakes
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a context with default batch tuning (fan-out width 4)
    pub fn new() -> Self {
        Self::with_concurrency(4)
    }

    /// Creates a context with an explicit fan-out width
    pub fn with_concurrency(concurrency: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://unused-in-tests".to_string(),
                max_connections: 1,
            },
            app: AppConfig {
                base_url: TEST_BASE_URL.to_string(),
            },
            smtp: None,
            batch: BatchConfig {
                concurrency,
                notify_timeout_seconds: 5,
            },
        };

        let state = AppState::new(store.clone(), mailer.clone(), config);
        let app = build_router(state);

        TestContext { store, mailer, app }
    }

    /// Posts a batch request and returns (status, parsed body)
    pub async fn post_batch(&self, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.post_batch_with_headers(body, &[]).await
    }

    /// Posts a batch request with extra headers
    pub async fn post_batch_with_headers(
        &self,
        body: serde_json::Value,
        headers: &[(&str, &str)],
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/assignments/batch")
            .header("content-type", "application/json");

        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(Body::from(body.to_string())).unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&bytes).expect("response body should be JSON");

        (status, json)
    }

    /// Gets the health endpoint
    pub async fn get_health(&self) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&bytes).expect("response body should be JSON");

        (status, json)
    }
}
