/// Batch course-assignment workflow
///
/// This module implements the one genuinely stateful flow in the service:
/// given a course and a list of opaque employee references, resolve each
/// reference to a user account, provision credentials where permitted,
/// guard against duplicate assignments, write the assignment row, and
/// notify the user - tolerating per-reference failure without aborting the
/// batch.
///
/// # Architecture
///
/// ```text
/// BatchOrchestrator
///   ├─> resolver: reference -> User (ordered lookup strategies)
///   ├─> provision: create account / backfill credential + temp password
///   ├─> store: duplicate guard + assignment write
///   └─> mailer: one notification per reference, best-effort
/// ```
///
/// # Isolation
///
/// Every reference is processed in its own task; any error (or panic) is
/// converted into that reference's Failed outcome at the boundary. Results
/// are collected in input order regardless of completion order.

pub mod batch;
pub mod outcome;
pub mod provision;
pub mod resolver;
pub mod store;

pub use batch::{AssignmentBatch, BatchOptions, BatchOrchestrator};
pub use outcome::{BatchReport, ProvisionSummary, ReferenceOutcome, ReferenceResult, SkipReason};
pub use store::{PgStore, StoreError, WorkflowStore};
