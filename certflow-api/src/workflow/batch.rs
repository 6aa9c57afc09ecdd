/// Batch orchestrator
///
/// Drives the per-reference state machine over a list of employee
/// references and aggregates one outcome per reference:
///
/// ```text
/// Resolve ──┬─ hit, has credential ────────────────────> Guard
///           ├─ hit, no credential, creation permitted ─> Backfill ─> Write
///           ├─ miss, creation permitted + email ───────> Provision ─> Write
///           └─ miss otherwise ─────────────────────────> Failed
/// Guard ────┬─ duplicate ──> Skipped
///           └─ clear ──────> Write
/// Write ────┬─ ok ──────────> Post-notify ─> Succeeded
///           ├─ unique hit ──> Skipped (lost the duplicate race)
///           └─ error ───────> Failed
/// ```
///
/// # Isolation and ordering
///
/// Each reference runs in its own spawned task: store errors become that
/// reference's Failed outcome, and a panic surfaces as a join error that is
/// converted at the same boundary - sibling references never notice.
/// References are fanned out through an order-preserving bounded stream, so
/// results always come back in input order.
///
/// # Notification
///
/// At most one message per reference per batch: the provisioning message is
/// sent right after a credential is generated, the announcement message
/// after the write for already-credentialed accounts. Delivery runs under a
/// deadline and failure is logged and swallowed - an assignment can succeed
/// with `email_sent = false`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use certflow_shared::mailer::{templates, Mailer, OutboundEmail};
use certflow_shared::models::{assignment::CreateAssignment, course::Course, user::User};

use super::outcome::{BatchReport, ProvisionSummary, ReferenceOutcome, ReferenceResult, SkipReason};
use super::provision::{backfill_credential, provision_user};
use super::resolver::resolve_reference;
use super::store::{StoreError, WorkflowStore};

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// How many references are in flight at once (1 = sequential)
    pub concurrency: usize,

    /// Deadline for a single notification send
    pub notify_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            concurrency: 4,
            notify_timeout: Duration::from_secs(10),
        }
    }
}

/// One batch invocation's input
#[derive(Debug, Clone)]
pub struct AssignmentBatch {
    /// Target course, already confirmed to exist
    pub course: Course,

    /// Organizational scope for created assignments
    pub org_id: Option<Uuid>,

    /// Administrator who triggered the batch, for audit attribution
    pub assigned_by_id: Option<Uuid>,

    /// Opaque employee references, in caller order
    pub references: Vec<String>,

    /// Out-of-band reference -> email mapping
    pub email_map: HashMap<String, Option<String>>,

    /// Whether unresolved references may be provisioned
    pub create_missing_users: bool,

    /// Whether the advisory duplicate guard runs
    pub skip_if_already_assigned: bool,

    /// Free-form metadata persisted onto created assignments
    pub details: Option<JsonValue>,
}

/// Batch orchestrator
///
/// Holds the injected store and mailer capabilities; one orchestrator is
/// built per request, handed the batch, and dropped.
pub struct BatchOrchestrator {
    store: Arc<dyn WorkflowStore>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    options: BatchOptions,
}

/// Per-batch context shared by the spawned reference tasks
struct BatchContext {
    store: Arc<dyn WorkflowStore>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    notify_timeout: Duration,
    course: Course,
    org_id: Option<Uuid>,
    assigned_by_id: Option<Uuid>,
    create_missing_users: bool,
    skip_if_already_assigned: bool,
    details: Option<JsonValue>,
}

impl BatchOrchestrator {
    /// Creates an orchestrator with default options
    pub fn new(store: Arc<dyn WorkflowStore>, mailer: Arc<dyn Mailer>, base_url: String) -> Self {
        Self::with_options(store, mailer, base_url, BatchOptions::default())
    }

    /// Creates an orchestrator with explicit tuning
    pub fn with_options(
        store: Arc<dyn WorkflowStore>,
        mailer: Arc<dyn Mailer>,
        base_url: String,
        options: BatchOptions,
    ) -> Self {
        BatchOrchestrator {
            store,
            mailer,
            base_url,
            options,
        }
    }

    /// Runs the batch to completion and returns the aggregated report
    ///
    /// Never fails as a whole: every per-reference error is captured into
    /// that reference's outcome.
    pub async fn run(&self, batch: AssignmentBatch) -> BatchReport {
        let AssignmentBatch {
            course,
            org_id,
            assigned_by_id,
            references,
            email_map,
            create_missing_users,
            skip_if_already_assigned,
            details,
        } = batch;

        let ctx = Arc::new(BatchContext {
            store: self.store.clone(),
            mailer: self.mailer.clone(),
            base_url: self.base_url.clone(),
            notify_timeout: self.options.notify_timeout,
            course,
            org_id,
            assigned_by_id,
            create_missing_users,
            skip_if_already_assigned,
            details,
        });

        let width = self.options.concurrency.max(1);

        let results: Vec<ReferenceResult> = stream::iter(references)
            .map(|reference| {
                let ctx = Arc::clone(&ctx);
                let mapped_email = email_map.get(&reference).cloned().flatten();

                async move {
                    let handle = tokio::spawn(process_reference(
                        Arc::clone(&ctx),
                        reference.clone(),
                        mapped_email,
                    ));

                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(join_error) => {
                            tracing::error!(
                                reference = %reference,
                                error = %join_error,
                                "Reference processing aborted"
                            );
                            ReferenceOutcome::Failed {
                                user_id: None,
                                provisioned: None,
                                email_sent: false,
                                error: "internal error while processing reference".to_string(),
                            }
                        }
                    };

                    ReferenceResult { reference, outcome }
                }
            })
            .buffered(width)
            .collect()
            .await;

        let assigned_count = results
            .iter()
            .filter(|r| r.outcome.assignment_created())
            .count();

        tracing::info!(
            course_id = %ctx.course.id,
            total = results.len(),
            assigned = assigned_count,
            "Assignment batch finished"
        );

        BatchReport {
            assigned_count,
            results,
        }
    }
}

/// Runs one reference through the state machine
///
/// Terminal in every branch; errors never escape this function.
async fn process_reference(
    ctx: Arc<BatchContext>,
    reference: String,
    mapped_email: Option<String>,
) -> ReferenceOutcome {
    // Resolve
    let resolved =
        match resolve_reference(ctx.store.as_ref(), &reference, mapped_email.as_deref()).await {
            Ok(resolved) => resolved,
            Err(e) => {
                return ReferenceOutcome::Failed {
                    user_id: None,
                    provisioned: None,
                    email_sent: false,
                    error: format!("resolution failed: {}", e),
                }
            }
        };

    // Provision or backfill
    let (user, provisioned, provision_email_sent) = match resolved {
        Some(user) if !user.has_credential() && ctx.create_missing_users => {
            match backfill_credential(ctx.store.as_ref(), &user).await {
                Ok(p) => {
                    let sent = notify_provisioned(&ctx, &p.user, &p.temp_password).await;
                    let summary = ProvisionSummary {
                        user_created: false,
                        created_user_id: None,
                        temp_password: p.temp_password,
                    };
                    (p.user, Some(summary), sent)
                }
                Err(e) => {
                    return ReferenceOutcome::Failed {
                        user_id: Some(user.id),
                        provisioned: None,
                        email_sent: false,
                        error: format!("credential backfill failed: {}", e),
                    }
                }
            }
        }

        Some(user) => (user, None, false),

        None => {
            if !ctx.create_missing_users {
                return ReferenceOutcome::Failed {
                    user_id: None,
                    provisioned: None,
                    email_sent: false,
                    error: "user not found".to_string(),
                };
            }

            let email = match mapped_email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                Some(email) => email,
                None => {
                    return ReferenceOutcome::Failed {
                        user_id: None,
                        provisioned: None,
                        email_sent: false,
                        error: "user not found and no email available to create an account"
                            .to_string(),
                    }
                }
            };

            match provision_user(ctx.store.as_ref(), email).await {
                Ok(p) => {
                    let sent = notify_provisioned(&ctx, &p.user, &p.temp_password).await;
                    let summary = ProvisionSummary {
                        user_created: true,
                        created_user_id: Some(p.user.id),
                        temp_password: p.temp_password,
                    };
                    (p.user, Some(summary), sent)
                }
                Err(e) => {
                    return ReferenceOutcome::Failed {
                        user_id: None,
                        provisioned: None,
                        email_sent: false,
                        error: format!("provisioning failed: {}", e),
                    }
                }
            }
        }
    };

    // Guard - advisory check for already-credentialed accounts; freshly
    // provisioned references go straight to the write, where the unique
    // index arbitrates.
    if provisioned.is_none() && ctx.skip_if_already_assigned {
        match ctx.store.find_assignment(user.id, ctx.course.id).await {
            Ok(Some(_)) => {
                return ReferenceOutcome::Skipped {
                    user_id: user.id,
                    reason: SkipReason::AlreadyAssigned,
                    provisioned: None,
                    email_sent: false,
                }
            }
            Ok(None) => {}
            Err(e) => {
                return ReferenceOutcome::Failed {
                    user_id: Some(user.id),
                    provisioned,
                    email_sent: provision_email_sent,
                    error: format!("duplicate check failed: {}", e),
                }
            }
        }
    }

    // Write
    let assignment = match ctx
        .store
        .create_assignment(CreateAssignment {
            user_id: user.id,
            course_id: ctx.course.id,
            org_id: ctx.org_id,
            assigned_by_id: ctx.assigned_by_id,
            details: ctx.details.clone(),
        })
        .await
    {
        Ok(assignment) => assignment,
        Err(StoreError::UniqueViolation(_)) => {
            // Lost the duplicate race after passing (or bypassing) the guard.
            return ReferenceOutcome::Skipped {
                user_id: user.id,
                reason: SkipReason::AlreadyAssigned,
                provisioned,
                email_sent: provision_email_sent,
            };
        }
        Err(e) => {
            return ReferenceOutcome::Failed {
                user_id: Some(user.id),
                provisioned,
                email_sent: provision_email_sent,
                error: format!("failed to create assignment: {}", e),
            }
        }
    };

    // Post-notify existing accounts; provisioned ones already received
    // their one message.
    let email_sent = if provisioned.is_some() {
        provision_email_sent
    } else {
        notify_assigned(&ctx, &user).await
    };

    ReferenceOutcome::Succeeded {
        user_id: user.id,
        assignment_id: assignment.id,
        provisioned,
        email_sent,
    }
}

async fn notify_provisioned(ctx: &BatchContext, user: &User, temp_password: &str) -> bool {
    let email =
        templates::provisioning_email(&user.email, &ctx.course.title, temp_password, &ctx.base_url);
    deliver(ctx, email).await
}

async fn notify_assigned(ctx: &BatchContext, user: &User) -> bool {
    let email = templates::assignment_email(&user.email, &ctx.course.title, &ctx.base_url);
    deliver(ctx, email).await
}

/// Best-effort delivery under the batch's notification deadline
async fn deliver(ctx: &BatchContext, email: OutboundEmail) -> bool {
    let to = email.to.clone();

    match tokio::time::timeout(ctx.notify_timeout, ctx.mailer.send(email)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(to = %to, error = %e, "Notification delivery failed");
            false
        }
        Err(_) => {
            tracing::warn!(to = %to, "Notification delivery timed out");
            false
        }
    }
}
