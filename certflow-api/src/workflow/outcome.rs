/// Per-reference outcome types
///
/// The batch never throws across a reference boundary: every terminal state
/// of the per-reference state machine is a value here, so aggregation is
/// exhaustive and the route layer can map outcomes to the wire without
/// guessing what happened.

use uuid::Uuid;

/// Why a reference was skipped without a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The user already holds an assignment for the course
    AlreadyAssigned,
}

impl SkipReason {
    /// Converts the reason to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyAssigned => "already_assigned",
        }
    }
}

/// Record of a credential generated while processing one reference
///
/// Covers both provisioning paths: a freshly created account
/// (`user_created = true`, `created_user_id` set) and a credential
/// backfilled onto an account that existed without one
/// (`user_created = false`).
#[derive(Debug, Clone)]
pub struct ProvisionSummary {
    /// Whether a new account was created (false = backfill)
    pub user_created: bool,

    /// ID of the created account, when one was created
    pub created_user_id: Option<Uuid>,

    /// The generated plaintext, echoed once to the caller for its audit
    /// trail; never persisted or logged
    pub temp_password: String,
}

/// Terminal state of one reference's trip through the state machine
#[derive(Debug, Clone)]
pub enum ReferenceOutcome {
    /// Assignment created
    Succeeded {
        /// Resolved (or provisioned) user
        user_id: Uuid,

        /// Created assignment row
        assignment_id: Uuid,

        /// Credential generated along the way, if any
        provisioned: Option<ProvisionSummary>,

        /// Whether the notification was delivered
        email_sent: bool,
    },

    /// No write performed
    Skipped {
        /// Resolved user
        user_id: Uuid,

        /// Why the reference was skipped
        reason: SkipReason,

        /// Credential generated before the skip (race loser after a
        /// backfill), if any
        provisioned: Option<ProvisionSummary>,

        /// Whether a provisioning notification went out before the skip
        email_sent: bool,
    },

    /// The reference failed; siblings are unaffected
    Failed {
        /// Resolved user, when resolution got that far
        user_id: Option<Uuid>,

        /// Credential generated before the failure, if any
        provisioned: Option<ProvisionSummary>,

        /// Whether a provisioning notification went out before the failure
        email_sent: bool,

        /// What went wrong, scoped to this reference
        error: String,
    },
}

impl ReferenceOutcome {
    /// Whether this outcome created an assignment
    pub fn assignment_created(&self) -> bool {
        matches!(self, ReferenceOutcome::Succeeded { .. })
    }
}

/// One reference paired with its outcome, in input order
#[derive(Debug, Clone)]
pub struct ReferenceResult {
    /// The reference exactly as submitted
    pub reference: String,

    /// Terminal outcome
    pub outcome: ReferenceOutcome,
}

/// Aggregated batch result
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Number of assignments created
    pub assigned_count: usize,

    /// One entry per submitted reference, input order preserved
    pub results: Vec<ReferenceResult>,
}
