/// Batch course-assignment endpoint
///
/// This endpoint drives the assignment workflow: it validates the request,
/// confirms the course exists, then hands the reference list to the batch
/// orchestrator. Per-reference failures never fail the request - the
/// response always carries one result entry per submitted reference.
///
/// # Endpoint
///
/// `POST /v1/assignments/batch`
///
/// # Example Request
///
/// ```json
/// {
///   "courseId": "7be4c0b2-6a41-4f3b-9a65-2f15a4d2b9e1",
///   "employeeIds": ["8c2f...","emp-note"],
///   "orgId": "d1a9...",
///   "employeeEmailMap": { "emp-note": "jane@example.com" },
///   "createMissingUsers": true,
///   "skipIfAlreadyAssigned": true,
///   "meta": { "campaign": "q3-refresh" }
/// }
/// ```
///
/// # Example Response
///
/// ```json
/// {
///   "success": true,
///   "assignedCount": 1,
///   "results": [
///     {
///       "employeeId": "8c2f...",
///       "userId": "8c2f...",
///       "assignedCreated": false,
///       "userCreated": false,
///       "reason": "already_assigned",
///       "emailSent": false
///     },
///     {
///       "employeeId": "emp-note",
///       "userId": "91aa...",
///       "assignedCreated": true,
///       "userCreated": true,
///       "createdUserId": "91aa...",
///       "assignedId": "0f44...",
///       "tempPassword": "Xk3!mRw9#bQz",
///       "emailSent": true
///     }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: missing `courseId`, missing `employeeIds`, malformed
///   `orgId`, batch over the size cap, or unknown course
/// - 500 Internal Server Error: failure escaping the per-reference boundary
///
/// Actor attribution is read from the `x-assigned-by` header; absent or
/// unparseable values are treated as "no actor".

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    workflow::{
        AssignmentBatch, BatchOptions, BatchOrchestrator, ProvisionSummary, ReferenceOutcome,
        ReferenceResult, WorkflowStore,
    },
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Header carrying the acting administrator's user id
const ASSIGNED_BY_HEADER: &str = "x-assigned-by";

/// Batch assignment request
///
/// Required fields are `Option` so their absence maps to the documented
/// 400 body instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployeesRequest {
    /// Target course id
    pub course_id: Option<String>,

    /// Opaque employee references, capped at 500 per request
    #[validate(length(max = 500, message = "employeeIds exceeds the batch limit of 500"))]
    pub employee_ids: Option<Vec<String>>,

    /// Organizational scope for created assignments
    pub org_id: Option<String>,

    /// Out-of-band reference -> email mapping
    #[serde(default)]
    pub employee_email_map: HashMap<String, Option<String>>,

    /// Whether unresolved references may be provisioned (default false)
    pub create_missing_users: Option<bool>,

    /// Whether the duplicate guard runs (default true)
    pub skip_if_already_assigned: Option<bool>,

    /// Free-form metadata persisted onto created assignments
    pub meta: Option<JsonValue>,
}

/// Batch assignment response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployeesResponse {
    /// Always true on 200; errors use the `{ "error": ... }` shape
    pub success: bool,

    /// Number of assignments created
    pub assigned_count: usize,

    /// One entry per submitted reference, input order preserved
    pub results: Vec<EmployeeAssignmentResult>,
}

/// Wire shape of one reference's outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAssignmentResult {
    /// The reference exactly as submitted
    pub employee_id: String,

    /// Resolved user, when resolution got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// Whether an assignment row was created
    pub assigned_created: bool,

    /// Whether a new account was created
    pub user_created: bool,

    /// ID of the created account, when one was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_user_id: Option<Uuid>,

    /// ID of the created assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<Uuid>,

    /// Skip reason (e.g. "already_assigned")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Temporary credential generated in this call, echoed once for the
    /// administrator's audit trail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_password: Option<String>,

    /// Whether a notification was delivered for this reference
    pub email_sent: bool,

    /// Per-reference error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ReferenceResult> for EmployeeAssignmentResult {
    fn from(result: ReferenceResult) -> Self {
        let reference = result.reference;

        fn split(provisioned: Option<ProvisionSummary>) -> (bool, Option<Uuid>, Option<String>) {
            match provisioned {
                Some(p) => (p.user_created, p.created_user_id, Some(p.temp_password)),
                None => (false, None, None),
            }
        }

        match result.outcome {
            ReferenceOutcome::Succeeded {
                user_id,
                assignment_id,
                provisioned,
                email_sent,
            } => {
                let (user_created, created_user_id, temp_password) = split(provisioned);
                EmployeeAssignmentResult {
                    employee_id: reference,
                    user_id: Some(user_id),
                    assigned_created: true,
                    user_created,
                    created_user_id,
                    assigned_id: Some(assignment_id),
                    reason: None,
                    temp_password,
                    email_sent,
                    error: None,
                }
            }

            ReferenceOutcome::Skipped {
                user_id,
                reason,
                provisioned,
                email_sent,
            } => {
                let (user_created, created_user_id, temp_password) = split(provisioned);
                EmployeeAssignmentResult {
                    employee_id: reference,
                    user_id: Some(user_id),
                    assigned_created: false,
                    user_created,
                    created_user_id,
                    assigned_id: None,
                    reason: Some(reason.as_str().to_string()),
                    temp_password,
                    email_sent,
                    error: None,
                }
            }

            ReferenceOutcome::Failed {
                user_id,
                provisioned,
                email_sent,
                error,
            } => {
                let (user_created, created_user_id, temp_password) = split(provisioned);
                EmployeeAssignmentResult {
                    employee_id: reference,
                    user_id,
                    assigned_created: false,
                    user_created,
                    created_user_id,
                    assigned_id: None,
                    reason: None,
                    temp_password,
                    email_sent,
                    error: Some(error),
                }
            }
        }
    }
}

/// Batch assignment handler
///
/// Input validation and the course lookup happen before any per-reference
/// work; once the loop starts, nothing short of a bug aborts it.
pub async fn assign_employees(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AssignEmployeesRequest>, JsonRejection>,
) -> ApiResult<Json<AssignEmployeesResponse>> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    request.validate().map_err(|e| {
        let message = e
            .field_errors()
            .iter()
            .flat_map(|(_, errors)| errors.iter())
            .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");

        if message.is_empty() {
            ApiError::BadRequest("Request validation failed".to_string())
        } else {
            ApiError::BadRequest(message)
        }
    })?;

    let course_id_raw = request
        .course_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("courseId is required".to_string()))?;

    let employee_ids = request.employee_ids.ok_or_else(|| {
        ApiError::BadRequest("employeeIds must be an array of employee references".to_string())
    })?;

    // An unparseable id can't name a course; same client answer as a miss.
    let course_id = Uuid::parse_str(course_id_raw)
        .map_err(|_| ApiError::BadRequest("Course not found".to_string()))?;

    let course = state
        .store
        .find_course_by_id(course_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Course not found".to_string()))?;

    let org_id = match request.org_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("orgId must be a valid id".to_string()))?,
        ),
        _ => None,
    };

    let assigned_by_id = actor_from_headers(&headers);

    tracing::info!(
        course_id = %course.id,
        batch_size = employee_ids.len(),
        create_missing_users = request.create_missing_users.unwrap_or(false),
        "Starting assignment batch"
    );

    let orchestrator = BatchOrchestrator::with_options(
        state.store.clone(),
        state.mailer.clone(),
        state.config.app.base_url.clone(),
        BatchOptions {
            concurrency: state.config.batch.concurrency,
            notify_timeout: Duration::from_secs(state.config.batch.notify_timeout_seconds),
        },
    );

    let report = orchestrator
        .run(AssignmentBatch {
            course,
            org_id,
            assigned_by_id,
            references: employee_ids,
            email_map: request.employee_email_map,
            create_missing_users: request.create_missing_users.unwrap_or(false),
            skip_if_already_assigned: request.skip_if_already_assigned.unwrap_or(true),
            details: request.meta,
        })
        .await;

    Ok(Json(AssignEmployeesResponse {
        success: true,
        assigned_count: report.assigned_count,
        results: report.results.into_iter().map(Into::into).collect(),
    }))
}

/// Reads the acting administrator from the request headers
///
/// Absent or unparseable values mean "no actor" - attribution is
/// best-effort, never a rejection.
fn actor_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(ASSIGNED_BY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::SkipReason;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(actor_from_headers(&headers), None);

        headers.insert(ASSIGNED_BY_HEADER, "not-a-uuid".parse().unwrap());
        assert_eq!(actor_from_headers(&headers), None);

        let actor = Uuid::new_v4();
        headers.insert(ASSIGNED_BY_HEADER, actor.to_string().parse().unwrap());
        assert_eq!(actor_from_headers(&headers), Some(actor));
    }

    #[test]
    fn test_request_batch_size_cap() {
        let within = AssignEmployeesRequest {
            course_id: Some(Uuid::new_v4().to_string()),
            employee_ids: Some(vec!["a".to_string(); 500]),
            org_id: None,
            employee_email_map: HashMap::new(),
            create_missing_users: None,
            skip_if_already_assigned: None,
            meta: None,
        };
        assert!(within.validate().is_ok());

        let over = AssignEmployeesRequest {
            employee_ids: Some(vec!["a".to_string(); 501]),
            ..within
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: AssignEmployeesRequest = serde_json::from_str(
            r#"{
                "courseId": "c-1",
                "employeeIds": ["e-1"],
                "employeeEmailMap": { "e-1": "jane@example.com", "e-2": null },
                "createMissingUsers": true,
                "skipIfAlreadyAssigned": false
            }"#,
        )
        .unwrap();

        assert_eq!(request.course_id.as_deref(), Some("c-1"));
        assert_eq!(request.employee_ids.as_deref(), Some(&["e-1".to_string()][..]));
        assert_eq!(
            request.employee_email_map.get("e-1"),
            Some(&Some("jane@example.com".to_string()))
        );
        assert_eq!(request.employee_email_map.get("e-2"), Some(&None));
        assert_eq!(request.create_missing_users, Some(true));
        assert_eq!(request.skip_if_already_assigned, Some(false));
    }

    #[test]
    fn test_succeeded_outcome_maps_to_wire() {
        let user_id = Uuid::new_v4();
        let assignment_id = Uuid::new_v4();

        let wire: EmployeeAssignmentResult = ReferenceResult {
            reference: "ref-1".to_string(),
            outcome: ReferenceOutcome::Succeeded {
                user_id,
                assignment_id,
                provisioned: Some(ProvisionSummary {
                    user_created: true,
                    created_user_id: Some(user_id),
                    temp_password: "Xk3!mRw9#bQz".to_string(),
                }),
                email_sent: true,
            },
        }
        .into();

        assert_eq!(wire.employee_id, "ref-1");
        assert!(wire.assigned_created);
        assert!(wire.user_created);
        assert_eq!(wire.created_user_id, Some(user_id));
        assert_eq!(wire.assigned_id, Some(assignment_id));
        assert_eq!(wire.temp_password.as_deref(), Some("Xk3!mRw9#bQz"));
        assert!(wire.email_sent);
        assert!(wire.reason.is_none());
        assert!(wire.error.is_none());

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["employeeId"], "ref-1");
        assert_eq!(json["assignedCreated"], true);
        assert_eq!(json["userCreated"], true);
        assert_eq!(json["tempPassword"], "Xk3!mRw9#bQz");
        assert_eq!(json["emailSent"], true);
        assert!(json.get("reason").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_skipped_outcome_maps_to_wire() {
        let user_id = Uuid::new_v4();

        let wire: EmployeeAssignmentResult = ReferenceResult {
            reference: "ref-2".to_string(),
            outcome: ReferenceOutcome::Skipped {
                user_id,
                reason: SkipReason::AlreadyAssigned,
                provisioned: None,
                email_sent: false,
            },
        }
        .into();

        assert!(!wire.assigned_created);
        assert_eq!(wire.reason.as_deref(), Some("already_assigned"));
        assert!(wire.assigned_id.is_none());
        assert!(wire.temp_password.is_none());
    }

    #[test]
    fn test_failed_outcome_maps_to_wire() {
        let wire: EmployeeAssignmentResult = ReferenceResult {
            reference: "ref-3".to_string(),
            outcome: ReferenceOutcome::Failed {
                user_id: None,
                provisioned: None,
                email_sent: false,
                error: "user not found".to_string(),
            },
        }
        .into();

        assert!(!wire.assigned_created);
        assert!(!wire.user_created);
        assert!(wire.user_id.is_none());
        assert_eq!(wire.error.as_deref(), Some("user not found"));
    }
}
