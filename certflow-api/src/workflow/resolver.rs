/// Identity resolution
///
/// Maps an opaque employee reference (a user id, an employee roster id, or
/// an email supplied out-of-band) to a canonical user record. Resolution is
/// an ordered list of lookup strategies; the first hit wins and no further
/// strategies run:
///
/// 1. Treat the reference as a canonical user id.
/// 2. If the batch's email mapping carries a non-empty email for this
///    reference, look the user up by that email (normalized).
/// 3. Treat the reference as an employee roster id. A linked `user_id`
///    resolves that user; a roster email is consulted only when the mapping
///    supplied none.
///
/// A miss at any strategy is not an error - resolution falls through to the
/// next strategy. A storage failure aborts resolution for this reference
/// only; the caller converts it into the reference's Failed outcome.

use uuid::Uuid;

use certflow_shared::models::user::{normalize_email, User};

use super::store::{StoreError, WorkflowStore};

/// Lookup strategies in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupStrategy {
    /// Reference is a canonical user id
    UserId,

    /// Batch email mapping carries an email for the reference
    MappedEmail,

    /// Reference is an employee roster id
    EmployeeRecord,
}

const STRATEGY_ORDER: [LookupStrategy; 3] = [
    LookupStrategy::UserId,
    LookupStrategy::MappedEmail,
    LookupStrategy::EmployeeRecord,
];

/// Resolves a reference to a user, or None when every strategy misses
///
/// `mapped_email` is the batch mapping's entry for this reference, if any;
/// empty and whitespace-only values count as absent.
///
/// # Errors
///
/// Returns the first storage failure encountered; not-found is never an
/// error.
pub async fn resolve_reference(
    store: &dyn WorkflowStore,
    reference: &str,
    mapped_email: Option<&str>,
) -> Result<Option<User>, StoreError> {
    for strategy in STRATEGY_ORDER {
        if let Some(user) = strategy.attempt(store, reference, mapped_email).await? {
            return Ok(Some(user));
        }
    }

    Ok(None)
}

/// Returns the mapping email if it is present and non-empty
fn usable_email(mapped_email: Option<&str>) -> Option<&str> {
    mapped_email.map(str::trim).filter(|e| !e.is_empty())
}

impl LookupStrategy {
    async fn attempt(
        self,
        store: &dyn WorkflowStore,
        reference: &str,
        mapped_email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        match self {
            LookupStrategy::UserId => match Uuid::parse_str(reference.trim()) {
                Ok(id) => store.find_user_by_id(id).await,
                Err(_) => Ok(None),
            },

            LookupStrategy::MappedEmail => match usable_email(mapped_email) {
                Some(email) => store.find_user_by_email(&normalize_email(email)).await,
                None => Ok(None),
            },

            LookupStrategy::EmployeeRecord => {
                let id = match Uuid::parse_str(reference.trim()) {
                    Ok(id) => id,
                    Err(_) => return Ok(None),
                };

                let employee = match store.find_employee_by_id(id).await? {
                    Some(employee) => employee,
                    None => return Ok(None),
                };

                if let Some(user_id) = employee.user_id {
                    return store.find_user_by_id(user_id).await;
                }

                // The roster email is a fallback for references the mapping
                // said nothing about; a mapping-supplied email already had
                // its chance in the previous strategy.
                if usable_email(mapped_email).is_some() {
                    return Ok(None);
                }

                match employee.email.as_deref().map(str::trim) {
                    Some(email) if !email.is_empty() => {
                        store.find_user_by_email(&normalize_email(email)).await
                    }
                    _ => Ok(None),
                }
            }
        }
    }
}
