/// Credential provisioning
///
/// Two paths share the same generation step:
///
/// - `provision_user`: no account resolved and creation is permitted - a
///   learner account is created with a fresh temporary credential.
/// - `backfill_credential`: an account resolved but carries no credential -
///   the same generation runs against the existing record.
///
/// Only the Argon2 hash is persisted; the plaintext travels back to the
/// orchestrator exactly once so the notifier can deliver it, and it is
/// never logged.

use validator::ValidateEmail;

use certflow_shared::auth::password::{generate_temp_password, hash_password};
use certflow_shared::models::user::{normalize_email, CreateUser, User, UserRole};

use super::store::{StoreError, WorkflowStore};

/// Error type for provisioning operations
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The supplied email does not look like an email
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Credential hashing failed
    #[error("failed to hash credential: {0}")]
    Hash(String),

    /// The store rejected the write
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A user together with the one-time plaintext of its new credential
#[derive(Debug, Clone)]
pub struct ProvisionedUser {
    /// The created or updated account
    pub user: User,

    /// Generated plaintext, for notification and caller echo only
    pub temp_password: String,
}

/// Creates a learner account with a generated temporary credential
///
/// The email is normalized and syntax-checked first. The account is created
/// with `must_reset_password` set so the first sign-in forces a change, and
/// the display name defaults to the email local part.
///
/// # Errors
///
/// Returns `ProvisionError::InvalidEmail` for unusable addresses,
/// `ProvisionError::Hash` if hashing fails, or the store error for write
/// failures (including an email unique-violation if the account appeared
/// concurrently).
pub async fn provision_user(
    store: &dyn WorkflowStore,
    email: &str,
) -> Result<ProvisionedUser, ProvisionError> {
    let email = normalize_email(email);
    if !email.validate_email() {
        return Err(ProvisionError::InvalidEmail(email));
    }

    let temp_password = generate_temp_password();
    let password_hash = hash_password(&temp_password).map_err(|e| ProvisionError::Hash(e.to_string()))?;

    let name = email.split('@').next().map(str::to_string);

    let user = store
        .create_user(CreateUser {
            email,
            name,
            role: UserRole::Learner,
            password_hash: Some(password_hash),
            must_reset_password: true,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Provisioned new learner account");

    Ok(ProvisionedUser {
        user,
        temp_password,
    })
}

/// Generates and stores a credential for an account that has none
///
/// Callers check `user.has_credential()` on the freshly resolved record
/// before reaching here; this path never overwrites a live credential.
///
/// # Errors
///
/// Returns `ProvisionError::Hash` if hashing fails or the store error for
/// update failures.
pub async fn backfill_credential(
    store: &dyn WorkflowStore,
    user: &User,
) -> Result<ProvisionedUser, ProvisionError> {
    let temp_password = generate_temp_password();
    let password_hash = hash_password(&temp_password).map_err(|e| ProvisionError::Hash(e.to_string()))?;

    let updated = store.set_user_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %updated.id, "Backfilled credential on existing account");

    Ok(ProvisionedUser {
        user: updated,
        temp_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_email_detected_before_any_write() {
        // Pure check on the validation predicate the provisioner applies;
        // store interaction is covered by the API integration tests.
        assert!(!"not-an-email".validate_email());
        assert!(!"".validate_email());
        assert!("jane@example.com".validate_email());
    }

    #[test]
    fn test_name_defaults_to_local_part() {
        let email = normalize_email("Jane.Doe@Example.com");
        let name = email.split('@').next().map(str::to_string);
        assert_eq!(name.as_deref(), Some("jane.doe"));
    }
}
