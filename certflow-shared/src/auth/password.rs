/// Password hashing and temporary credential generation
///
/// Hashing uses Argon2id, the Password Hashing Competition winner, with
/// memory-hard parameters. Temporary credentials for provisioned accounts
/// are drawn from the OS RNG and re-sampled until they satisfy the same
/// strength policy sign-up enforces.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Plaintext passwords are never stored or logged; the temporary credential
/// a provisioner generates is returned exactly once to the caller.
///
/// # Example
///
/// ```
/// use certflow_shared::auth::password::{generate_temp_password, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let temp = generate_temp_password();
/// let hash = hash_password(&temp)?;
///
/// assert!(verify_password(&temp, &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::{rngs::OsRng, Rng};

/// Length of generated temporary passwords
pub const TEMP_PASSWORD_LEN: usize = 12;

/// Character set for generated temporary passwords
///
/// Mixed upper/lower/digit/symbol so generated credentials satisfy
/// [`validate_password_strength`]. Ambiguous glyphs (0/O, 1/l/I) are left
/// out since these passwords get typed from an email.
const TEMP_PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%^&*-_=+";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id
///
/// # Arguments
///
/// * `password` - The plaintext password to hash
///
/// # Returns
///
/// PHC string format hash (algorithm, parameters, salt, and hash), e.g.
/// `$argon2id$v=19$m=65536,t=3,p=4$...`
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut SaltRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Comparison is constant-time.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it does not
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` for unparseable hashes and
/// `PasswordError::VerifyError` for other failures.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Generates a temporary password for a provisioned account
///
/// Draws [`TEMP_PASSWORD_LEN`] characters from the mixed charset using the
/// OS RNG, re-sampling until the result passes
/// [`validate_password_strength`] so every generated credential carries all
/// four character classes.
///
/// The returned plaintext is handed to the caller exactly once for delivery
/// to the account owner; only its hash is ever persisted.
///
/// # Example
///
/// ```
/// use certflow_shared::auth::password::{generate_temp_password, validate_password_strength};
///
/// let temp = generate_temp_password();
/// assert_eq!(temp.chars().count(), 12);
/// assert!(validate_password_strength(&temp).is_ok());
/// ```
pub fn generate_temp_password() -> String {
    let mut rng = OsRng;

    loop {
        let candidate: String = (0..TEMP_PASSWORD_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..TEMP_PASSWORD_CHARSET.len());
                TEMP_PASSWORD_CHARSET[idx] as char
            })
            .collect();

        if validate_password_strength(&candidate).is_ok() {
            return candidate;
        }
    }
}

/// Validates password strength
///
/// Requirements:
/// - At least 8 characters long
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
/// - Contains at least one special character
///
/// # Returns
///
/// `Ok(())` if the password is strong enough, `Err` with a description if
/// not
///
/// # Example
///
/// ```
/// use certflow_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("MyP@ssw0rd!").is_ok());
/// assert!(validate_password_strength("Sh0rt!").is_err());
/// assert!(validate_password_strength("Password123").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
