/// Password hashing using Argon2id
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2
/// - **Parallelism**: 1 lane
/// - **Salt**: 16 random bytes from the OS RNG
///
/// Hashing is deliberately slow; callers on an async runtime should run it
/// on the blocking pool (the session service does).
///
/// # Example
///
/// ```
/// use teamdeck_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery 1")?;
/// assert!(verify_password("correct horse battery 1", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

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

/// Hashes a password with Argon2id and a fresh random salt
///
/// # Returns
///
/// A PHC-format string embedding algorithm, parameters, salt, and hash,
/// e.g. `$argon2id$v=19$m=19456,t=2,p=1$...$...`
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(19456)
        .t_cost(2)
        .p_cost(1)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC-format hash
///
/// Comparison is constant-time. The parameters are read from the hash
/// itself, so hashes created with older parameter sets keep verifying.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` when the stored hash cannot be
/// parsed, `PasswordError::VerifyError` on other failures
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

/// Validates the password policy
///
/// Requirements:
/// - at least 8 characters
/// - at least one letter
/// - at least one digit
///
/// # Returns
///
/// `Ok(())` when the password is acceptable, `Err` with a human-readable
/// reason otherwise
///
/// # Example
///
/// ```
/// use teamdeck_shared::auth::password::validate_password_policy;
///
/// assert!(validate_password_policy("workable9pass").is_ok());
/// assert!(validate_password_policy("short1").is_err());
/// assert!(validate_password_policy("nodigitshere").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=19456"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_unique_salts() {
        let hash1 = hash_password("same_password1").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password1").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let password = "opaque_check_7";
        let hash = hash_password(password).expect("Hash should succeed");
        assert_ne!(hash, password);
        assert!(!hash.contains(password));
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_password1").expect("Hash should succeed");
        assert!(verify_password("correct_password1", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password1").expect("Hash should succeed");
        assert!(!verify_password("wrong_password1", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not_a_phc_string").is_err());
        assert!(verify_password("password", "$argon2id$broken").is_err());
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let passwords = [
            "simple12",
            "with spaces 3",
            "with-special-chars!@#4",
            "unicode-密码-パスワード5",
        ];

        for password in passwords {
            let hash = hash_password(password).expect("Hash should succeed");
            assert!(
                verify_password(password, &hash).expect("Verify should succeed"),
                "Password '{}' should verify",
                password
            );
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password_policy("abcdefg1").is_ok());
        assert!(validate_password_policy("A1b2c3d4e5").is_ok());

        let err = validate_password_policy("ab1").unwrap_err();
        assert!(err.contains("at least 8 characters"));

        let err = validate_password_policy("12345678").unwrap_err();
        assert!(err.contains("letter"));

        let err = validate_password_policy("abcdefgh").unwrap_err();
        assert!(err.contains("digit"));
    }
}
