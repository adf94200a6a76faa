use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash_password_with_cost(password, bcrypt::DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Compare a plaintext password with a stored bcrypt hash. A malformed stored
/// hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    match bcrypt::verify(password, hash) {
        Ok(matches) => Ok(matches),
        Err(bcrypt::BcryptError::InvalidHash(_))
        | Err(bcrypt::BcryptError::InvalidPrefix(_))
        | Err(bcrypt::BcryptError::InvalidCost(_))
        | Err(bcrypt::BcryptError::InvalidBase64(_)) => {
            tracing::warn!("Stored password hash is not a valid bcrypt hash");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough").is_ok());
    }

    #[test]
    fn verify_matches_only_original_password() {
        let hash = hash_password_with_cost("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "plaintext-not-a-hash").unwrap());
    }
}
