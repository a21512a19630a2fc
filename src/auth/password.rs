//! Password hashing and verification using bcrypt.

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password with the given bcrypt cost. The salt is generated per
/// call, so equal passwords produce distinct hashes.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a stored bcrypt hash. The comparison inside
/// bcrypt is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts, keeps the suite fast; runtime cost comes
    // from config.
    const COST: u32 = 4;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("mysecret1", COST).unwrap();
        assert!(verify_password("mysecret1", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn same_password_different_hashes() {
        let h1 = hash_password("password1", COST).unwrap();
        let h2 = hash_password("password1", COST).unwrap();
        assert_ne!(h1, h2);
        assert!(verify_password("password1", &h2).unwrap());
    }

    #[test]
    fn hash_is_not_plaintext() {
        let hash = hash_password("plaintext-password", COST).unwrap();
        assert!(!hash.contains("plaintext-password"));
    }
}
