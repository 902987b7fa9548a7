//! Account passwords, hashed with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use blog_core::ports::{AuthError, PasswordService};

/// Hashes are stored on `users.password_hash` as PHC strings.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    /// Verified against when a login names an unknown user.
    decoy_hash: Option<String>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2
            .hash_password(b"blogicum-decoy", &salt)
            .map(|h| h.to_string())
            .inspect_err(|e| tracing::warn!(error = %e, "Could not prepare decoy password hash"))
            .ok();

        Self { argon2, decoy_hash }
    }

    fn matches(&self, password: &str, hash: &PasswordHash<'_>) -> bool {
        self.argon2
            .verify_password(password.as_bytes(), hash)
            .is_ok()
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn check_login(&self, password: &str, stored_hash: Option<&str>) -> bool {
        let Some(stored_hash) = stored_hash else {
            if let Some(decoy) = self.decoy_hash.as_deref().and_then(|h| PasswordHash::new(h).ok()) {
                self.matches(password, &decoy);
            }
            return false;
        };

        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self.matches(password, &parsed),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unreadable, refusing login");
                false
            }
        }
    }
}
