use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};

use crate::{
    domain::{Capability, User},
    error::{AppError, Result},
};

pub mod token;

pub use token::{Claims, TokenService};

/// Single capability gate used by every operation that needs a role.
/// Deactivated accounts hold no capabilities.
pub fn authorize(actor: &User, capability: Capability) -> Result<()> {
    if actor.is_active && actor.role.grants(capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden(capability.describe().to_string()))
    }
}

pub struct PasswordService;

impl PasswordService {
    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }
}
