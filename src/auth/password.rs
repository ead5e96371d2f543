use tracing::error;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Outcome of comparing a password against a stored hash.
///
/// A malformed stored hash is an `Err`, never `Ok(false)`: it is a server fault,
/// not a failed login.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        e
    })
}

pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        e
    })
}
