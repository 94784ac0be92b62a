use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub const MIN_PASSWORD_LEN: usize = 8;
/// Upper bound keeps a single login from burning unbounded hashing time.
pub const MAX_PASSWORD_LEN: usize = 256;

/// Registration rules; returns the message shown on the `password` field.
pub fn check_policy(plain: &str) -> Result<(), &'static str> {
    let len = plain.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    if len > MAX_PASSWORD_LEN {
        return Err("Password is too long");
    }
    Ok(())
}

fn argon_err(op: &'static str) -> impl Fn(password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, op, "argon2 failure");
        anyhow::anyhow!("argon2 {}: {}", op, e)
    }
}

/// PHC-format argon2id hash with a fresh salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(argon_err("hash"))?;
    Ok(phc.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(argon_err("parse"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon_err("verify")(e)),
    }
}
