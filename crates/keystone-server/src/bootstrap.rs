//! Startup user seeding.
//!
//! Seeds an admin user (and optionally a test user) on first startup,
//! hashing passwords with Argon2id. Seeding is idempotent: existing
//! emails are skipped, so restarting the process never duplicates users.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use keystone_db_postgres::{NewUser, PostgresStore};
use tracing::info;

use crate::config::BootstrapConfig;

/// Statistics about the seeding run.
#[derive(Debug, Default)]
pub struct BootstrapStats {
    pub created: usize,
    pub skipped: usize,
}

/// Hash a password for storage using Argon2id.
///
/// Uses a cryptographically secure random salt and the default parameters,
/// producing a PHC-formatted hash string.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Seeds the configured users.
///
/// # Errors
///
/// Returns an error if hashing or an insert fails; a partial run leaves
/// already-created users in place (inserts are individually idempotent).
pub async fn seed_users(
    store: &PostgresStore,
    config: &BootstrapConfig,
) -> anyhow::Result<BootstrapStats> {
    info!("starting user bootstrap");

    let mut stats = BootstrapStats::default();

    let admin = NewUser {
        email: config.admin_email.clone(),
        password_hash: hash_password(&config.admin_password)
            .map_err(|e| anyhow::anyhow!("admin password hashing failed: {e}"))?,
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        role: "ADMIN".to_string(),
    };
    record(store.insert_user_if_absent(&admin).await?, &admin, &mut stats);

    if !config.test_password.is_empty() {
        let test_user = NewUser {
            email: config.test_email.clone(),
            password_hash: hash_password(&config.test_password)
                .map_err(|e| anyhow::anyhow!("test password hashing failed: {e}"))?,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: "USER".to_string(),
        };
        record(
            store.insert_user_if_absent(&test_user).await?,
            &test_user,
            &mut stats,
        );
    }

    info!(
        created = stats.created,
        skipped = stats.skipped,
        "user bootstrap completed"
    );

    Ok(stats)
}

fn record(created: bool, user: &NewUser, stats: &mut BootstrapStats) {
    if created {
        info!(email = %user.email, role = %user.role, "user created");
        stats.created += 1;
    } else {
        info!(email = %user.email, "user already exists, skipping");
        stats.skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn test_hash_password_produces_argon2id() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("admin123").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"admin123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("admin123").unwrap();
        let b = hash_password("admin123").unwrap();
        assert_ne!(a, b);
    }
}
