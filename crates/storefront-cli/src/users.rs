//! Account administration commands.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use storefront_core::{normalize_email, validate_signup, Role};
use storefront_db::NewUser;

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}

/// Creates an admin account, or promotes the account that already owns
/// `email`. The password of an existing account is left untouched.
///
/// # Errors
///
/// Returns an error if the input fails signup validation or a database
/// operation fails.
pub(crate) async fn run_create_admin(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let email = normalize_email(email);
    let name = name.trim();
    validate_signup(name, &email, password)?;

    if let Some(existing) = storefront_db::get_user_by_email(pool, &email).await? {
        if existing.role() == Role::Admin {
            println!("{email} is already an admin (id {})", existing.id);
            return Ok(());
        }
        storefront_db::set_user_role(pool, existing.id, Role::Admin).await?;
        tracing::info!(user_id = existing.id, "promoted existing account to admin");
        println!("promoted {email} (id {}) to admin", existing.id);
        return Ok(());
    }

    let password_hash = hash_password(password)?;
    let user = storefront_db::create_user(
        pool,
        &NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            role: Role::Admin,
            phone: None,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, "admin account created");
    println!("created admin {email} (id {})", user.id);
    Ok(())
}

/// Promotes the account that owns `email` to admin.
///
/// # Errors
///
/// Returns an error if no account has that email or the update fails.
pub(crate) async fn run_make_admin(pool: &sqlx::PgPool, email: &str) -> anyhow::Result<()> {
    let email = normalize_email(email);
    let user = storefront_db::get_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no account with email '{email}'"))?;

    storefront_db::set_user_role(pool, user.id, Role::Admin).await?;
    println!("{email} (id {}) is now an admin", user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashed_password_verifies_with_default_argon2() {
        let hash = hash_password("secret1").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"secret1", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"secret2", &parsed)
            .is_err());
    }
}
