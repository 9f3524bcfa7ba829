use crate::config::SeedAdmin;
use crate::crypto::Crypto;
use crate::db::{self, Database, NewUser};
use crate::domain::account_forms::normalize_email;
use crate::domain::models::{AccountStatus, UserRole};
use crate::services::accounts::hash_password;
use anyhow::Result;

/// Creates the bootstrap administrator when configured and not already present.
pub async fn seed_admin(db: &Database, crypto: &Crypto, seed: Option<&SeedAdmin>) -> Result<()> {
    let Some(seed) = seed else {
        return Ok(());
    };

    let email = normalize_email(&seed.email);
    if db::find_user_by_email(db.pool(), &email).await?.is_some() {
        tracing::debug!("Seed admin {} already exists", email);
        return Ok(());
    }

    let hash = hash_password(&seed.password)
        .map_err(|e| anyhow::anyhow!("Failed to hash seed admin password: {}", e))?;
    let enc_name = crypto.encrypt_str("Administrator")?;

    let user = db::insert_user(
        db.pool(),
        NewUser {
            email: &email,
            hash: &hash,
            role: UserRole::Admin,
            status: AccountStatus::Active,
            enc_name: &enc_name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Seeded administrator {}", email);
    Ok(())
}
