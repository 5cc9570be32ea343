//! Development Data Seeder
//!
//! Seeds default staff accounts on application startup in dev mode.
//!
//! Default credentials:
//!   Admin:      admin@krmu.edu.in / DevPassword123
//!   Counsellor: asha@krmu.edu.in / DevPassword123
//!   Teacher:    rohan@krmu.edu.in / DevPassword123

use mongodb::Database;
use tracing::info;

use crate::auth::password_service::{Argon2Config, PasswordPolicy, PasswordService};
use crate::shared::error::Result;
use crate::user::entity::{Role, User};
use crate::user::repository::UserRepository;

const DEV_PASSWORD: &str = "DevPassword123";

/// Development data seeder
pub struct DevDataSeeder {
    user_repo: UserRepository,
    password_service: PasswordService,
}

impl DevDataSeeder {
    pub fn new(db: &Database) -> Self {
        // Faster hashing for seeding, still Argon2id
        let password_service =
            PasswordService::new(Argon2Config::testing(), PasswordPolicy::default());
        Self {
            user_repo: UserRepository::new(db),
            password_service,
        }
    }

    /// Seed all development accounts (idempotent).
    pub async fn seed(&self) -> Result<()> {
        info!("=== DEV DATA SEEDER ===");

        self.seed_account("admin", "9800000001", "admin@krmu.edu.in", Role::Admin)
            .await?;
        self.seed_account("asha", "9800000002", "asha@krmu.edu.in", Role::Counsellor)
            .await?;
        self.seed_account("rohan", "9800000003", "rohan@krmu.edu.in", Role::Teacher)
            .await?;

        info!("Default logins (password: {}):", DEV_PASSWORD);
        info!("  Admin:      admin@krmu.edu.in");
        info!("  Counsellor: asha@krmu.edu.in");
        info!("  Teacher:    rohan@krmu.edu.in");
        info!("=======================");

        Ok(())
    }

    async fn seed_account(
        &self,
        username: &str,
        phone: &str,
        email: &str,
        role: Role,
    ) -> Result<()> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(());
        }

        let hash = self.password_service.hash_password(DEV_PASSWORD)?;
        let user = User::new(username, phone, email, hash, role);
        self.user_repo.insert(&user).await?;
        info!(email = email, role = ?role, "seeded dev account");

        Ok(())
    }
}
