//! User Repository

use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, Database, IndexModel};
use std::collections::HashMap;

use crate::shared::error::Result;
use crate::user::entity::{Role, User};

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Create the unique indexes backing the registration uniqueness checks.
    pub async fn ensure_indexes(&self) -> Result<()> {
        for field in ["username", "email", "phoneNumber"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection.create_index(index).await?;
        }
        Ok(())
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    pub async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        Ok(self
            .collection
            .find_one(doc! { "phoneNumber": phone_number })
            .await?)
    }

    /// All accounts with the given role, sorted ascending by username.
    pub async fn find_by_role(&self, role: Role) -> Result<Vec<User>> {
        let role = bson::to_bson(&role)?;
        let cursor = self
            .collection
            .find(doc! { "role": role })
            .sort(doc! { "username": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Fetch a batch of accounts keyed by id (counsellor reference resolution).
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<HashMap<String, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
    }
}
