use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::onboarding::{UserProfile, PROFILE_ROW_KEY};

use super::table::{Table, Versioned};

/// One profile row per user.
#[derive(Clone)]
pub struct UserStore {
    table: Arc<dyn Table<UserProfile>>,
}

impl UserStore {
    pub fn new(table: Arc<dyn Table<UserProfile>>) -> Self {
        Self { table }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<Versioned<UserProfile>>, CoreError> {
        self.table.get(user_id, PROFILE_ROW_KEY).await
    }

    pub async fn put(&self, profile: UserProfile) -> Result<Versioned<UserProfile>, CoreError> {
        self.table.upsert(profile).await
    }
}
