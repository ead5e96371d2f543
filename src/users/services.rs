use std::sync::Arc;

use tracing::info;

use crate::{
    error::AppError,
    users::{
        repo::UserStore,
        repo_types::{ProfileChanges, UserProfile},
    },
};

const NOT_FOUND: &str = "user not found";

pub(crate) fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| AppError::InvalidId)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Read/update/delete over user records; no credential handling.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn UserStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> Result<Vec<UserProfile>, AppError> {
        Ok(self.store.list_profiles().await?)
    }

    pub async fn get_by_id(&self, raw_id: &str) -> Result<UserProfile, AppError> {
        let id = parse_user_id(raw_id)?;
        self.store
            .find_profile(id)
            .await?
            .ok_or(AppError::UserNotFound(NOT_FOUND))
    }

    pub async fn update_profile(
        &self,
        raw_id: &str,
        name: Option<String>,
        surname: Option<String>,
        phone_number: Option<String>,
    ) -> Result<UserProfile, AppError> {
        let id = parse_user_id(raw_id)?;
        let changes = ProfileChanges {
            name: normalize_optional(name),
            surname: normalize_optional(surname),
            phone_number: normalize_optional(phone_number),
        };
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        let updated = self
            .store
            .update_profile(id, &changes)
            .await?
            .ok_or(AppError::UserNotFound(NOT_FOUND))?;
        info!(user_id = id, "profile updated");
        Ok(updated)
    }

    pub async fn delete(&self, raw_id: &str) -> Result<i64, AppError> {
        let id = parse_user_id(raw_id)?;
        if !self.store.delete(id).await? {
            return Err(AppError::UserNotFound(NOT_FOUND));
        }
        info!(user_id = id, "user deleted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{memory::MemoryStore, repo_types::NewUser};

    async fn seeded(phones: &[&str]) -> DirectoryService {
        let store = Arc::new(MemoryStore::new());
        for (i, phone) in phones.iter().enumerate() {
            store
                .insert(NewUser {
                    name: format!("User{i}"),
                    surname: "Test".into(),
                    phone_number: phone.to_string(),
                    balance: i as f64,
                    password_hash: "x".into(),
                    session: format!("s{i}"),
                })
                .await
                .unwrap();
        }
        DirectoryService::new(store)
    }

    #[tokio::test]
    async fn list_all_on_empty_table_is_empty_not_error() {
        let svc = seeded(&[]).await;
        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_id() {
        let svc = seeded(&["+1", "+2", "+3"]).await;
        let ids: Vec<i64> = svc.list_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_by_id_validates_and_finds() {
        let svc = seeded(&["+1"]).await;
        assert_eq!(svc.get_by_id("abc").await.unwrap_err().code(), "INVALID_ID");
        assert_eq!(svc.get_by_id("9").await.unwrap_err().code(), "USER_NOT_FOUND");
        let user = svc.get_by_id(" 1 ").await.unwrap();
        assert_eq!(user.phone_number, "+1");
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let svc = seeded(&["+1"]).await;
        let updated = svc
            .update_profile("1", None, Some("Lee".into()), None)
            .await
            .unwrap();
        assert_eq!(updated.surname, "Lee");
        assert_eq!(updated.name, "User0");
        assert_eq!(updated.phone_number, "+1");
    }

    #[tokio::test]
    async fn update_edge_cases() {
        let svc = seeded(&["+1", "+2"]).await;
        let err = svc
            .update_profile("1", Some("  ".into()), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NO_FIELDS_TO_UPDATE");

        let err = svc
            .update_profile("7", Some("Zed".into()), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");

        let err = svc
            .update_profile("1", None, None, Some("+2".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "USER_EXISTS");
    }

    #[tokio::test]
    async fn delete_then_lookup_fails() {
        let svc = seeded(&["+1"]).await;
        assert_eq!(svc.delete("x").await.unwrap_err().code(), "INVALID_ID");
        assert_eq!(svc.delete("1").await.unwrap(), 1);
        assert_eq!(svc.get_by_id("1").await.unwrap_err().code(), "USER_NOT_FOUND");
        assert_eq!(svc.delete("1").await.unwrap_err().code(), "USER_NOT_FOUND");
    }
}
