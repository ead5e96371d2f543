//! In-process `UserStore` used by the test suites in place of Postgres.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::users::repo::{StoreError, StoreResult, UserStore};
use crate::users::repo_types::{NewUser, ProfileChanges, User, UserProfile};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut guard = self.inner.lock().expect("memory store poisoned");
        f(&mut guard)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn phone_exists(&self, phone: &str) -> StoreResult<bool> {
        Ok(self.with(|s| s.rows.iter().any(|u| u.phone_number == phone)))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<i64> {
        self.with(|s| {
            if s.rows.iter().any(|u| u.phone_number == user.phone_number) {
                return Err(StoreError::DuplicatePhone);
            }
            s.next_id += 1;
            let id = s.next_id;
            s.rows.push(User {
                id,
                name: user.name,
                surname: user.surname,
                phone_number: user.phone_number,
                balance: user.balance,
                password_hash: user.password_hash,
                session: Some(user.session),
            });
            Ok(id)
        })
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        Ok(self.with(|s| s.rows.iter().find(|u| u.phone_number == phone).cloned()))
    }

    async fn find_by_session(&self, session: &str) -> StoreResult<Option<User>> {
        Ok(self.with(|s| {
            s.rows
                .iter()
                .find(|u| u.session.as_deref() == Some(session))
                .cloned()
        }))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.with(|s| s.rows.iter().find(|u| u.id == id).cloned()))
    }

    async fn set_session(&self, id: i64, session: &str) -> StoreResult<bool> {
        Ok(self.with(|s| match s.rows.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.session = Some(session.to_string());
                true
            }
            None => false,
        }))
    }

    async fn clear_session(&self, session: &str) -> StoreResult<bool> {
        Ok(self.with(|s| {
            match s
                .rows
                .iter_mut()
                .find(|u| u.session.as_deref() == Some(session))
            {
                Some(u) => {
                    u.session = None;
                    true
                }
                None => false,
            }
        }))
    }

    async fn replace_session(&self, old: &str, new: &str) -> StoreResult<bool> {
        Ok(self.with(|s| {
            match s.rows.iter_mut().find(|u| u.session.as_deref() == Some(old)) {
                Some(u) => {
                    u.session = Some(new.to_string());
                    true
                }
                None => false,
            }
        }))
    }

    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<bool> {
        Ok(self.with(|s| match s.rows.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.password_hash = hash.to_string();
                true
            }
            None => false,
        }))
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        Ok(self.with(|s| {
            let mut rows: Vec<UserProfile> = s.rows.iter().cloned().map(Into::into).collect();
            rows.sort_by_key(|u| u.id);
            rows
        }))
    }

    async fn find_profile(&self, id: i64) -> StoreResult<Option<UserProfile>> {
        Ok(self.with(|s| s.rows.iter().find(|u| u.id == id).cloned().map(Into::into)))
    }

    async fn update_profile(
        &self,
        id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<UserProfile>> {
        self.with(|s| {
            if let Some(phone) = &changes.phone_number {
                if s.rows.iter().any(|u| u.id != id && &u.phone_number == phone) {
                    return Err(StoreError::DuplicatePhone);
                }
            }
            let Some(u) = s.rows.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            if let Some(name) = &changes.name {
                u.name = name.clone();
            }
            if let Some(surname) = &changes.surname {
                u.surname = surname.clone();
            }
            if let Some(phone) = &changes.phone_number {
                u.phone_number = phone.clone();
            }
            Ok(Some(u.clone().into()))
        })
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.with(|s| {
            let before = s.rows.len();
            s.rows.retain(|u| u.id != id);
            s.rows.len() != before
        }))
    }
}
