use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoggedIn, NewPasswordRequest, Registered, RegisterRequest},
        password, session,
    },
    config::{AuthConfig, PasswordResetMode},
    error::AppError,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User},
        services::parse_user_id,
    },
};

const NO_SUCH_SESSION: &str = "no user with this session";

/// Upper bound (exclusive) and scale of the `NUMERIC(15,2)` balance column.
const MAX_BALANCE: f64 = 1e13;
const BALANCE_SCALE: i64 = 2;

/// Parses an optional balance: absent or blank means 0, anything else must be
/// a finite non-negative number the balance column stores exactly.
pub(crate) fn parse_balance(raw: Option<&str>) -> Result<f64, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(0.0);
    };
    let balance = raw
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite() && *b >= 0.0 && *b < MAX_BALANCE)
        .ok_or(AppError::InvalidBalance)?;
    if decimal_places(raw).map_or(true, |places| places > BALANCE_SCALE) {
        return Err(AppError::InvalidBalance);
    }
    // "-0" parses as negative zero.
    Ok(balance + 0.0)
}

/// Significant digits after the decimal point once the exponent is applied.
fn decimal_places(raw: &str) -> Option<i64> {
    let (mantissa, exponent) = match raw.find(['e', 'E']) {
        Some(at) => (&raw[..at], raw[at + 1..].parse::<i64>().ok()?),
        None => (raw, 0),
    };
    let fraction = mantissa.split_once('.').map_or("", |(_, f)| f);
    let places = fraction.trim_end_matches('0').len() as i64;
    Some(places.saturating_sub(exponent).max(0))
}

/// Registration, login and session lifecycle over the credential store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    fn new_token(&self) -> String {
        session::generate(self.config.session_token_bytes)
    }

    async fn hash(&self, plain: &str) -> Result<String, AppError> {
        if plain.len() > password::MAX_PASSWORD_BYTES {
            return Err(AppError::Hash(format!(
                "password is longer than {} bytes",
                password::MAX_PASSWORD_BYTES
            )));
        }
        let plain = plain.to_owned();
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || password::hash_password(&plain, cost))
            .await?
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    async fn verify(&self, plain: &str, hash: &str) -> Result<bool, AppError> {
        let (plain, hash) = (plain.to_owned(), hash.to_owned());
        tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
            .await?
            .map_err(|e| AppError::PasswordCheck(e.to_string()))
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Registered, AppError> {
        let phone = req.phone_number.trim();
        if req.name.trim().is_empty()
            || req.surname.trim().is_empty()
            || phone.is_empty()
            || req.password.is_empty()
        {
            return Err(AppError::MissingFields(
                "name, surname, phone_number and password are required",
            ));
        }

        if self.store.phone_exists(phone).await? {
            warn!(phone = %phone, "phone already registered");
            return Err(AppError::UserExists);
        }

        let balance = parse_balance(req.balance.as_deref())?;
        let password_hash = self.hash(&req.password).await?;
        let session = self.new_token();

        // The unique constraint still catches a concurrent registration that
        // slipped past the existence check; it surfaces as USER_EXISTS.
        let user_id = self
            .store
            .insert(NewUser {
                name: req.name.trim().to_string(),
                surname: req.surname.trim().to_string(),
                phone_number: phone.to_string(),
                balance,
                password_hash,
                session: session.clone(),
            })
            .await?;

        info!(user_id, "user registered");
        Ok(Registered {
            user_id,
            session,
            balance,
        })
    }

    pub async fn login(&self, phone: &str, plain: &str) -> Result<LoggedIn, AppError> {
        let phone = phone.trim();
        if phone.is_empty() || plain.is_empty() {
            return Err(AppError::MissingFields("phone_number and password are required"));
        }

        let user = self
            .store
            .find_by_phone(phone)
            .await?
            .ok_or(AppError::UserNotFound("user not found"))?;

        if !self.verify(plain, &user.password_hash).await? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidPassword);
        }

        // Concurrent logins on a signed-out account each mint a token; the last write wins.
        let session = match user.session {
            Some(existing) => existing,
            None => {
                let fresh = self.new_token();
                if !self.store.set_session(user.id, &fresh).await? {
                    error!(user_id = user.id, "user vanished while issuing session");
                    return Err(AppError::UserNotFound("user not found"));
                }
                fresh
            }
        };

        info!(user_id = user.id, "user logged in");
        Ok(LoggedIn {
            user_id: user.id,
            name: user.name,
            surname: user.surname,
            phone_number: user.phone_number,
            balance: user.balance,
            session,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        let token = require_session(token)?;
        if !self.store.clear_session(token).await? {
            warn!("logout with unknown session");
            return Err(AppError::UserNotFound(NO_SUCH_SESSION));
        }
        info!("session cleared");
        Ok(())
    }

    /// Swaps `old` for a fresh token in one write and returns the new token.
    pub async fn refresh_session(&self, old: &str) -> Result<String, AppError> {
        let old = require_session(old)?;
        let fresh = self.new_token();
        if !self.store.replace_session(old, &fresh).await? {
            warn!("refresh with unknown session");
            return Err(AppError::UserNotFound(NO_SUCH_SESSION));
        }
        info!("session rotated");
        Ok(fresh)
    }

    pub async fn refresh_password(&self, req: NewPasswordRequest) -> Result<(), AppError> {
        let raw_id = req.id.trim();
        if raw_id.is_empty() || req.new_password.is_empty() {
            return Err(AppError::MissingFields("id and new_password are required"));
        }
        let id = parse_user_id(raw_id)?;

        if self.config.password_reset == PasswordResetMode::Verified {
            self.authorize_reset(id, &req).await?;
        }

        let hash = self.hash(&req.new_password).await?;
        if !self.store.set_password_hash(id, &hash).await? {
            return Err(AppError::UserNotFound("user with this id not found"));
        }
        info!(user_id = id, "password changed");
        Ok(())
    }

    /// Verified mode: the caller proves control of account `id` with its live
    /// session or its current password.
    async fn authorize_reset(&self, id: i64, req: &NewPasswordRequest) -> Result<(), AppError> {
        let session = req.session.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let current = req.current_password.as_deref().filter(|s| !s.is_empty());

        match (session, current) {
            (Some(token), _) => {
                let owner = self
                    .store
                    .find_by_session(token)
                    .await?
                    .ok_or(AppError::UserNotFound(NO_SUCH_SESSION))?;
                if owner.id != id {
                    warn!(user_id = id, owner_id = owner.id, "password reset with foreign session");
                    return Err(AppError::SessionMismatch);
                }
                Ok(())
            }
            (None, Some(current)) => {
                let user = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or(AppError::UserNotFound("user with this id not found"))?;
                if !self.verify(current, &user.password_hash).await? {
                    warn!(user_id = id, "password reset with wrong current password");
                    return Err(AppError::InvalidPassword);
                }
                Ok(())
            }
            (None, None) => Err(AppError::MissingFields(
                "session or current_password is required to change the password",
            )),
        }
    }

    pub async fn get_by_session(&self, token: &str) -> Result<User, AppError> {
        let token = require_session(token)?;
        self.store
            .find_by_session(token)
            .await?
            .ok_or(AppError::UserNotFound(NO_SUCH_SESSION))
    }
}

fn require_session(token: &str) -> Result<&str, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::MissingFields("session is required"));
    }
    Ok(token)
}
