//! A ready-made service for user accounts.
//!
//! Passwords are stored as Argon2id PHC strings, never in plain text.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, OperationError, ServiceProgrammingError};
use crate::settings::Settings;

use super::decorator::LogMessages;
use super::model::{Fields, Model};
use super::service::{CreationStrategy, Service, ServiceResult};
use super::store::Repository;

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Primary key
    pub id: Option<i64>,
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Password hash
    pub password: String,
    /// May use the admin site
    pub is_staff: bool,
    /// Has every permission
    pub is_superuser: bool,
    /// May log in
    pub is_active: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: None,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
        }
    }
}

impl Model for User {
    const NAME: &'static str = "User";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "password",
        "is_staff",
        "is_superuser",
        "is_active",
    ];

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = Some(pk);
    }
}

/// Hashes `raw` with Argon2id and a random salt.
///
/// # Errors
///
/// Returns a runtime failure if hashing fails.
pub fn make_password(raw: &str) -> Result<String, OperationError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("could not hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Returns `true` if `raw` matches the user's stored hash.
///
/// A malformed stored hash never matches.
pub fn check_password(user: &User, raw: &str) -> bool {
    PasswordHash::new(&user.password)
        .map(|hash| {
            Argon2::default()
                .verify_password(raw.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

fn create_account(
    repository: &dyn Repository<User>,
    mut fields: Fields,
    superuser: bool,
) -> Result<User, OperationError> {
    match fields.get("username") {
        Some(Value::String(name)) if !name.is_empty() => {}
        _ => {
            return Err(ServiceProgrammingError::MissingArgument {
                argument: "username",
                service: "UserService".to_string(),
            }
            .into())
        }
    }
    let raw = match fields.remove("password") {
        Some(Value::String(raw)) => Some(raw),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(ServiceProgrammingError::ModelMismatch {
                service: "UserService".to_string(),
                expected: User::NAME,
                found: format!("password {other}"),
            }
            .into())
        }
    };

    let mut user = User::from_fields(fields)?;
    if let Some(raw) = raw {
        user.password = make_password(&raw)?;
    }
    if superuser {
        user.is_staff = true;
        user.is_superuser = true;
    }
    Ok(repository.insert(user)?)
}

/// Creation that hashes the `password` field.
pub fn create_user_strategy() -> CreationStrategy<User> {
    CreationStrategy::new(|repository, fields| create_account(repository, fields, false))
}

/// Creation that hashes the password and grants staff and superuser flags.
pub fn create_superuser_strategy() -> CreationStrategy<User> {
    CreationStrategy::new(|repository, fields| create_account(repository, fields, true))
}

/// Builds the `UserService`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingLogger`] if the settings have no logger.
pub fn user_service(
    repository: Arc<dyn Repository<User>>,
    settings: &Settings,
) -> Result<Service<User>, ConfigError> {
    Service::builder("UserService", repository)
        .creation(create_user_strategy())
        .build(settings)
}

impl Service<User> {
    /// Creates a staff superuser.
    ///
    /// # Errors
    ///
    /// Same as [`Service::create`].
    pub fn create_superuser(&self, fields: Fields, messages: LogMessages) -> ServiceResult<User> {
        self.create_with(&create_superuser_strategy(), fields, messages)
    }

    /// Hashes `raw` and stores it as the password of `instance` (or the
    /// handle's own user).
    ///
    /// # Errors
    ///
    /// Same as [`Service::update`].
    pub fn set_password(
        &self,
        instance: Option<&User>,
        raw: &str,
        messages: LogMessages,
    ) -> ServiceResult<User> {
        let hash = match make_password(raw) {
            Ok(hash) => hash,
            Err(err) => return self.call_for_write(messages, |_| Err(err)),
        };
        self.update(instance, Fields::new().set("password", hash), messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::logging::RecordingSink;
    use crate::services::InMemoryStore;

    fn service() -> (Service<User>, Arc<InMemoryStore<User>>) {
        let store = Arc::new(InMemoryStore::<User>::new().unique(&["username"]));
        let settings = Settings::default().with_logger(RecordingSink::shared());
        (user_service(store.clone(), &settings).unwrap(), store)
    }

    fn messages() -> LogMessages {
        LogMessages::new().info("user $objects$").error("user failed")
    }

    #[test]
    fn create_hashes_password() {
        let (service, _store) = service();
        let created = service
            .create(
                Fields::new().set("username", "ada").set("password", "s3cret"),
                messages(),
            )
            .unwrap()
            .unwrap();
        let user = created.objects().instance().unwrap();

        assert!(user.password.starts_with("$argon2id$"));
        assert!(check_password(user, "s3cret"));
        assert!(!check_password(user, "guess"));
        assert!(!user.is_superuser);
        assert!(user.is_active);
    }

    #[test]
    fn superuser_gets_flags() {
        let (service, _store) = service();
        let created = service
            .create_superuser(
                Fields::new().set("username", "root").set("password", "pw"),
                messages(),
            )
            .unwrap()
            .unwrap();
        let user = created.objects().instance().unwrap();
        assert!(user.is_staff && user.is_superuser);
    }

    #[test]
    fn username_is_required() {
        let (service, store) = service();
        let err = service
            .create(Fields::new().set("email", "a@b.c"), messages())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Programming(ServiceProgrammingError::MissingArgument {
                argument: "username",
                ..
            })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_username_is_a_runtime_failure() {
        let (service, _store) = service();
        let fields = Fields::new().set("username", "ada");
        service.create(fields.clone(), messages()).unwrap();
        let err = service.create(fields, messages()).unwrap_err();
        assert!(!err.is_programming());
    }

    #[test]
    fn set_password_rehashes() {
        let (service, store) = service();
        let created = service
            .create(
                Fields::new().set("username", "ada").set("password", "old"),
                messages(),
            )
            .unwrap()
            .unwrap();

        created.set_password(None, "new", messages()).unwrap().unwrap();

        let stored = store.fetch_all().unwrap().remove(0);
        assert!(check_password(&stored, "new"));
        assert!(!check_password(&stored, "old"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        let user = User {
            password: "plain".to_string(),
            ..User::default()
        };
        assert!(!check_password(&user, "plain"));
    }
}
