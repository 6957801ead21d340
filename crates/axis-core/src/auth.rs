//! Authentication gate.
//!
//! The rest of the core only asks whether a session exists. Account
//! management sits behind [`AuthProvider`]; [`LocalAuthProvider`] keeps
//! accounts and the signed-in session in a [`StateStorage`] record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, CoreError, Result, ValidationError};
use crate::storage::{StateStorage, AUTH_KEY};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

pub trait AuthProvider {
    fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
    fn sign_out(&self) -> Result<()>;
    fn current_session(&self) -> Option<AuthSession>;

    fn has_session(&self) -> bool {
        self.current_session().is_some()
    }
}

/// Fail with [`AuthError::NotSignedIn`] unless `provider` has a session.
pub fn require_session(provider: &dyn AuthProvider) -> Result<AuthSession> {
    provider
        .current_session()
        .ok_or(CoreError::Auth(AuthError::NotSignedIn))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    email: String,
    salt: String,
    password_digest: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct AuthRecord {
    accounts: Vec<Account>,
    session: Option<AuthSession>,
}

pub struct LocalAuthProvider<S: StateStorage> {
    storage: S,
}

impl<S: StateStorage> LocalAuthProvider<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<AuthRecord> {
        match self.storage.load(AUTH_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(AuthRecord::default()),
        }
    }

    fn store(&self, record: &AuthRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.storage.save(AUTH_KEY, &json)?;
        Ok(())
    }

    fn open_session(&self, record: &mut AuthRecord, email: &str) -> Result<AuthSession> {
        let session = AuthSession {
            token: uuid::Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            signed_in_at: Utc::now(),
        };
        record.session = Some(session.clone());
        self.store(record)?;
        tracing::info!(email, "signed in");
        Ok(session)
    }
}

impl<S: StateStorage> AuthProvider for LocalAuthProvider<S> {
    fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::InvalidValue {
                field: "password".into(),
                message: format!("must be at least {MIN_PASSWORD_LEN} characters"),
            }
            .into());
        }

        let mut record = self.load()?;
        if record.accounts.iter().any(|a| a.email == email) {
            return Err(AuthError::AlreadyRegistered(email).into());
        }
        let salt = uuid::Uuid::new_v4().simple().to_string();
        record.accounts.push(Account {
            password_digest: digest(&salt, password),
            email: email.clone(),
            salt,
            created_at: Utc::now(),
        });
        self.open_session(&mut record, &email)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        let mut record = self.load()?;
        let verified = record
            .accounts
            .iter()
            .any(|a| a.email == email && a.password_digest == digest(&a.salt, password));
        if !verified {
            tracing::debug!(email = %email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.open_session(&mut record, &email)
    }

    fn sign_out(&self) -> Result<()> {
        let mut record = self.load()?;
        if record.session.take().is_some() {
            self.store(&record)?;
        }
        Ok(())
    }

    fn current_session(&self) -> Option<AuthSession> {
        match self.load() {
            Ok(record) => record.session,
            Err(e) => {
                tracing::warn!(error = %e, "auth record unreadable");
                None
            }
        }
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ValidationError::InvalidValue {
            field: "email".into(),
            message: format!("'{email}' is not an email address"),
        }
        .into());
    }
    Ok(email)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
