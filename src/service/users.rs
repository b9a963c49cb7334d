use crate::db::{NewUser, UserGateway};
use crate::error::{StoreError, UserError};
use crate::types::{SignUpRequest, UserView};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Business rules for signup and listing, layered over a [`UserGateway`].
///
/// Holds nothing but the gateway handle; every call is independent.
pub struct UserService<G: UserGateway> {
    gateway: Arc<G>,
}

impl<G: UserGateway> Clone for UserService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

struct ValidSignUp {
    name: String,
    email: String,
    password: String,
}

impl<G: UserGateway> UserService<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    /// Validate, hash the credential and persist a new user.
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<UserView, UserError> {
        let ValidSignUp {
            name,
            email,
            password,
        } = validate(req)?;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| UserError::Unexpected(format!("hashing task failed: {e}")))??;

        let record = self
            .gateway
            .create_user(NewUser {
                name,
                email: email.clone(),
                password_hash,
            })
            .await
            .map_err(|e| map_store_error(e, &email))?;

        info!(user_id = record.id, email = %record.email, "created user");
        Ok(record.into())
    }

    pub async fn list_users(&self) -> Result<Vec<UserView>, UserError> {
        let rows = self
            .gateway
            .list_users()
            .await
            .map_err(|e| map_store_error(e, ""))?;
        debug!(count = rows.len(), "listed users");
        Ok(rows.into_iter().map(UserView::from).collect())
    }
}

fn map_store_error(e: StoreError, email: &str) -> UserError {
    match e {
        StoreError::ConstraintViolation(_) => UserError::DuplicateUser(email.to_string()),
        StoreError::ConnectivityFailure(_) => {
            warn!(error = %e, "backing store unavailable");
            UserError::ServiceUnavailable(e)
        }
        StoreError::Query(_) => UserError::Unexpected(e.to_string()),
    }
}

fn validate(req: SignUpRequest) -> Result<ValidSignUp, UserError> {
    let name = req.name.trim();
    let email = req.email.trim();

    if name.is_empty() {
        return Err(UserError::BadRequest("`name` is required".to_string()));
    }
    if email.is_empty() {
        return Err(UserError::BadRequest("`email` is required".to_string()));
    }
    if req.password.trim().is_empty() {
        return Err(UserError::BadRequest("`password` is required".to_string()));
    }
    if !is_well_formed_email(email) {
        return Err(UserError::BadRequest(format!(
            "`email` is not a valid address: {email}"
        )));
    }

    Ok(ValidSignUp {
        name: name.to_string(),
        email: email.to_lowercase(),
        password: req.password,
    })
}

fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Unexpected(format!("password hashing failed: {e}")))
}
