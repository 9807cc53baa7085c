use crate::domain::models::User;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::preferences::PreferenceStore;
use crate::infrastructure::revoke_client::TokenRevoker;
use crate::infrastructure::storage::LocalStorage;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GIS_SCOPE: &str = "profile email";
const CLIENT_ID_KEYS: [&str; 2] = ["DASHIE_GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_ID"];

/// What the page needs to initialise Google Identity Services.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub client_id: Option<String>,
    pub scope: String,
}

pub fn resolve_auth_config<F>(lookup: F, app_config: &AppConfig) -> AuthConfig
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = CLIENT_ID_KEYS.iter().find_map(|key| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    });
    AuthConfig {
        client_id: from_env.or_else(|| app_config.google_client_id().map(ToOwned::to_owned)),
        scope: GIS_SCOPE.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CredentialClaims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Reads the payload segment of a GIS ID token. The signature is not checked;
/// the token only seeds the profile shown on the kiosk.
pub fn decode_credential(credential: &str) -> Result<CredentialClaims, InfraError> {
    let mut segments = credential.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(InfraError::Auth(
            "credential must have three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|error| InfraError::Auth(format!("credential payload is not base64url: {error}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|error| InfraError::Auth(format!("invalid credential payload: {error}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutResult {
    pub revoked: bool,
    pub revoke_error: Option<String>,
}

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AuthManager<S, R>
where
    S: LocalStorage + ?Sized,
    R: TokenRevoker + ?Sized,
{
    preferences: PreferenceStore<S>,
    revoker: Arc<R>,
    now_provider: NowProvider,
}

impl<S, R> AuthManager<S, R>
where
    S: LocalStorage + ?Sized,
    R: TokenRevoker + ?Sized,
{
    pub fn new(preferences: PreferenceStore<S>, revoker: Arc<R>) -> Self {
        Self {
            preferences,
            revoker,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    /// The stored user while the sign-in is fresh. Stale or unreadable records
    /// are removed and read as signed out.
    pub fn restore_session(&self) -> Result<Option<User>, InfraError> {
        let user = match self.preferences.load_user() {
            Ok(user) => user,
            Err(InfraError::Json(_) | InfraError::Auth(_)) => {
                self.preferences.clear_user()?;
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        match user {
            Some(user) if user.is_fresh_at((self.now_provider)()) => Ok(Some(user)),
            Some(_) => {
                self.preferences.clear_user()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn sign_in_with_credential(&self, credential: &str) -> Result<User, InfraError> {
        let claims = decode_credential(credential)?;
        let name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| claims.email.clone());
        let user = User {
            id: claims.sub,
            name,
            email: claims.email,
            picture: claims.picture,
            signed_in_at: (self.now_provider)(),
            access_token: None,
        };
        self.preferences.save_user(&user)?;
        Ok(user)
    }

    pub fn attach_access_token(&self, access_token: &str) -> Result<User, InfraError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(InfraError::Auth("access token must not be empty".to_string()));
        }
        let mut user = self
            .restore_session()?
            .ok_or_else(|| InfraError::Auth("no signed-in user".to_string()))?;
        user.access_token = Some(access_token.to_string());
        self.preferences.save_user(&user)?;
        Ok(user)
    }

    /// Revokes the access token when there is one, then forgets the user even
    /// if revocation failed.
    pub async fn sign_out(&self) -> Result<SignOutResult, InfraError> {
        let access_token = self
            .preferences
            .load_user()
            .ok()
            .flatten()
            .and_then(|user| user.access_token);

        let mut result = SignOutResult {
            revoked: false,
            revoke_error: None,
        };
        if let Some(token) = access_token {
            match self.revoker.revoke(&token).await {
                Ok(()) => result.revoked = true,
                Err(error) => result.revoke_error = Some(error.to_string()),
            }
        }

        self.preferences.clear_user()?;
        Ok(result)
    }
}
