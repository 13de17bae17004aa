use crate::domain::models::{
    AuthTokens, LoginRequest, RefreshRequest, RegisterRequest, VerifyPhoneRequest,
    VerifyTwoFactorRequest,
};
use crate::infrastructure::api_client::BackendApiClient;
use crate::infrastructure::config::RefreshMode;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::token_store::TokenStore;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    TwoFactorRequired { user_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Authenticated,
    PhoneVerificationRequired { user_id: String },
}

/// Owns the auth lifecycle: silent refresh at startup, login and signup
/// flows, logout, and the single-flight refresh that backs the retry-once
/// behavior of every authenticated request.
///
/// The access token lives only in the [`TokenStore`]; the refresh token is
/// either in the OS keychain (stored mode) or an HTTP-only cookie the client
/// never sees (cookie mode).
pub struct SessionManager<S, C>
where
    S: CredentialStore,
    C: BackendApiClient,
{
    api_client: Arc<C>,
    credential_store: Arc<S>,
    token_store: Arc<TokenStore>,
    refresh_mode: RefreshMode,
    status: Mutex<SessionStatus>,
    refresh_lock: tokio::sync::Mutex<()>,
    initialize_started: AtomicBool,
}

impl<S, C> SessionManager<S, C>
where
    S: CredentialStore,
    C: BackendApiClient,
{
    pub fn new(
        api_client: Arc<C>,
        credential_store: Arc<S>,
        token_store: Arc<TokenStore>,
        refresh_mode: RefreshMode,
    ) -> Self {
        Self {
            api_client,
            credential_store,
            token_store,
            refresh_mode,
            status: Mutex::new(SessionStatus::Loading),
            refresh_lock: tokio::sync::Mutex::new(()),
            initialize_started: AtomicBool::new(false),
        }
    }

    pub fn status(&self) -> SessionStatus {
        *self.lock_status()
    }

    pub fn access_token(&self) -> Option<String> {
        self.token_store.access_token()
    }

    /// Resolve the startup session state exactly once. On a public route no
    /// refresh is attempted; otherwise a silent refresh decides between
    /// authenticated and unauthenticated. Later calls return the state the
    /// first call (or a login since then) produced.
    pub async fn initialize(&self, public_route: bool) -> Result<SessionStatus, InfraError> {
        if self.initialize_started.swap(true, Ordering::SeqCst) {
            return Ok(self.status());
        }

        if public_route {
            self.set_status(SessionStatus::Unauthenticated);
            return Ok(SessionStatus::Unauthenticated);
        }

        // A token already resident (login raced initialization) wins.
        if self.token_store.access_token().is_some() {
            self.set_status(SessionStatus::Authenticated);
            return Ok(SessionStatus::Authenticated);
        }

        let body = match self.refresh_body()? {
            Some(body) => body,
            None => {
                self.set_status(SessionStatus::Unauthenticated);
                return Ok(SessionStatus::Unauthenticated);
            }
        };

        match self.api_client.refresh(&body).await {
            Ok(response) => {
                self.apply_tokens(AuthTokens {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token,
                })?;
                Ok(SessionStatus::Authenticated)
            }
            Err(error) if is_refresh_rejection(&error) => {
                self.expire_session();
                Ok(SessionStatus::Unauthenticated)
            }
            Err(error) => {
                // Transient failure: the session is undecided, not dead.
                self.set_status(SessionStatus::Unauthenticated);
                Err(error)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, InfraError> {
        let response = self
            .api_client
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;

        if let Some(challenge) = response.two_factor.clone() {
            return Ok(LoginOutcome::TwoFactorRequired {
                user_id: challenge.user_id,
            });
        }
        let tokens = response.into_tokens().ok_or_else(|| {
            InfraError::Network("login response carried neither tokens nor a challenge".to_string())
        })?;
        self.apply_tokens(tokens)?;
        Ok(LoginOutcome::Authenticated)
    }

    pub async fn verify_two_factor(&self, user_id: &str, code: &str) -> Result<(), InfraError> {
        let response = self
            .api_client
            .verify_two_factor(&VerifyTwoFactorRequest {
                user_id: user_id.to_string(),
                code: code.trim().to_string(),
            })
            .await?;
        let tokens = response.into_tokens().ok_or_else(|| {
            InfraError::Network("two-factor response missing tokens".to_string())
        })?;
        self.apply_tokens(tokens)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, InfraError> {
        let response = self.api_client.register(&request).await?;
        if response.phone_verification_required {
            let user_id = response.user_id.ok_or_else(|| {
                InfraError::Network("registration challenge missing user id".to_string())
            })?;
            return Ok(RegisterOutcome::PhoneVerificationRequired { user_id });
        }
        let tokens = response.auth.ok_or_else(|| {
            InfraError::Network("registration response missing tokens".to_string())
        })?;
        self.apply_tokens(tokens)?;
        Ok(RegisterOutcome::Authenticated)
    }

    pub async fn verify_phone(&self, user_id: &str, code: &str) -> Result<(), InfraError> {
        let response = self
            .api_client
            .verify_phone(&VerifyPhoneRequest {
                user_id: user_id.to_string(),
                code: code.trim().to_string(),
            })
            .await?;
        let tokens = response.auth.ok_or_else(|| {
            InfraError::Network("phone verification response missing tokens".to_string())
        })?;
        self.apply_tokens(tokens)
    }

    /// Server-side revocation is best effort; local state is always cleared.
    pub async fn logout(&self) -> Result<(), InfraError> {
        let token = self.token_store.access_token();
        let _ = self.api_client.logout(token.as_deref()).await;
        self.token_store.set_access_token(None);
        self.set_status(SessionStatus::Unauthenticated);
        self.credential_store.delete_refresh_token()
    }

    /// Run an authenticated operation with the current token. A 401 triggers
    /// one coordinated refresh and one retry with the new token; a second
    /// 401 ends the session instead of looping.
    pub async fn with_auth_retry<T, F, Fut>(&self, operation: F) -> Result<T, InfraError>
    where
        F: Fn(Option<String>) -> Fut,
        Fut: Future<Output = Result<T, InfraError>>,
    {
        let snapshot = self.token_store.snapshot();
        match operation(snapshot.access_token.clone()).await {
            Err(error) if error.is_unauthorized() => {
                let token = self.refresh_after_unauthorized(snapshot.generation).await?;
                match operation(Some(token)).await {
                    Err(error) if error.is_unauthorized() => {
                        self.expire_session();
                        Err(InfraError::SessionExpired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Single-flight refresh. Callers pass the token generation they saw the
    /// 401 under; whoever wins the lock refreshes, everyone who arrives
    /// later finds the generation advanced and settles on that refresh's
    /// outcome: the fresh token, or session expiry.
    async fn refresh_after_unauthorized(
        &self,
        observed_generation: u64,
    ) -> Result<String, InfraError> {
        let _guard = self.refresh_lock.lock().await;
        let snapshot = self.token_store.snapshot();
        if snapshot.generation != observed_generation {
            return match snapshot.access_token {
                Some(token) => Ok(token),
                // Someone refreshed and the session died anyway.
                None => Err(InfraError::SessionExpired),
            };
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<String, InfraError> {
        let body = match self.refresh_body()? {
            Some(body) => body,
            None => {
                self.expire_session();
                return Err(InfraError::SessionExpired);
            }
        };

        match self.api_client.refresh(&body).await {
            Ok(response) => {
                let access_token = response.access_token.trim().to_string();
                if access_token.is_empty() {
                    self.expire_session();
                    return Err(InfraError::SessionExpired);
                }
                self.apply_tokens(AuthTokens {
                    access_token: access_token.clone(),
                    refresh_token: response.refresh_token,
                })?;
                Ok(access_token)
            }
            // Rejection and network failure alike end the session here.
            // Expiring bumps the generation, so callers queued behind this
            // refresh settle on its outcome instead of refreshing again.
            Err(_) => {
                self.expire_session();
                Err(InfraError::SessionExpired)
            }
        }
    }

    /// Stored mode needs a persisted refresh token; cookie mode always sends
    /// an empty body and lets the cookie jar do the work.
    fn refresh_body(&self) -> Result<Option<RefreshRequest>, InfraError> {
        match self.refresh_mode {
            RefreshMode::Cookie => Ok(Some(RefreshRequest::default())),
            RefreshMode::Stored => {
                let stored = self.credential_store.load_refresh_token()?;
                Ok(stored.map(|token| RefreshRequest { token: Some(token) }))
            }
        }
    }

    fn apply_tokens(&self, tokens: AuthTokens) -> Result<(), InfraError> {
        if self.refresh_mode == RefreshMode::Stored {
            if let Some(refresh_token) = tokens.refresh_token.as_deref() {
                self.credential_store.save_refresh_token(refresh_token)?;
            }
        }
        self.token_store.set_access_token(Some(tokens.access_token));
        self.set_status(SessionStatus::Authenticated);
        Ok(())
    }

    fn expire_session(&self) {
        self.token_store.set_access_token(None);
        self.set_status(SessionStatus::Unauthenticated);
        if self.refresh_mode == RefreshMode::Stored {
            // A dead refresh token is not worth keeping around.
            let _ = self.credential_store.delete_refresh_token();
        }
    }

    fn set_status(&self, status: SessionStatus) {
        *self.lock_status() = status;
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, SessionStatus> {
        match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The refresh endpoint rejecting the credential (any 4xx) means the session
/// is over. Only the startup path distinguishes this from a network failure,
/// which leaves stored credentials in place for the next launch.
fn is_refresh_rejection(error: &InfraError) -> bool {
    matches!(error, InfraError::Api { status, .. } if (400..500).contains(status))
}
