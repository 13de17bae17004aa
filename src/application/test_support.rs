use crate::domain::models::{
    ActionItem, ActionItemPatch, CreateSummaryRequest, GenerateTasksRequest,
    GeneratedTasksResponse, LoginRequest, LoginResponse, NewActionItem, RefreshRequest,
    RefreshResponse, RegisterRequest, RegisterResponse, Summary, VerifyPhoneRequest,
    VerifyTwoFactorRequest,
};
use crate::infrastructure::api_client::BackendApiClient;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted failure for a fake endpoint call. InfraError is not Clone, so
/// queues hold this instead and materialize the error on pop.
#[derive(Debug, Clone)]
pub enum FakeFailure {
    Unauthorized,
    Network,
    Api(u16, &'static str),
}

impl FakeFailure {
    fn into_error(self) -> InfraError {
        match self {
            Self::Unauthorized => InfraError::api(401, ""),
            Self::Network => InfraError::Network("connection reset by fake".to_string()),
            Self::Api(status, message) => InfraError::api(status, message),
        }
    }
}

type Scripted<T> = Mutex<VecDeque<Result<T, FakeFailure>>>;

/// Scripted backend double. Each endpoint pops from its own response queue;
/// an empty queue yields a benign default so tests only script what they
/// assert on. Calls and interesting request bodies are recorded.
#[derive(Default)]
pub struct FakeApiClient {
    pub login_responses: Scripted<LoginResponse>,
    pub login_calls: AtomicUsize,
    pub two_factor_responses: Scripted<LoginResponse>,
    pub register_responses: Scripted<RegisterResponse>,
    pub verify_phone_responses: Scripted<RegisterResponse>,
    pub refresh_responses: Scripted<RefreshResponse>,
    pub refresh_calls: AtomicUsize,
    pub refresh_bodies: Mutex<Vec<RefreshRequest>>,
    pub logout_results: Scripted<()>,
    pub logout_calls: AtomicUsize,
    pub list_responses: Scripted<Vec<ActionItem>>,
    pub list_calls: AtomicUsize,
    pub list_tokens: Mutex<Vec<Option<String>>>,
    pub get_responses: Scripted<ActionItem>,
    pub create_responses: Scripted<ActionItem>,
    pub create_calls: AtomicUsize,
    pub update_results: Scripted<()>,
    pub update_calls: AtomicUsize,
    pub update_patches: Mutex<Vec<ActionItemPatch>>,
    pub toggle_responses: Scripted<ActionItem>,
    pub toggle_calls: AtomicUsize,
    pub delete_results: Scripted<()>,
    pub delete_calls: AtomicUsize,
    pub summary_responses: Scripted<Summary>,
    pub summary_calls: AtomicUsize,
    pub summary_bodies: Mutex<Vec<CreateSummaryRequest>>,
    /// When set, `create_summary` parks until the gate is notified. Lets a
    /// test overlap a second confirm with one still in flight.
    pub summary_gate: Mutex<Option<std::sync::Arc<tokio::sync::Notify>>>,
    pub generate_responses: Scripted<GeneratedTasksResponse>,
    pub generate_calls: AtomicUsize,
    /// When set, `generate_tasks` parks until the gate is notified. Lets a
    /// test cancel a flow while generation is still in flight.
    pub generate_gate: Mutex<Option<std::sync::Arc<tokio::sync::Notify>>>,
    pub upload_responses: Scripted<GeneratedTasksResponse>,
    pub upload_calls: AtomicUsize,
}

impl FakeApiClient {
    pub fn script<T>(queue: &Scripted<T>, responses: Vec<Result<T, FakeFailure>>) {
        let mut guard = queue.lock().expect("fake queue lock poisoned");
        guard.extend(responses);
    }

    fn pop<T>(queue: &Scripted<T>) -> Option<Result<T, InfraError>> {
        let mut guard = queue.lock().expect("fake queue lock poisoned");
        guard
            .pop_front()
            .map(|entry| entry.map_err(FakeFailure::into_error))
    }

    fn pop_or<T>(queue: &Scripted<T>, default: impl FnOnce() -> T) -> Result<T, InfraError> {
        Self::pop(queue).unwrap_or_else(|| Ok(default()))
    }

    pub fn sample_item(id: &str) -> ActionItem {
        ActionItem {
            id: id.to_string(),
            summary_id: None,
            text: format!("task {id}"),
            is_done: false,
            due_at: None,
            is_date_only: false,
        }
    }

    pub fn tokens_response(access_token: &str, refresh_token: Option<&str>) -> LoginResponse {
        LoginResponse {
            access_token: Some(access_token.to_string()),
            refresh_token: refresh_token.map(ToOwned::to_owned),
            two_factor: None,
        }
    }
}

#[async_trait]
impl BackendApiClient for FakeApiClient {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, InfraError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop_or(&self.login_responses, || {
            Self::tokens_response("at-login", Some("rt-login"))
        })
    }

    async fn verify_two_factor(
        &self,
        _request: &VerifyTwoFactorRequest,
    ) -> Result<LoginResponse, InfraError> {
        Self::pop_or(&self.two_factor_responses, || {
            Self::tokens_response("at-2fa", Some("rt-2fa"))
        })
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<RegisterResponse, InfraError> {
        Self::pop_or(&self.register_responses, || RegisterResponse {
            auth: None,
            phone_verification_required: true,
            user_id: Some("u-new".to_string()),
        })
    }

    async fn verify_phone(
        &self,
        _request: &VerifyPhoneRequest,
    ) -> Result<RegisterResponse, InfraError> {
        Self::pop_or(&self.verify_phone_responses, || RegisterResponse {
            auth: Some(crate::domain::models::AuthTokens {
                access_token: "at-verified".to_string(),
                refresh_token: Some("rt-verified".to_string()),
            }),
            phone_verification_required: false,
            user_id: None,
        })
    }

    async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse, InfraError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_bodies
            .lock()
            .expect("fake queue lock poisoned")
            .push(request.clone());
        Self::pop_or(&self.refresh_responses, || RefreshResponse {
            access_token: "at-refreshed".to_string(),
            refresh_token: None,
        })
    }

    async fn logout(&self, _access_token: Option<&str>) -> Result<(), InfraError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop_or(&self.logout_results, || ())
    }

    async fn list_action_items(
        &self,
        access_token: Option<&str>,
    ) -> Result<Vec<ActionItem>, InfraError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_tokens
            .lock()
            .expect("fake queue lock poisoned")
            .push(access_token.map(ToOwned::to_owned));
        Self::pop_or(&self.list_responses, Vec::new)
    }

    async fn get_action_item(
        &self,
        _access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError> {
        let id = id.to_string();
        Self::pop_or(&self.get_responses, move || Self::sample_item(&id))
    }

    async fn create_action_item(
        &self,
        _access_token: Option<&str>,
        request: &NewActionItem,
    ) -> Result<ActionItem, InfraError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let text = request.text.clone();
        let due_at = request.due_at;
        Self::pop_or(&self.create_responses, move || ActionItem {
            id: "ai-created".to_string(),
            summary_id: None,
            text,
            is_done: false,
            due_at,
            is_date_only: false,
        })
    }

    async fn update_action_item(
        &self,
        _access_token: Option<&str>,
        _id: &str,
        patch: &ActionItemPatch,
    ) -> Result<(), InfraError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.update_patches
            .lock()
            .expect("fake queue lock poisoned")
            .push(patch.clone());
        Self::pop_or(&self.update_results, || ())
    }

    async fn toggle_action_item(
        &self,
        _access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        let id = id.to_string();
        Self::pop_or(&self.toggle_responses, move || {
            let mut item = Self::sample_item(&id);
            item.is_done = true;
            item
        })
    }

    async fn delete_action_item(
        &self,
        _access_token: Option<&str>,
        _id: &str,
    ) -> Result<(), InfraError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop_or(&self.delete_results, || ())
    }

    async fn create_summary(
        &self,
        _access_token: Option<&str>,
        request: &CreateSummaryRequest,
    ) -> Result<Summary, InfraError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.summary_bodies
            .lock()
            .expect("fake queue lock poisoned")
            .push(request.clone());
        let gate = self
            .summary_gate
            .lock()
            .expect("fake queue lock poisoned")
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let original_text = request.original_text.clone();
        let summary_text = request.summary_text.clone();
        Self::pop_or(&self.summary_responses, move || Summary {
            id: "sum-1".to_string(),
            original_text,
            summary_text,
            created_at: chrono::DateTime::parse_from_rfc3339("2026-08-23T00:00:00Z")
                .expect("valid datetime")
                .with_timezone(&chrono::Utc),
            action_items: Vec::new(),
        })
    }

    async fn generate_tasks(
        &self,
        _access_token: Option<&str>,
        _request: &GenerateTasksRequest,
    ) -> Result<GeneratedTasksResponse, InfraError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .generate_gate
            .lock()
            .expect("fake queue lock poisoned")
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::pop_or(&self.generate_responses, || GeneratedTasksResponse {
            summary: "generated summary".to_string(),
            action_items: Vec::new(),
        })
    }

    async fn upload_document(
        &self,
        _access_token: Option<&str>,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<GeneratedTasksResponse, InfraError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop_or(&self.upload_responses, || GeneratedTasksResponse {
            summary: "uploaded summary".to_string(),
            action_items: Vec::new(),
        })
    }
}
