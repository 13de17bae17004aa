use crate::domain::models::{
    ActionItem, ActionItemPatch, CreateSummaryRequest, GenerateTasksRequest,
    GeneratedTasksResponse, LoginRequest, LoginResponse, NewActionItem, RefreshRequest,
    RefreshResponse, RegisterRequest, RegisterResponse, Summary, VerifyPhoneRequest,
    VerifyTwoFactorRequest,
};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Typed client for the TaskBrief backend. One method per REST endpoint;
/// every method takes the bearer token explicitly so that the session layer
/// above owns all token handling. An absent token sends the request
/// unauthenticated and lets the server decide.
#[async_trait]
pub trait BackendApiClient: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, InfraError>;

    async fn verify_two_factor(
        &self,
        request: &VerifyTwoFactorRequest,
    ) -> Result<LoginResponse, InfraError>;

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, InfraError>;

    async fn verify_phone(
        &self,
        request: &VerifyPhoneRequest,
    ) -> Result<RegisterResponse, InfraError>;

    async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse, InfraError>;

    async fn logout(&self, access_token: Option<&str>) -> Result<(), InfraError>;

    async fn list_action_items(
        &self,
        access_token: Option<&str>,
    ) -> Result<Vec<ActionItem>, InfraError>;

    async fn get_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError>;

    async fn create_action_item(
        &self,
        access_token: Option<&str>,
        request: &NewActionItem,
    ) -> Result<ActionItem, InfraError>;

    async fn update_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
        patch: &ActionItemPatch,
    ) -> Result<(), InfraError>;

    async fn toggle_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError>;

    async fn delete_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<(), InfraError>;

    async fn create_summary(
        &self,
        access_token: Option<&str>,
        request: &CreateSummaryRequest,
    ) -> Result<Summary, InfraError>;

    async fn generate_tasks(
        &self,
        access_token: Option<&str>,
        request: &GenerateTasksRequest,
    ) -> Result<GeneratedTasksResponse, InfraError>;

    async fn upload_document(
        &self,
        access_token: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<GeneratedTasksResponse, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackendClient {
    client: Client,
    base_url: Url,
}

impl ReqwestBackendClient {
    /// The cookie store carries the HTTP-only refresh cookie in cookie
    /// refresh mode; it is harmless in stored mode.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|error| InfraError::InvalidConfig(format!("invalid api base url: {error}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|error| {
                InfraError::InvalidConfig(format!("failed to build http client: {error}"))
            })?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| InfraError::InvalidConfig("api base URL cannot be a base".to_string()))?;
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    fn authorize(request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        match access_token {
            Some(token) if !token.trim().is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn read_body(
        response: reqwest::Response,
        context: &str,
    ) -> Result<(StatusCode, String), InfraError> {
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Network(format!("failed reading {context} response: {error}"))
        })?;
        Ok((status, body))
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, InfraError> {
        let (status, body) = Self::read_body(response, context).await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|error| {
            InfraError::Network(format!("invalid {context} payload: {error}; body={body}"))
        })
    }

    async fn expect_success(response: reqwest::Response, context: &str) -> Result<(), InfraError> {
        let (status, body) = Self::read_body(response, context).await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(())
    }

    fn send_error(context: &str) -> impl Fn(reqwest::Error) -> InfraError + '_ {
        move |error| InfraError::Network(format!("network error during {context}: {error}"))
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::InvalidConfig(format!("{field} must not be empty")));
        }
        Ok(())
    }
}

/// 4xx plain-text bodies are kept verbatim for the user-facing message; HTML
/// and JSON bodies are dropped so they never reach the webview.
fn api_error(status: StatusCode, body: &str) -> InfraError {
    let trimmed = body.trim();
    let is_plain_text = !trimmed.is_empty()
        && !trimmed.starts_with('<')
        && serde_json::from_str::<serde_json::Value>(trimmed).is_err();
    let message = if is_plain_text {
        trimmed.to_string()
    } else {
        String::new()
    };
    InfraError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl BackendApiClient for ReqwestBackendClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, InfraError> {
        let response = self
            .client
            .post(self.endpoint(&["auth", "login"])?)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("login"))?;
        Self::parse_json(response, "login").await
    }

    async fn verify_two_factor(
        &self,
        request: &VerifyTwoFactorRequest,
    ) -> Result<LoginResponse, InfraError> {
        let response = self
            .client
            .post(self.endpoint(&["auth", "verify-2fa"])?)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("two-factor verification"))?;
        Self::parse_json(response, "two-factor verification").await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, InfraError> {
        let response = self
            .client
            .post(self.endpoint(&["auth", "register"])?)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("registration"))?;
        Self::parse_json(response, "registration").await
    }

    async fn verify_phone(
        &self,
        request: &VerifyPhoneRequest,
    ) -> Result<RegisterResponse, InfraError> {
        let response = self
            .client
            .post(self.endpoint(&["auth", "verify-phone"])?)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("phone verification"))?;
        Self::parse_json(response, "phone verification").await
    }

    async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse, InfraError> {
        let response = self
            .client
            .post(self.endpoint(&["auth", "refresh"])?)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("token refresh"))?;
        Self::parse_json(response, "token refresh").await
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), InfraError> {
        let request = self.client.post(self.endpoint(&["auth", "logout"])?);
        let response = Self::authorize(request, access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(Self::send_error("logout"))?;
        Self::expect_success(response, "logout").await
    }

    async fn list_action_items(
        &self,
        access_token: Option<&str>,
    ) -> Result<Vec<ActionItem>, InfraError> {
        let request = self.client.get(self.endpoint(&["actionitems"])?);
        let response = Self::authorize(request, access_token)
            .send()
            .await
            .map_err(Self::send_error("action item list"))?;
        Self::parse_json(response, "action item list").await
    }

    async fn get_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError> {
        Self::ensure_non_empty(id, "action item id")?;
        let request = self.client.get(self.endpoint(&["actionitems", id])?);
        let response = Self::authorize(request, access_token)
            .send()
            .await
            .map_err(Self::send_error("action item fetch"))?;
        Self::parse_json(response, "action item fetch").await
    }

    async fn create_action_item(
        &self,
        access_token: Option<&str>,
        new_item: &NewActionItem,
    ) -> Result<ActionItem, InfraError> {
        Self::ensure_non_empty(&new_item.text, "action item text")?;
        let request = self.client.post(self.endpoint(&["actionitems"])?);
        let response = Self::authorize(request, access_token)
            .json(new_item)
            .send()
            .await
            .map_err(Self::send_error("action item create"))?;
        Self::parse_json(response, "action item create").await
    }

    async fn update_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
        patch: &ActionItemPatch,
    ) -> Result<(), InfraError> {
        Self::ensure_non_empty(id, "action item id")?;
        let request = self.client.put(self.endpoint(&["actionitems", id])?);
        let response = Self::authorize(request, access_token)
            .json(patch)
            .send()
            .await
            .map_err(Self::send_error("action item update"))?;
        Self::expect_success(response, "action item update").await
    }

    async fn toggle_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<ActionItem, InfraError> {
        Self::ensure_non_empty(id, "action item id")?;
        let request = self
            .client
            .patch(self.endpoint(&["actionitems", id, "toggle"])?);
        let response = Self::authorize(request, access_token)
            .send()
            .await
            .map_err(Self::send_error("action item toggle"))?;
        Self::parse_json(response, "action item toggle").await
    }

    async fn delete_action_item(
        &self,
        access_token: Option<&str>,
        id: &str,
    ) -> Result<(), InfraError> {
        Self::ensure_non_empty(id, "action item id")?;
        let request = self.client.delete(self.endpoint(&["actionitems", id])?);
        let response = Self::authorize(request, access_token)
            .send()
            .await
            .map_err(Self::send_error("action item delete"))?;
        Self::expect_success(response, "action item delete").await
    }

    async fn create_summary(
        &self,
        access_token: Option<&str>,
        request: &CreateSummaryRequest,
    ) -> Result<Summary, InfraError> {
        let builder = self.client.post(self.endpoint(&["summaries"])?);
        let response = Self::authorize(builder, access_token)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("summary create"))?;
        Self::parse_json(response, "summary create").await
    }

    async fn generate_tasks(
        &self,
        access_token: Option<&str>,
        request: &GenerateTasksRequest,
    ) -> Result<GeneratedTasksResponse, InfraError> {
        let builder = self.client.post(self.endpoint(&[
            "ai",
            "generate-chunked-summary-with-action-items",
        ])?);
        let response = Self::authorize(builder, access_token)
            .json(request)
            .send()
            .await
            .map_err(Self::send_error("task generation"))?;
        Self::parse_json(response, "task generation").await
    }

    async fn upload_document(
        &self,
        access_token: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<GeneratedTasksResponse, InfraError> {
        Self::ensure_non_empty(file_name, "file name")?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let builder = self.client.post(self.endpoint(&["uploads"])?);
        let response = Self::authorize(builder, access_token)
            .multipart(form)
            .send()
            .await
            .map_err(Self::send_error("document upload"))?;
        Self::parse_json(response, "document upload").await
    }
}
