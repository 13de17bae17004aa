use crate::application::action_items::ActionItemService;
use crate::application::ai_tasks::{AiFlowState, AiTaskService};
use crate::application::bootstrap::bootstrap_workspace;
use crate::application::session::{LoginOutcome, RegisterOutcome, SessionManager, SessionStatus};
use crate::domain::models::{ActionItem, ActionItemPatch, NewActionItem, RegisterRequest, Summary};
use crate::infrastructure::action_item_cache::{
    InMemoryActionItemCache, NowProvider, system_now_provider,
};
use crate::infrastructure::api_client::{BackendApiClient, ReqwestBackendClient};
use crate::infrastructure::client_state::{
    ClientStateRepository, SqliteClientStateRepository, privacy_notice_due,
};
use crate::infrastructure::config::{RefreshMode, load_client_config};
use crate::infrastructure::credential_store::{CredentialStore, KeyringCredentialStore};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::open_database;
use crate::infrastructure::token_store::TokenStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Concrete state managed by tauri. The generic form exists so command
/// bodies can be driven by fakes in tests.
pub type ProdAppState = AppState<KeyringCredentialStore, ReqwestBackendClient>;

pub struct AppState<S, C>
where
    S: CredentialStore + 'static,
    C: BackendApiClient + 'static,
{
    logs_dir: PathBuf,
    session: Arc<SessionManager<S, C>>,
    action_items: ActionItemService<S, C, InMemoryActionItemCache>,
    ai_flow: AiTaskService<S, C, InMemoryActionItemCache>,
    client_state: Arc<dyn ClientStateRepository>,
    now_provider: NowProvider,
    log_guard: Mutex<()>,
}

impl AppState<KeyringCredentialStore, ReqwestBackendClient> {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config = load_client_config(&bootstrap.config_dir)?;

        let api_client = Arc::new(ReqwestBackendClient::new(
            &config.api_base_url,
            config.request_timeout,
        )?);
        let credential_store = Arc::new(KeyringCredentialStore::default());
        let client_state: Arc<dyn ClientStateRepository> = Arc::new(
            SqliteClientStateRepository::new(open_database(&bootstrap.database_path)?),
        );

        Ok(Self::with_components(
            &workspace_root,
            api_client,
            credential_store,
            client_state,
            config.refresh_mode,
            config.list_stale_minutes,
            system_now_provider(),
        ))
    }
}

impl<S, C> AppState<S, C>
where
    S: CredentialStore + 'static,
    C: BackendApiClient + 'static,
{
    pub fn with_components(
        workspace_root: &Path,
        api_client: Arc<C>,
        credential_store: Arc<S>,
        client_state: Arc<dyn ClientStateRepository>,
        refresh_mode: RefreshMode,
        list_stale_minutes: i64,
        now_provider: NowProvider,
    ) -> Self {
        let token_store = Arc::new(TokenStore::default());
        let session = Arc::new(SessionManager::new(
            Arc::clone(&api_client),
            credential_store,
            token_store,
            refresh_mode,
        ));
        let cache = Arc::new(InMemoryActionItemCache::new(Arc::clone(&now_provider)));
        let action_items = ActionItemService::new(
            Arc::clone(&session),
            Arc::clone(&api_client),
            Arc::clone(&cache),
            Duration::minutes(list_stale_minutes),
        );
        let ai_flow = AiTaskService::new(Arc::clone(&session), api_client, cache);

        Self {
            logs_dir: workspace_root.join("logs"),
            session,
            action_items,
            ai_flow,
            client_state,
            now_provider,
            log_guard: Mutex::new(()),
        }
    }

    /// Logs the full error and hands the webview the sanitized message.
    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.user_message()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginCommandResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCommandResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrivacyNoticeResponse {
    pub due: bool,
}

pub async fn initialize_session_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    public_route: bool,
) -> Result<SessionStatusResponse, InfraError> {
    let status = state.session.initialize(public_route).await?;
    state.log_info(
        "initialize_session",
        &format!("resolved startup session public_route={public_route}"),
    );
    Ok(SessionStatusResponse { status })
}

pub fn get_session_status_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> SessionStatusResponse {
    SessionStatusResponse {
        status: state.session.status(),
    }
}

pub async fn login_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    email: String,
    password: String,
) -> Result<LoginCommandResponse, InfraError> {
    let email = email.trim().to_string();
    if email.is_empty() || password.is_empty() {
        return Err(InfraError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    match state.session.login(&email, &password).await? {
        LoginOutcome::Authenticated => {
            state.log_info("login", "session established");
            Ok(LoginCommandResponse {
                status: "authenticated".to_string(),
                user_id: None,
            })
        }
        LoginOutcome::TwoFactorRequired { user_id } => {
            state.log_info("login", "second factor required");
            Ok(LoginCommandResponse {
                status: "two_factor_required".to_string(),
                user_id: Some(user_id),
            })
        }
    }
}

pub async fn verify_two_factor_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    user_id: String,
    code: String,
) -> Result<SessionStatusResponse, InfraError> {
    if user_id.trim().is_empty() || code.trim().is_empty() {
        return Err(InfraError::Validation(
            "Verification code is required".to_string(),
        ));
    }
    state.session.verify_two_factor(&user_id, &code).await?;
    state.log_info("verify_two_factor", "session established");
    Ok(get_session_status_impl(state))
}

pub async fn register_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    email: String,
    display_name: String,
    password: String,
    phone_number: String,
) -> Result<RegisterCommandResponse, InfraError> {
    let request = RegisterRequest {
        email: email.trim().to_string(),
        display_name: display_name.trim().to_string(),
        password,
        phone_number: phone_number.trim().to_string(),
    };
    if request.email.is_empty()
        || request.display_name.is_empty()
        || request.password.is_empty()
        || request.phone_number.is_empty()
    {
        return Err(InfraError::Validation(
            "All signup fields are required".to_string(),
        ));
    }

    match state.session.register(request).await? {
        RegisterOutcome::Authenticated => {
            state.log_info("register", "account created and session established");
            Ok(RegisterCommandResponse {
                status: "authenticated".to_string(),
                user_id: None,
            })
        }
        RegisterOutcome::PhoneVerificationRequired { user_id } => {
            state.log_info("register", "account created; phone verification pending");
            Ok(RegisterCommandResponse {
                status: "phone_verification_required".to_string(),
                user_id: Some(user_id),
            })
        }
    }
}

pub async fn verify_phone_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    user_id: String,
    code: String,
) -> Result<SessionStatusResponse, InfraError> {
    if user_id.trim().is_empty() || code.trim().is_empty() {
        return Err(InfraError::Validation(
            "Verification code is required".to_string(),
        ));
    }
    state.session.verify_phone(&user_id, &code).await?;
    state.log_info("verify_phone", "phone verified and session established");
    Ok(get_session_status_impl(state))
}

pub async fn logout_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> Result<SessionStatusResponse, InfraError> {
    state.session.logout().await?;
    state.action_items.invalidate_all();
    state.ai_flow.cancel();
    state.log_info("logout", "session cleared");
    Ok(get_session_status_impl(state))
}

pub async fn list_action_items_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    force_refresh: Option<bool>,
) -> Result<Vec<ActionItem>, InfraError> {
    state
        .action_items
        .list(force_refresh.unwrap_or(false))
        .await
}

pub async fn get_action_item_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    id: String,
) -> Result<ActionItem, InfraError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(InfraError::Validation("Task id is required".to_string()));
    }
    state.action_items.get(id, false).await
}

pub async fn create_action_item_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    text: String,
    due_at: Option<String>,
) -> Result<ActionItem, InfraError> {
    let due_at = due_at
        .as_deref()
        .map(|raw| parse_rfc3339_input(raw, "due_at"))
        .transpose()?;
    let created = state
        .action_items
        .create(NewActionItem { text, due_at })
        .await?;
    state.log_info("create_action_item", &format!("created id={}", created.id));
    Ok(created)
}

pub async fn update_action_item_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    id: String,
    text: Option<String>,
    due_at: Option<String>,
    clear_due_at: Option<bool>,
    is_date_only: Option<bool>,
    is_done: Option<bool>,
) -> Result<(), InfraError> {
    let id = id.trim().to_string();
    if id.is_empty() {
        return Err(InfraError::Validation("Task id is required".to_string()));
    }

    let due_at = if clear_due_at.unwrap_or(false) {
        Some(None)
    } else {
        due_at
            .as_deref()
            .map(|raw| parse_rfc3339_input(raw, "due_at").map(Some))
            .transpose()?
    };
    let patch = ActionItemPatch {
        text,
        due_at,
        is_date_only,
        is_done,
    };

    state.action_items.update(&id, patch).await?;
    state.log_info("update_action_item", &format!("updated id={id}"));
    Ok(())
}

pub async fn toggle_action_item_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    id: String,
) -> Result<ActionItem, InfraError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(InfraError::Validation("Task id is required".to_string()));
    }
    let updated = state.action_items.toggle_done(id).await?;
    state.log_info(
        "toggle_action_item",
        &format!("toggled id={id} is_done={}", updated.is_done),
    );
    Ok(updated)
}

pub async fn delete_action_item_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    id: String,
) -> Result<(), InfraError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(InfraError::Validation("Task id is required".to_string()));
    }
    state.action_items.delete(id).await?;
    state.log_info("delete_action_item", &format!("deleted id={id}"));
    Ok(())
}

pub async fn generate_tasks_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    input: String,
) -> Result<AiFlowState, InfraError> {
    let flow = state.ai_flow.generate_from_text(&input).await?;
    state.log_info("generate_tasks", "generation finished");
    Ok(flow)
}

pub async fn upload_document_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<AiFlowState, InfraError> {
    let flow = state.ai_flow.generate_from_file(&file_name, bytes).await?;
    state.log_info(
        "upload_document",
        &format!("generation from upload finished file={file_name}"),
    );
    Ok(flow)
}

pub fn get_ai_flow_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> AiFlowState {
    state.ai_flow.state()
}

pub fn edit_generated_task_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    index: usize,
    text: String,
) -> Result<AiFlowState, InfraError> {
    state.ai_flow.edit_task(index, &text)?;
    Ok(state.ai_flow.state())
}

pub fn set_generated_task_due_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    index: usize,
    due_at: Option<String>,
    is_date_only: Option<bool>,
) -> Result<AiFlowState, InfraError> {
    let due_at = due_at
        .as_deref()
        .map(|raw| parse_rfc3339_input(raw, "due_at"))
        .transpose()?;
    state
        .ai_flow
        .set_task_due(index, due_at, is_date_only.unwrap_or(false))?;
    Ok(state.ai_flow.state())
}

pub fn remove_generated_task_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
    index: usize,
) -> Result<AiFlowState, InfraError> {
    state.ai_flow.remove_task(index)?;
    Ok(state.ai_flow.state())
}

pub async fn confirm_generated_tasks_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> Result<Summary, InfraError> {
    let summary = state.ai_flow.confirm().await?;
    state.log_info(
        "confirm_generated_tasks",
        &format!(
            "saved summary id={} with {} items",
            summary.id,
            summary.action_items.len()
        ),
    );
    Ok(summary)
}

pub fn cancel_generation_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> AiFlowState {
    state.ai_flow.cancel();
    state.log_info("cancel_generation", "flow abandoned");
    state.ai_flow.state()
}

pub fn privacy_notice_due_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> Result<PrivacyNoticeResponse, InfraError> {
    let today = (state.now_provider)().date_naive();
    let last_shown = state.client_state.last_privacy_notice_date()?;
    Ok(PrivacyNoticeResponse {
        due: privacy_notice_due(last_shown, today),
    })
}

pub fn acknowledge_privacy_notice_impl<S: CredentialStore, C: BackendApiClient>(
    state: &AppState<S, C>,
) -> Result<(), InfraError> {
    let today = (state.now_provider)().date_naive();
    state.client_state.record_privacy_notice_shown(today)?;
    state.log_info("acknowledge_privacy_notice", "notice recorded for today");
    Ok(())
}

fn parse_rfc3339_input(value: &str, field_name: &str) -> Result<DateTime<Utc>, InfraError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            InfraError::Validation(format!("{field_name} must be RFC3339 date-time: {error}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeApiClient, FakeFailure};
    use crate::infrastructure::client_state::InMemoryClientStateRepository;
    use crate::infrastructure::credential_store::InMemoryCredentialStore;
    use chrono::TimeZone;
    use std::fs;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "taskbrief-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(path.join("logs")).expect("create temp workspace");
            Self { path }
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    struct Harness {
        _workspace: TempWorkspace,
        state: AppState<InMemoryCredentialStore, FakeApiClient>,
        api_client: Arc<FakeApiClient>,
        clock: Arc<AtomicI64>,
    }

    fn harness() -> Harness {
        let workspace = TempWorkspace::new();
        let api_client = Arc::new(FakeApiClient::default());
        let clock = Arc::new(AtomicI64::new(1_700_000_000));
        let now: NowProvider = {
            let clock = Arc::clone(&clock);
            Arc::new(move || Utc.timestamp_opt(clock.load(Ordering::SeqCst), 0).unwrap())
        };
        let state = AppState::with_components(
            &workspace.path,
            Arc::clone(&api_client),
            Arc::new(InMemoryCredentialStore::default()),
            Arc::new(InMemoryClientStateRepository::default()),
            RefreshMode::Stored,
            5,
            now,
        );
        Harness {
            _workspace: workspace,
            state,
            api_client,
            clock,
        }
    }

    #[tokio::test]
    async fn initialize_on_public_route_is_unauthenticated() {
        let harness = harness();
        let response = initialize_session_impl(&harness.state, true)
            .await
            .expect("initialize");
        assert_eq!(response.status, SessionStatus::Unauthenticated);
        assert_eq!(harness.api_client.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_then_list_flow() {
        let harness = harness();
        let response = login_impl(
            &harness.state,
            "a@b.example".to_string(),
            "hunter2".to_string(),
        )
        .await
        .expect("login");
        assert_eq!(response.status, "authenticated");

        FakeApiClient::script(
            &harness.api_client.list_responses,
            vec![Ok(vec![FakeApiClient::sample_item("a")])],
        );
        let items = list_action_items_impl(&harness.state, None)
            .await
            .expect("list");
        assert_eq!(items.len(), 1);

        let tokens = harness.api_client.list_tokens.lock().expect("tokens");
        assert_eq!(tokens[0].as_deref(), Some("at-login"));
    }

    #[tokio::test]
    async fn fresh_account_create_and_toggle_scenario() {
        let harness = harness();
        login_impl(
            &harness.state,
            "a@b.com".to_string(),
            "hunter2".to_string(),
        )
        .await
        .expect("login");

        // New account starts empty.
        let items = list_action_items_impl(&harness.state, None)
            .await
            .expect("empty list");
        assert!(items.is_empty());

        let created = create_action_item_impl(&harness.state, "Buy milk".to_string(), None)
            .await
            .expect("create");
        assert!(!created.is_done);
        assert_eq!(created.due_at, None);

        FakeApiClient::script(
            &harness.api_client.list_responses,
            vec![Ok(vec![created.clone()])],
        );
        let items = list_action_items_impl(&harness.state, None)
            .await
            .expect("list after create");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Buy milk");

        let toggled = toggle_action_item_impl(&harness.state, created.id.clone())
            .await
            .expect("toggle");
        assert!(toggled.is_done);

        let mut done = created;
        done.is_done = true;
        FakeApiClient::script(&harness.api_client.list_responses, vec![Ok(vec![done])]);
        let items = list_action_items_impl(&harness.state, None)
            .await
            .expect("list after toggle");
        assert!(items[0].is_done);
    }

    #[tokio::test]
    async fn login_escalates_to_two_factor_and_completes() {
        let harness = harness();
        FakeApiClient::script(
            &harness.api_client.login_responses,
            vec![Ok(crate::domain::models::LoginResponse {
                access_token: None,
                refresh_token: None,
                two_factor: Some(crate::domain::models::TwoFactorChallenge {
                    user_id: "u-7".to_string(),
                }),
            })],
        );

        let response = login_impl(
            &harness.state,
            "a@b.example".to_string(),
            "hunter2".to_string(),
        )
        .await
        .expect("login");
        assert_eq!(response.status, "two_factor_required");
        assert_eq!(response.user_id.as_deref(), Some("u-7"));

        let verified = verify_two_factor_impl(&harness.state, "u-7".to_string(), "123456".to_string())
            .await
            .expect("verify");
        assert_eq!(verified.status, SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn signup_flow_with_phone_verification() {
        let harness = harness();
        let response = register_impl(
            &harness.state,
            "new@b.example".to_string(),
            "New User".to_string(),
            "hunter2".to_string(),
            "+15550100".to_string(),
        )
        .await
        .expect("register");
        assert_eq!(response.status, "phone_verification_required");

        let verified = verify_phone_impl(
            &harness.state,
            response.user_id.expect("user id"),
            "000000".to_string(),
        )
        .await
        .expect("verify phone");
        assert_eq!(verified.status, SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn logout_clears_caches_and_flow() {
        let harness = harness();
        login_impl(
            &harness.state,
            "a@b.example".to_string(),
            "hunter2".to_string(),
        )
        .await
        .expect("login");
        list_action_items_impl(&harness.state, None)
            .await
            .expect("prime cache");

        let response = logout_impl(&harness.state).await.expect("logout");
        assert_eq!(response.status, SessionStatus::Unauthenticated);
        assert_eq!(get_ai_flow_impl(&harness.state), AiFlowState::Idle);

        // Cache was dropped with the session.
        list_action_items_impl(&harness.state, None)
            .await
            .expect("list after logout");
        assert_eq!(harness.api_client.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn update_builds_an_explicit_null_patch() {
        let harness = harness();
        update_action_item_impl(
            &harness.state,
            "ai-1".to_string(),
            Some("Renamed".to_string()),
            None,
            Some(true),
            None,
            None,
        )
        .await
        .expect("update");

        let patches = harness.api_client.update_patches.lock().expect("patches");
        assert_eq!(patches[0].text.as_deref(), Some("Renamed"));
        assert_eq!(patches[0].due_at, Some(None));
    }

    #[tokio::test]
    async fn create_rejects_invalid_due_date() {
        let harness = harness();
        let result = create_action_item_impl(
            &harness.state,
            "Call Sam".to_string(),
            Some("tomorrow".to_string()),
        )
        .await;
        assert!(matches!(result, Err(InfraError::Validation(_))));
        assert_eq!(harness.api_client.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ai_flow_runs_end_to_end() {
        let harness = harness();
        let flow = generate_tasks_impl(&harness.state, "meeting notes".to_string())
            .await
            .expect("generate");
        assert!(matches!(flow, AiFlowState::Reviewing { .. }));

        // Default fake response has no tasks, so confirm must refuse.
        let result = confirm_generated_tasks_impl(&harness.state).await;
        assert!(matches!(result, Err(InfraError::Validation(_))));
        assert_eq!(harness.api_client.summary_calls.load(Ordering::SeqCst), 0);

        let flow = cancel_generation_impl(&harness.state);
        assert_eq!(flow, AiFlowState::Idle);
    }

    #[test]
    fn privacy_notice_is_due_once_per_day() {
        let harness = harness();
        assert!(privacy_notice_due_impl(&harness.state).expect("due").due);

        acknowledge_privacy_notice_impl(&harness.state).expect("acknowledge");
        assert!(!privacy_notice_due_impl(&harness.state).expect("due").due);

        harness
            .clock
            .fetch_add(24 * 60 * 60, Ordering::SeqCst);
        assert!(privacy_notice_due_impl(&harness.state).expect("due").due);
    }

    #[tokio::test]
    async fn command_error_surfaces_only_safe_messages() {
        let harness = harness();
        FakeApiClient::script(
            &harness.api_client.create_responses,
            vec![Err(FakeFailure::Api(422, "due date must be in the future"))],
        );
        let error = create_action_item_impl(&harness.state, "Call Sam".to_string(), None)
            .await
            .expect_err("scripted failure");
        assert_eq!(
            harness.state.command_error("create_action_item", &error),
            "due date must be in the future"
        );

        let network = InfraError::Network("connection reset".to_string());
        assert_eq!(
            harness.state.command_error("create_action_item", &network),
            "Something went wrong. Please try again."
        );
    }
}
