mod application;
mod domain;
mod infrastructure;

use application::ai_tasks::AiFlowState;
use application::bootstrap::bootstrap_workspace;
use application::commands::{
    LoginCommandResponse, PrivacyNoticeResponse, ProdAppState, RegisterCommandResponse,
    SessionStatusResponse, acknowledge_privacy_notice_impl, cancel_generation_impl,
    confirm_generated_tasks_impl, create_action_item_impl, delete_action_item_impl,
    edit_generated_task_impl, generate_tasks_impl, get_action_item_impl, get_ai_flow_impl,
    get_session_status_impl, initialize_session_impl, list_action_items_impl, login_impl,
    logout_impl, privacy_notice_due_impl, register_impl, remove_generated_task_impl,
    set_generated_task_due_impl, toggle_action_item_impl, update_action_item_impl,
    upload_document_impl, verify_phone_impl, verify_two_factor_impl,
};
use domain::models::{ActionItem, Summary};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    database_path: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
async fn initialize_session(
    state: tauri::State<'_, ProdAppState>,
    public_route: Option<bool>,
) -> Result<SessionStatusResponse, String> {
    initialize_session_impl(state.inner(), public_route.unwrap_or(false))
        .await
        .map_err(|error| state.command_error("initialize_session", &error))
}

#[tauri::command]
fn get_session_status(state: tauri::State<'_, ProdAppState>) -> SessionStatusResponse {
    get_session_status_impl(state.inner())
}

#[tauri::command]
async fn login(
    state: tauri::State<'_, ProdAppState>,
    email: String,
    password: String,
) -> Result<LoginCommandResponse, String> {
    login_impl(state.inner(), email, password)
        .await
        .map_err(|error| state.command_error("login", &error))
}

#[tauri::command]
async fn verify_two_factor(
    state: tauri::State<'_, ProdAppState>,
    user_id: String,
    code: String,
) -> Result<SessionStatusResponse, String> {
    verify_two_factor_impl(state.inner(), user_id, code)
        .await
        .map_err(|error| state.command_error("verify_two_factor", &error))
}

#[tauri::command]
async fn register(
    state: tauri::State<'_, ProdAppState>,
    email: String,
    display_name: String,
    password: String,
    phone_number: String,
) -> Result<RegisterCommandResponse, String> {
    register_impl(state.inner(), email, display_name, password, phone_number)
        .await
        .map_err(|error| state.command_error("register", &error))
}

#[tauri::command]
async fn verify_phone(
    state: tauri::State<'_, ProdAppState>,
    user_id: String,
    code: String,
) -> Result<SessionStatusResponse, String> {
    verify_phone_impl(state.inner(), user_id, code)
        .await
        .map_err(|error| state.command_error("verify_phone", &error))
}

#[tauri::command]
async fn logout(state: tauri::State<'_, ProdAppState>) -> Result<SessionStatusResponse, String> {
    logout_impl(state.inner())
        .await
        .map_err(|error| state.command_error("logout", &error))
}

#[tauri::command]
async fn list_action_items(
    state: tauri::State<'_, ProdAppState>,
    force_refresh: Option<bool>,
) -> Result<Vec<ActionItem>, String> {
    list_action_items_impl(state.inner(), force_refresh)
        .await
        .map_err(|error| state.command_error("list_action_items", &error))
}

#[tauri::command]
async fn get_action_item(
    state: tauri::State<'_, ProdAppState>,
    id: String,
) -> Result<ActionItem, String> {
    get_action_item_impl(state.inner(), id)
        .await
        .map_err(|error| state.command_error("get_action_item", &error))
}

#[tauri::command]
async fn create_action_item(
    state: tauri::State<'_, ProdAppState>,
    text: String,
    due_at: Option<String>,
) -> Result<ActionItem, String> {
    create_action_item_impl(state.inner(), text, due_at)
        .await
        .map_err(|error| state.command_error("create_action_item", &error))
}

#[tauri::command]
async fn update_action_item(
    state: tauri::State<'_, ProdAppState>,
    id: String,
    text: Option<String>,
    due_at: Option<String>,
    clear_due_at: Option<bool>,
    is_date_only: Option<bool>,
    is_done: Option<bool>,
) -> Result<(), String> {
    update_action_item_impl(state.inner(), id, text, due_at, clear_due_at, is_date_only, is_done)
        .await
        .map_err(|error| state.command_error("update_action_item", &error))
}

#[tauri::command]
async fn toggle_action_item(
    state: tauri::State<'_, ProdAppState>,
    id: String,
) -> Result<ActionItem, String> {
    toggle_action_item_impl(state.inner(), id)
        .await
        .map_err(|error| state.command_error("toggle_action_item", &error))
}

#[tauri::command]
async fn delete_action_item(
    state: tauri::State<'_, ProdAppState>,
    id: String,
) -> Result<(), String> {
    delete_action_item_impl(state.inner(), id)
        .await
        .map_err(|error| state.command_error("delete_action_item", &error))
}

#[tauri::command]
async fn generate_tasks(
    state: tauri::State<'_, ProdAppState>,
    input: String,
) -> Result<AiFlowState, String> {
    generate_tasks_impl(state.inner(), input)
        .await
        .map_err(|error| state.command_error("generate_tasks", &error))
}

#[tauri::command]
async fn upload_document(
    state: tauri::State<'_, ProdAppState>,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<AiFlowState, String> {
    upload_document_impl(state.inner(), file_name, bytes)
        .await
        .map_err(|error| state.command_error("upload_document", &error))
}

#[tauri::command]
fn get_ai_flow(state: tauri::State<'_, ProdAppState>) -> AiFlowState {
    get_ai_flow_impl(state.inner())
}

#[tauri::command]
fn edit_generated_task(
    state: tauri::State<'_, ProdAppState>,
    index: usize,
    text: String,
) -> Result<AiFlowState, String> {
    edit_generated_task_impl(state.inner(), index, text)
        .map_err(|error| state.command_error("edit_generated_task", &error))
}

#[tauri::command]
fn set_generated_task_due(
    state: tauri::State<'_, ProdAppState>,
    index: usize,
    due_at: Option<String>,
    is_date_only: Option<bool>,
) -> Result<AiFlowState, String> {
    set_generated_task_due_impl(state.inner(), index, due_at, is_date_only)
        .map_err(|error| state.command_error("set_generated_task_due", &error))
}

#[tauri::command]
fn remove_generated_task(
    state: tauri::State<'_, ProdAppState>,
    index: usize,
) -> Result<AiFlowState, String> {
    remove_generated_task_impl(state.inner(), index)
        .map_err(|error| state.command_error("remove_generated_task", &error))
}

#[tauri::command]
async fn confirm_generated_tasks(
    state: tauri::State<'_, ProdAppState>,
) -> Result<Summary, String> {
    confirm_generated_tasks_impl(state.inner())
        .await
        .map_err(|error| state.command_error("confirm_generated_tasks", &error))
}

#[tauri::command]
fn cancel_generation(state: tauri::State<'_, ProdAppState>) -> AiFlowState {
    cancel_generation_impl(state.inner())
}

#[tauri::command]
fn privacy_notice_due(
    state: tauri::State<'_, ProdAppState>,
) -> Result<PrivacyNoticeResponse, String> {
    privacy_notice_due_impl(state.inner())
        .map_err(|error| state.command_error("privacy_notice_due", &error))
}

#[tauri::command]
fn acknowledge_privacy_notice(state: tauri::State<'_, ProdAppState>) -> Result<(), String> {
    acknowledge_privacy_notice_impl(state.inner())
        .map_err(|error| state.command_error("acknowledge_privacy_notice", &error))
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = ProdAppState::new(workspace_root).expect("failed to initialize app state");

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            bootstrap,
            initialize_session,
            get_session_status,
            login,
            verify_two_factor,
            register,
            verify_phone,
            logout,
            list_action_items,
            get_action_item,
            create_action_item,
            update_action_item,
            toggle_action_item,
            delete_action_item,
            generate_tasks,
            upload_document,
            get_ai_flow,
            edit_generated_task,
            set_generated_task_due,
            remove_generated_task,
            confirm_generated_tasks,
            cancel_generation,
            privacy_notice_due,
            acknowledge_privacy_notice
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
