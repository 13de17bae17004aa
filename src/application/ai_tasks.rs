use crate::application::session::SessionManager;
use crate::domain::models::{
    CreateSummaryRequest, GenerateTasksRequest, GeneratedTasksResponse, ProposedTask, Summary,
    SummaryActionItem,
};
use crate::infrastructure::action_item_cache::ActionItemCacheRepository;
use crate::infrastructure::api_client::BackendApiClient;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Review phase of the AI flow. Nothing in `tasks` exists on the server
/// until the user confirms; editing and removing entries is purely local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AiFlowState {
    Idle,
    Generating,
    Reviewing {
        original_text: String,
        summary: String,
        tasks: Vec<ProposedTask>,
    },
}

struct FlowSlot {
    state: AiFlowState,
    /// Bumped on cancel and confirm so a generation that completes
    /// afterwards is recognized as stale and dropped.
    epoch: u64,
}

/// Drives the generate/review/confirm flow for AI-suggested tasks. The flow
/// is a strict state machine; operations outside their phase fail without
/// side effects, and only `confirm` ever persists anything.
pub struct AiTaskService<S, C, R>
where
    S: CredentialStore,
    C: BackendApiClient,
    R: ActionItemCacheRepository,
{
    session: Arc<SessionManager<S, C>>,
    api_client: Arc<C>,
    cache: Arc<R>,
    slot: Mutex<FlowSlot>,
}

impl<S, C, R> AiTaskService<S, C, R>
where
    S: CredentialStore,
    C: BackendApiClient,
    R: ActionItemCacheRepository,
{
    pub fn new(session: Arc<SessionManager<S, C>>, api_client: Arc<C>, cache: Arc<R>) -> Self {
        Self {
            session,
            api_client,
            cache,
            slot: Mutex::new(FlowSlot {
                state: AiFlowState::Idle,
                epoch: 0,
            }),
        }
    }

    pub fn state(&self) -> AiFlowState {
        self.lock_slot().state.clone()
    }

    pub async fn generate_from_text(&self, input: &str) -> Result<AiFlowState, InfraError> {
        let input = input.trim().to_string();
        if input.is_empty() {
            return Err(InfraError::Validation(
                "Nothing to generate from; enter some text".to_string(),
            ));
        }

        let epoch = self.begin_generating()?;
        let request = GenerateTasksRequest {
            input: input.clone(),
            use_map_reduce: true,
            model: None,
        };
        let result = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let request = request.clone();
                async move { client.generate_tasks(token.as_deref(), &request).await }
            })
            .await;
        self.finish_generating(epoch, input, result)
    }

    /// Document upload variant. The review keeps the file name as the
    /// original text since the extracted content never reaches the client.
    pub async fn generate_from_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<AiFlowState, InfraError> {
        let file_name = file_name.trim().to_string();
        if file_name.is_empty() {
            return Err(InfraError::Validation(
                "File name must not be empty".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(InfraError::Validation("File is empty".to_string()));
        }

        let epoch = self.begin_generating()?;
        let result = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let file_name = file_name.clone();
                let bytes = bytes.clone();
                async move {
                    client
                        .upload_document(token.as_deref(), &file_name, bytes)
                        .await
                }
            })
            .await;
        self.finish_generating(epoch, file_name, result)
    }

    pub fn edit_task(&self, index: usize, text: &str) -> Result<(), InfraError> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(InfraError::Validation(
                "Task text must not be empty".to_string(),
            ));
        }
        self.with_reviewing_task(index, |task| {
            task.text = text;
        })
    }

    pub fn set_task_due(
        &self,
        index: usize,
        due_at: Option<DateTime<Utc>>,
        is_date_only: bool,
    ) -> Result<(), InfraError> {
        if due_at.is_none() && is_date_only {
            return Err(InfraError::Validation(
                "A date-only task needs a due date".to_string(),
            ));
        }
        self.with_reviewing_task(index, |task| {
            task.due_at = due_at;
            task.is_date_only = is_date_only;
        })
    }

    pub fn remove_task(&self, index: usize) -> Result<(), InfraError> {
        let mut slot = self.lock_slot();
        let AiFlowState::Reviewing { tasks, .. } = &mut slot.state else {
            return Err(InfraError::Validation(
                "No generated tasks under review".to_string(),
            ));
        };
        if index >= tasks.len() {
            return Err(InfraError::Validation(format!(
                "No task at position {index}"
            )));
        }
        tasks.remove(index);
        Ok(())
    }

    /// Persist the reviewed summary and tasks in one request. The review
    /// leaves the slot for the duration of the request, so an overlapping
    /// confirm finds nothing to post; it is restored if the request fails.
    /// On success the flow stays idle and the action item list cache is
    /// invalidated so the next read sees the new items.
    pub async fn confirm(&self) -> Result<Summary, InfraError> {
        let (request, review, epoch) = {
            let mut slot = self.lock_slot();
            let AiFlowState::Reviewing {
                original_text,
                summary,
                tasks,
            } = &slot.state
            else {
                return Err(InfraError::Validation(
                    "No generated tasks under review".to_string(),
                ));
            };
            if tasks.is_empty() {
                return Err(InfraError::Validation(
                    "Nothing to save; all suggested tasks were removed".to_string(),
                ));
            }
            let request = CreateSummaryRequest {
                original_text: original_text.clone(),
                summary_text: summary.clone(),
                action_items: tasks
                    .iter()
                    .map(|task| SummaryActionItem {
                        text: task.text.clone(),
                        due_at: task.due_at,
                        is_date_only: task.is_date_only,
                    })
                    .collect(),
            };
            let epoch = slot.epoch;
            let review = std::mem::replace(&mut slot.state, AiFlowState::Idle);
            (request, review, epoch)
        };

        let result = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let request = request.clone();
                async move { client.create_summary(token.as_deref(), &request).await }
            })
            .await;

        match result {
            Ok(summary) => {
                self.cache.invalidate_list();
                Ok(summary)
            }
            Err(error) => {
                let mut slot = self.lock_slot();
                // Restore only into an untouched slot; a cancel or a new
                // generation started meanwhile keeps its state.
                if slot.epoch == epoch && slot.state == AiFlowState::Idle {
                    slot.state = review;
                }
                Err(error)
            }
        }
    }

    /// Abandon the flow. Never touches the network; an in-flight generation
    /// is dropped when it completes.
    pub fn cancel(&self) {
        let mut slot = self.lock_slot();
        slot.state = AiFlowState::Idle;
        slot.epoch += 1;
    }

    fn begin_generating(&self) -> Result<u64, InfraError> {
        let mut slot = self.lock_slot();
        match slot.state {
            AiFlowState::Idle => {
                slot.state = AiFlowState::Generating;
                Ok(slot.epoch)
            }
            AiFlowState::Generating => Err(InfraError::Validation(
                "Generation already in progress".to_string(),
            )),
            AiFlowState::Reviewing { .. } => Err(InfraError::Validation(
                "Finish or cancel the current review first".to_string(),
            )),
        }
    }

    fn finish_generating(
        &self,
        epoch: u64,
        original_text: String,
        result: Result<GeneratedTasksResponse, InfraError>,
    ) -> Result<AiFlowState, InfraError> {
        let mut slot = self.lock_slot();
        if slot.epoch != epoch {
            // Cancelled while in flight; the result no longer matters.
            return Ok(slot.state.clone());
        }
        match result {
            Ok(response) => {
                slot.state = AiFlowState::Reviewing {
                    original_text,
                    summary: response.summary,
                    tasks: response
                        .action_items
                        .into_iter()
                        .map(|task| task.into_proposed())
                        .collect(),
                };
                Ok(slot.state.clone())
            }
            Err(error) => {
                slot.state = AiFlowState::Idle;
                Err(error)
            }
        }
    }

    fn with_reviewing_task(
        &self,
        index: usize,
        apply: impl FnOnce(&mut ProposedTask),
    ) -> Result<(), InfraError> {
        let mut slot = self.lock_slot();
        let AiFlowState::Reviewing { tasks, .. } = &mut slot.state else {
            return Err(InfraError::Validation(
                "No generated tasks under review".to_string(),
            ));
        };
        let task = tasks.get_mut(index).ok_or_else(|| {
            InfraError::Validation(format!("No task at position {index}"))
        })?;
        apply(task);
        Ok(())
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, FlowSlot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
