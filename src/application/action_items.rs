use crate::application::session::SessionManager;
use crate::domain::models::{ActionItem, ActionItemPatch, NewActionItem};
use crate::infrastructure::action_item_cache::ActionItemCacheRepository;
use crate::infrastructure::api_client::BackendApiClient;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use chrono::Duration;
use std::sync::Arc;

pub const DEFAULT_LIST_MAX_AGE_MINUTES: i64 = 5;

/// Cached read/write access to the user's action items. Reads come from the
/// cache while it is fresh; every write confirms against the server first
/// and then invalidates, so the cache never holds unconfirmed state.
pub struct ActionItemService<S, C, R>
where
    S: CredentialStore,
    C: BackendApiClient,
    R: ActionItemCacheRepository,
{
    session: Arc<SessionManager<S, C>>,
    api_client: Arc<C>,
    cache: Arc<R>,
    list_max_age: Duration,
}

impl<S, C, R> ActionItemService<S, C, R>
where
    S: CredentialStore,
    C: BackendApiClient,
    R: ActionItemCacheRepository,
{
    pub fn new(
        session: Arc<SessionManager<S, C>>,
        api_client: Arc<C>,
        cache: Arc<R>,
        list_max_age: Duration,
    ) -> Self {
        Self {
            session,
            api_client,
            cache,
            list_max_age,
        }
    }

    pub async fn list(&self, force_refresh: bool) -> Result<Vec<ActionItem>, InfraError> {
        if !force_refresh {
            if let Some(items) = self.cache.fresh_list(self.list_max_age) {
                return Ok(items);
            }
        }

        let items = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                async move { client.list_action_items(token.as_deref()).await }
            })
            .await?;
        self.cache.put_list(items.clone());
        Ok(items)
    }

    pub async fn get(&self, id: &str, force_refresh: bool) -> Result<ActionItem, InfraError> {
        if !force_refresh {
            if let Some(item) = self.cache.get_item(id) {
                return Ok(item);
            }
        }

        let item = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let id = id.to_string();
                async move { client.get_action_item(token.as_deref(), &id).await }
            })
            .await?;
        self.cache.put_item(item.clone());
        Ok(item)
    }

    pub async fn create(&self, new_item: NewActionItem) -> Result<ActionItem, InfraError> {
        if new_item.text.trim().is_empty() {
            return Err(InfraError::Validation(
                "Task text must not be empty".to_string(),
            ));
        }

        let created = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let new_item = new_item.clone();
                async move { client.create_action_item(token.as_deref(), &new_item).await }
            })
            .await?;
        self.cache.put_item(created.clone());
        self.cache.invalidate_list();
        Ok(created)
    }

    /// An empty patch never reaches the network.
    pub async fn update(&self, id: &str, patch: ActionItemPatch) -> Result<(), InfraError> {
        if patch.is_empty() {
            return Ok(());
        }
        if let Some(text) = patch.text.as_deref() {
            if text.trim().is_empty() {
                return Err(InfraError::Validation(
                    "Task text must not be empty".to_string(),
                ));
            }
        }

        self.session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let id = id.to_string();
                let patch = patch.clone();
                async move { client.update_action_item(token.as_deref(), &id, &patch).await }
            })
            .await?;
        self.cache.invalidate_item(id);
        self.cache.invalidate_list();
        Ok(())
    }

    pub async fn toggle_done(&self, id: &str) -> Result<ActionItem, InfraError> {
        let updated = self
            .session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let id = id.to_string();
                async move { client.toggle_action_item(token.as_deref(), &id).await }
            })
            .await?;
        self.cache.put_item(updated.clone());
        self.cache.invalidate_list();
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), InfraError> {
        self.session
            .with_auth_retry(|token| {
                let client = Arc::clone(&self.api_client);
                let id = id.to_string();
                async move { client.delete_action_item(token.as_deref(), &id).await }
            })
            .await?;
        self.cache.invalidate_item(id);
        self.cache.invalidate_list();
        Ok(())
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}
