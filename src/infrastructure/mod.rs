pub mod action_item_cache;
pub mod api_client;
pub mod client_state;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod storage;
pub mod token_store;
