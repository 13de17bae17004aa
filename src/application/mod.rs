pub mod action_items;
pub mod ai_tasks;
pub mod bootstrap;
pub mod commands;
pub mod session;

#[cfg(test)]
pub mod test_support;
