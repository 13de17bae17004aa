use std::sync::Mutex;

/// Point-in-time view of the token store. The generation counter lets the
/// refresh coordinator tell whether another caller already replaced the
/// token since a 401 was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub access_token: Option<String>,
    pub generation: u64,
}

/// Process-wide holder of the current access token. Only the session manager
/// and explicit login/logout flows write it; everything else reads.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: Mutex<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<String>,
    generation: u64,
}

impl TokenStore {
    pub fn set_access_token(&self, token: Option<String>) {
        let mut state = self.lock();
        state.access_token = token.filter(|value| !value.trim().is_empty());
        state.generation += 1;
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        let state = self.lock();
        TokenSnapshot {
            access_token: state.access_token.clone(),
            generation: state.generation,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenState> {
        // Writes never panic while holding the lock; recover the state on
        // the off chance a test assertion poisoned it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
