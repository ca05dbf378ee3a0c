use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

/// Maximum number of soft navigations remembered for `back()`.
const HISTORY_LIMIT: usize = 50;

/// Where the shell is and how it moves.
///
/// `navigate` is a soft, in-app transition. `reset_session` is the hard
/// redirect used on logout and on 401: the host is expected to drop all
/// in-memory state, not just routing state. It is idempotent while a reset
/// is pending and reports whether this call scheduled it.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
    fn reset_session(&self, path: &str) -> bool;
}

#[derive(Debug)]
struct NavState {
    current: String,
    history: Vec<String>,
    pending_reset: Option<String>,
}

/// In-process navigator with a bounded history stack.
#[derive(Debug)]
pub struct HistoryNavigator {
    state: Mutex<NavState>,
}

impl HistoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavState {
                current: start.into(),
                history: Vec::new(),
                pending_reset: None,
            }),
        }
    }

    /// Go back one soft navigation. Returns the new path, or `None` at the start.
    pub fn back(&self) -> Option<String> {
        let mut state = self.lock();
        let previous = state.history.pop()?;
        state.current = previous.clone();
        Some(previous)
    }

    pub fn is_reset_pending(&self) -> bool {
        self.lock().pending_reset.is_some()
    }

    /// Consume a pending reset: history is dropped and the reset target
    /// becomes the current path. Later resets are accepted again.
    pub fn take_pending_reset(&self) -> Option<String> {
        let mut state = self.lock();
        let target = state.pending_reset.take()?;
        state.history.clear();
        state.current = target.clone();
        Some(target)
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    fn lock(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    fn navigate(&self, path: &str) {
        let mut state = self.lock();
        if state.current == path {
            return;
        }
        debug!(from = %state.current, to = path, "Navigating");
        let previous = std::mem::replace(&mut state.current, path.to_string());
        state.history.push(previous);
        if state.history.len() > HISTORY_LIMIT {
            state.history.remove(0);
        }
    }

    fn reset_session(&self, path: &str) -> bool {
        let mut state = self.lock();
        if let Some(ref pending) = state.pending_reset {
            debug!(pending = %pending, "Session reset already pending");
            return false;
        }
        info!(to = path, "Full session reset scheduled");
        state.pending_reset = Some(path.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_and_back() {
        let nav = HistoryNavigator::new("/");
        nav.navigate("/dashboard");
        nav.navigate("/users/1");
        assert_eq!(nav.current_path(), "/users/1");

        assert_eq!(nav.back().as_deref(), Some("/dashboard"));
        assert_eq!(nav.back().as_deref(), Some("/"));
        assert!(nav.back().is_none());
    }

    #[test]
    fn test_navigate_to_same_path_is_not_recorded() {
        let nav = HistoryNavigator::new("/a");
        nav.navigate("/a");
        assert_eq!(nav.history_len(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let nav = HistoryNavigator::new("/");
        for i in 0..(HISTORY_LIMIT + 10) {
            nav.navigate(&format!("/p/{}", i));
        }
        assert_eq!(nav.history_len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_reset_session_is_idempotent_until_taken() {
        let nav = HistoryNavigator::new("/dashboard");
        assert!(nav.reset_session("/login"));
        assert!(!nav.reset_session("/login"));
        assert!(nav.is_reset_pending());

        assert_eq!(nav.take_pending_reset().as_deref(), Some("/login"));
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(nav.history_len(), 0);
        assert!(!nav.is_reset_pending());

        // A new reset is accepted once the previous one was consumed
        assert!(nav.reset_session("/login"));
    }
}
