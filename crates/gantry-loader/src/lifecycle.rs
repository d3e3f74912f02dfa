use crate::LoaderError;

/// Observable states of an [`AppLoader`](crate::AppLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Resolving,
    Fetching,
    Delivered,
    Failed,
}

impl LoadState {
    /// True once the current load attempt has settled, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Delivered | LoadState::Failed)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "idle"),
            LoadState::Resolving => write!(f, "resolving"),
            LoadState::Fetching => write!(f, "fetching"),
            LoadState::Delivered => write!(f, "delivered"),
            LoadState::Failed => write!(f, "failed"),
        }
    }
}

pub fn validate_transition(from: LoadState, to: LoadState) -> Result<(), LoaderError> {
    let valid = matches!(
        (from, to),
        // a new load request is accepted in any state and replaces the
        // active fetcher
        (_, LoadState::Resolving)
            | (
                // the fetch starts once a manifest is available; force-reload
                // re-enters the fetch from an in-flight or settled load
                LoadState::Resolving
                    | LoadState::Fetching
                    | LoadState::Delivered
                    | LoadState::Failed,
                LoadState::Fetching,
            )
            | (LoadState::Fetching, LoadState::Delivered)
            | (LoadState::Resolving | LoadState::Fetching, LoadState::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(LoaderError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
