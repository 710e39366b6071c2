//! Provider load/refresh state.

/// Lifecycle state of a `ConfigurationProvider`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// No snapshot loaded yet.
    Uninitialized = 0,
    /// Serving the latest successfully fetched snapshot.
    Loaded = 1,
    /// A refresh cycle is running; the previous snapshot is still served.
    Refreshing = 2,
    /// The last refresh failed; a stale snapshot is served.
    Degraded = 3,
    /// Stopped; no further refreshes.
    ShutDown = 4,
}

impl From<u8> for ProviderState {
    fn from(val: u8) -> Self {
        match val {
            1 => ProviderState::Loaded,
            2 => ProviderState::Refreshing,
            3 => ProviderState::Degraded,
            4 => ProviderState::ShutDown,
            _ => ProviderState::Uninitialized,
        }
    }
}

impl ProviderState {
    /// Whether a snapshot has been loaded and is being served.
    pub fn is_serving(self) -> bool {
        matches!(
            self,
            ProviderState::Loaded | ProviderState::Refreshing | ProviderState::Degraded
        )
    }
}
