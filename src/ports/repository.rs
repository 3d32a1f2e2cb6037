//! Repository port for agent persistence.

use std::path::Path;

use crate::{Result, persistence::SavedAgent};

/// Port for persisting and loading trained agents.
///
/// # Examples
///
/// ```no_run
/// use flappy_rl::ports::AgentRepository;
/// use flappy_rl::persistence::SavedAgent;
/// use std::path::Path;
///
/// fn save_agent<R: AgentRepository>(
///     repo: &R,
///     agent: &SavedAgent,
///     path: &Path,
/// ) -> flappy_rl::Result<()> {
///     repo.save(agent, path)
/// }
/// ```
pub trait AgentRepository {
    /// Save an agent to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()>;

    /// Load an agent from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not decode into a [`SavedAgent`].
    fn load(&self, path: &Path) -> Result<SavedAgent>;
}
