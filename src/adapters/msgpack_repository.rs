//! MessagePack implementation of the agent repository.
//!
//! This adapter implements the AgentRepository port using rmp_serde for
//! compact binary serialization.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, error::Error, persistence::SavedAgent, ports::AgentRepository};

/// MessagePack-based agent repository.
///
/// # Examples
///
/// ```no_run
/// use flappy_rl::adapters::MsgPackRepository;
/// use flappy_rl::ports::AgentRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let saved = repo.load(Path::new("trained.msgpack"))?;
/// println!("{} episodes", saved.metadata.episodes_trained);
/// # Ok::<(), flappy_rl::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl AgentRepository for MsgPackRepository {
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, agent).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize agent to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush agent file {path:?}"),
            source,
        })
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize agent from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        exploration::EpsilonSchedule, monte_carlo::MonteCarloAgent, persistence::TrainingMetadata,
    };

    fn saved() -> SavedAgent {
        let agent = MonteCarloAgent::new(1.0, EpsilonSchedule::default());
        let metadata = TrainingMetadata {
            episodes_trained: 3,
            scores: vec![0.0, 1.0, 2.0],
            ..TrainingMetadata::default()
        };
        SavedAgent::from_learner(&agent, metadata).expect("Failed to capture agent")
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("agent.msgpack");

        let repo = MsgPackRepository::new();
        repo.save(&saved(), &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded.metadata.episodes_trained, 3);
        assert_eq!(loaded.metadata.scores, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new();
        let result = repo.load(&temp_dir.path().join("missing.msgpack"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_to_full_device_returns_error() {
        let result = MsgPackRepository::new().save(&saved(), Path::new("/dev/full"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_garbage_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("garbage.msgpack");
        std::fs::write(&file_path, b"not an agent").expect("Failed to write");

        let result = MsgPackRepository::new().load(&file_path);
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }
}
