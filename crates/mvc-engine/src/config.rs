use std::path::Path;
use std::sync::Arc;

use mvc_codec::{DocumentCodec, JsonCodec, ZstdJsonCodec};
use mvc_journal::JournalConfig;
use mvc_types::ChangeSetId;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Which [`DocumentCodec`] encodes atom payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    #[default]
    Json,
    ZstdJson,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The canonical merge target. Its current snapshot is never reclaimed.
    pub trunk_change_set_id: ChangeSetId,
    pub codec: CodecKind,
    /// Only used by [`CodecKind::ZstdJson`].
    pub compression_level: i32,
    /// Durable journal. `None` keeps all state in memory.
    pub journal: Option<JournalConfig>,
    /// Depth of the FIFO command queue in front of the engine.
    pub queue_capacity: usize,
    /// Reject batches whose `fromIndexChecksum` is not the branch's current
    /// snapshot.
    pub strict_ordering: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trunk_change_set_id: ChangeSetId::from("HEAD"),
            codec: CodecKind::Json,
            compression_level: ZstdJsonCodec::DEFAULT_LEVEL,
            journal: None,
            queue_capacity: 256,
            strict_ordering: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn with_journal(mut self, journal: JournalConfig) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        mvc_refs::validate_id("trunk change set", self.trunk_change_set_id.as_str())
            .map_err(|e| EngineError::Config(e.to_string()))?;
        if self.queue_capacity == 0 {
            return Err(EngineError::Config("queue_capacity must be at least 1".into()));
        }
        if self.codec == CodecKind::ZstdJson && !(1..=22).contains(&self.compression_level) {
            return Err(EngineError::Config(format!(
                "compression_level {} is outside 1..=22",
                self.compression_level
            )));
        }
        Ok(())
    }

    pub fn build_codec(&self) -> Arc<dyn DocumentCodec> {
        match self.codec {
            CodecKind::Json => Arc::new(JsonCodec),
            CodecKind::ZstdJson => Arc::new(ZstdJsonCodec::new(self.compression_level)),
        }
    }
}
