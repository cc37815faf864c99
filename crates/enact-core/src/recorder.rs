//! Producer side of the traces file: accumulates per-agent preparation and
//! enaction histories and writes them in the shape the viewer polls.

use crate::{AgentHistory, Enaction, InteractionKind, TraceDataset, TraceError};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Entries kept per list and agent; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct TraceRecorder {
    dataset: TraceDataset,
    limit: usize,
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            dataset: TraceDataset::default(),
            limit,
        }
    }

    pub fn dataset(&self) -> &TraceDataset {
        &self.dataset
    }

    pub fn record_preparation(
        &mut self,
        agent: &str,
        kind: InteractionKind,
        valence: impl Into<Value>,
    ) {
        let limit = self.limit;
        let history = self.history_mut(agent);
        push_capped(&mut history.preparation, Enaction::new(kind, valence), limit);
    }

    pub fn record_enaction(
        &mut self,
        agent: &str,
        kind: InteractionKind,
        valence: impl Into<Value>,
    ) {
        let limit = self.limit;
        let history = self.history_mut(agent);
        push_capped(&mut history.enaction, Enaction::new(kind, valence), limit);
    }

    pub fn to_json(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string(&self.dataset)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TraceError> {
        serde_json::to_writer(writer, &self.dataset)?;
        Ok(())
    }

    /// Writes through a sibling temp file and renames it into place, so
    /// readers never see a partially written payload.
    pub fn write_atomic(&self, path: &Path) -> Result<(), TraceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = match path.file_name() {
            Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
            None => path.with_extension("tmp"),
        };

        std::fs::write(&temp_path, self.to_json()?)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn history_mut(&mut self, agent: &str) -> &mut AgentHistory {
        self.dataset.agents.entry(agent.to_string()).or_default()
    }
}

fn push_capped(entries: &mut Vec<Enaction>, entry: Enaction, limit: usize) {
    entries.push(entry);
    if entries.len() > limit {
        let overflow = entries.len() - limit;
        entries.drain(..overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TracePanel;
    use serde_json::json;

    #[test]
    fn histories_are_capped_dropping_oldest() {
        let mut recorder = TraceRecorder::new();
        for step in 0..(HISTORY_LIMIT + 5) {
            recorder.record_enaction("agent", InteractionKind::Step, step as i64);
        }

        let history = recorder.dataset().agent("agent").unwrap();
        assert_eq!(history.enaction.len(), HISTORY_LIMIT);
        assert_eq!(history.enaction[0].valence(), &json!(5));
        assert_eq!(
            history.enaction[HISTORY_LIMIT - 1].valence(),
            &json!(HISTORY_LIMIT as i64 + 4)
        );
    }

    #[test]
    fn preparation_and_enaction_are_tracked_separately() {
        let mut recorder = TraceRecorder::with_limit(2);
        recorder.record_preparation("a", InteractionKind::Bump, -10);
        recorder.record_preparation("a", InteractionKind::Feel, 0);
        recorder.record_preparation("a", InteractionKind::TurnLeft, -1);
        recorder.record_enaction("a", InteractionKind::Step, 1);

        let history = recorder.dataset().agent("a").unwrap();
        assert_eq!(history.preparation.len(), 2);
        assert_eq!(history.preparation[0].interaction(), &InteractionKind::Feel);
        assert_eq!(history.enaction.len(), 1);
    }

    #[test]
    fn written_payload_is_readable_by_the_viewer_model() {
        let mut recorder = TraceRecorder::new();
        recorder.record_enaction("walker", InteractionKind::Step, 1);
        recorder.record_enaction("walker", InteractionKind::Bump, -10);
        recorder.record_preparation("walker", InteractionKind::NoFeel, -1);

        let mut buffer = Vec::new();
        recorder.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let dataset = TraceDataset::parse(&text).unwrap();
        let panel = TracePanel::from_dataset(&dataset);
        assert_eq!(panel.block("walker").unwrap().strip(), " → ⇝");
    }

    #[test]
    fn write_atomic_replaces_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("traces.json");

        let mut recorder = TraceRecorder::new();
        recorder.record_enaction("a", InteractionKind::Feel, 0);
        recorder.write_atomic(&path).unwrap();
        recorder.record_enaction("a", InteractionKind::NoFeel, 0);
        recorder.write_atomic(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let dataset = TraceDataset::parse(&content).unwrap();
        assert_eq!(dataset.agent("a").unwrap().enaction.len(), 2);
        assert!(!dir.path().join("data").join("traces.json.tmp").exists());
    }
}
