use crate::source::{FetchError, TraceSource};
use enact_core::{hash_code, TraceDataset, TraceError, TracePanel};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Payload identical to the previous one; nothing parsed or rendered.
    Unchanged,
    Rendered { agents: usize },
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Trace(#[from] TraceError),
}

/// Change detection and render state for one traces resource.
#[derive(Debug, Default)]
pub struct TraceViewer {
    previous_payload: Option<String>,
    panel: TracePanel,
    cycles: u64,
    renders: u64,
}

impl TraceViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> &TracePanel {
        &self.panel
    }

    pub fn previous_payload(&self) -> Option<&str> {
        self.previous_payload.as_deref()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub async fn poll_cycle(
        &mut self,
        source: &dyn TraceSource,
    ) -> Result<CycleOutcome, CycleError> {
        self.cycles += 1;
        let payload = source.fetch_text().await?;
        Ok(self.accept_payload(payload)?)
    }

    /// Compares `payload` byte for byte with the last accepted one and, when it
    /// differs, stores it, parses it, and rebuilds the panel. A payload that
    /// fails to parse is still remembered, so repeating it is `Unchanged`.
    pub fn accept_payload(&mut self, payload: String) -> Result<CycleOutcome, TraceError> {
        if self.previous_payload.as_deref() == Some(payload.as_str()) {
            return Ok(CycleOutcome::Unchanged);
        }

        let fingerprint = hash_code(&payload);
        let parsed = TraceDataset::parse(&payload);
        self.previous_payload = Some(payload);
        let dataset = parsed?;

        self.render(&dataset);
        debug!(
            event = "traces_rendered",
            agents = dataset.agents.len(),
            payload_hash = fingerprint,
            renders = self.renders
        );
        Ok(CycleOutcome::Rendered {
            agents: dataset.agents.len(),
        })
    }

    pub fn render(&mut self, dataset: &TraceDataset) {
        self.panel.render(dataset);
        self.renders += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scripted::{transport_error, ScriptedSource};

    const STEP_BUMP: &str = r#"{"A": {"enaction": [["Step", 0], ["Bump", 0]]}}"#;

    #[tokio::test]
    async fn identical_payload_skips_render() {
        let source = ScriptedSource::new(vec![
            Ok(STEP_BUMP.to_string()),
            Ok(STEP_BUMP.to_string()),
        ]);
        let mut viewer = TraceViewer::new();

        let first = viewer.poll_cycle(&source).await.unwrap();
        assert_eq!(first, CycleOutcome::Rendered { agents: 1 });
        let rendered = viewer.panel().clone();

        let second = viewer.poll_cycle(&source).await.unwrap();
        assert_eq!(second, CycleOutcome::Unchanged);
        assert_eq!(viewer.panel(), &rendered);
        assert_eq!(viewer.renders(), 1);
        assert_eq!(viewer.cycles(), 2);
    }

    #[tokio::test]
    async fn whitespace_only_change_rebuilds_panel() {
        let reformatted = STEP_BUMP.replace(", ", ",");
        let source =
            ScriptedSource::new(vec![Ok(STEP_BUMP.to_string()), Ok(reformatted.clone())]);
        let mut viewer = TraceViewer::new();

        viewer.poll_cycle(&source).await.unwrap();
        let second = viewer.poll_cycle(&source).await.unwrap();

        assert_eq!(second, CycleOutcome::Rendered { agents: 1 });
        assert_eq!(viewer.renders(), 2);
        assert_eq!(viewer.previous_payload(), Some(reformatted.as_str()));
    }

    #[test]
    fn repeated_malformed_payload_is_not_parsed_again() {
        let mut viewer = TraceViewer::new();
        viewer.accept_payload(STEP_BUMP.to_string()).unwrap();

        let err = viewer.accept_payload("{not json".to_string()).unwrap_err();
        assert!(matches!(err, TraceError::Parse(_)));
        assert_eq!(viewer.panel().block("A").unwrap().strip(), " → ⇝");

        let again = viewer.accept_payload("{not json".to_string()).unwrap();
        assert_eq!(again, CycleOutcome::Unchanged);
        assert_eq!(viewer.renders(), 1);
    }

    #[test]
    fn missing_enaction_aborts_render_and_keeps_display() {
        let mut viewer = TraceViewer::new();
        viewer.accept_payload(STEP_BUMP.to_string()).unwrap();

        let result = viewer.accept_payload(r#"{"B": {"preparation": []}}"#.to_string());
        assert!(result.is_err());
        assert!(viewer.panel().block("B").is_none());
        assert!(viewer.panel().block("A").is_some());
    }

    #[tokio::test]
    async fn fetch_failure_leaves_panel_and_payload_untouched() {
        let source =
            ScriptedSource::new(vec![Ok(STEP_BUMP.to_string()), Err(transport_error())]);
        let mut viewer = TraceViewer::new();
        viewer.poll_cycle(&source).await.unwrap();

        let err = viewer.poll_cycle(&source).await.unwrap_err();
        assert!(matches!(err, CycleError::Fetch(_)));
        assert_eq!(viewer.previous_payload(), Some(STEP_BUMP));
        assert_eq!(viewer.panel().len(), 1);
    }

    #[test]
    fn empty_dataset_clears_panel() {
        let mut viewer = TraceViewer::new();
        viewer.accept_payload(STEP_BUMP.to_string()).unwrap();

        let outcome = viewer.accept_payload("{}".to_string()).unwrap();
        assert_eq!(outcome, CycleOutcome::Rendered { agents: 0 });
        assert!(viewer.panel().is_empty());
    }
}
