use crate::{InteractionKind, TraceDataset};
use std::fmt;

pub const SEPARATOR: char = ' ';

/// One agent's group in the trace panel: a heading and its glyph strip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentBlock {
    pub agent: String,
    pub trace: Vec<InteractionKind>,
}

impl AgentBlock {
    /// Every entry contributes a separator, known kinds also their glyph.
    pub fn strip(&self) -> String {
        let mut strip = String::with_capacity(self.trace.len() * 4);
        for kind in &self.trace {
            strip.push(SEPARATOR);
            if let Some(glyph) = kind.glyph() {
                strip.push(glyph);
            }
        }
        strip
    }
}

/// The display container. Each render replaces its whole content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracePanel {
    blocks: Vec<AgentBlock>,
}

impl TracePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: &TraceDataset) -> Self {
        let mut panel = Self::new();
        panel.render(dataset);
        panel
    }

    pub fn render(&mut self, dataset: &TraceDataset) {
        self.clear();
        for (agent, history) in dataset.iter() {
            let trace = history
                .enaction
                .iter()
                .map(|entry| entry.interaction().clone())
                .collect();
            self.blocks.push(AgentBlock {
                agent: agent.clone(),
                trace,
            });
        }
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn blocks(&self) -> &[AgentBlock] {
        &self.blocks
    }

    pub fn block(&self, agent: &str) -> Option<&AgentBlock> {
        self.blocks.iter().find(|block| block.agent == agent)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for TracePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}", block.agent)?;
            writeln!(f, "{}", block.strip())?;
        }
        Ok(())
    }
}
