//! Rotating example-prompt deck.
//!
//! The deck seeds the input placeholder with example prompts, rotating on a
//! fixed interval. Once at startup the application may ask the chat model
//! for a fresh batch; model output is free-form text, so extraction is a
//! parse-with-fallback: pull the first bracketed JSON array out of the text,
//! parse it, and on any failure keep the deck as-is.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Seed prompts shown before (and alongside) any model-provided batch.
pub const INITIAL_PLACEHOLDERS: [&str; 9] = [
    "Agentic Orchestration Graph with node-based workflow editor and step-debugging",
    "Model Context Protocol (MCP) Registry with tool availability status and latency metrics",
    "LLM Guardrails Configuration with PII masking thresholds and topic blocking rules",
    "RAG Vector Database Health Monitor showing embedding dimensions and index fragmentation",
    "Multi-Agent Swarm Control Plane with role assignment and inter-agent message logs",
    "Token Economics Dashboard for detailed cost-per-token analysis and budget forecasting",
    "Fine-tuning Job Manager with loss curves, hyperparameter tuning, and checkpoint selection",
    "AI Employee Roster showing active skills, memory context usage, and performance rating",
    "Prompt Engineering Playground with version history, variable injection, and diff view",
];

static ARRAY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("array block pattern"));

/// Extracts a prompt batch from free-form model output.
///
/// Finds the first `[` through the last `]` and parses the block as a JSON
/// array of strings. Returns `None` for anything else, including an empty
/// array; callers fall back to their current deck.
pub fn extract_prompt_batch(raw: &str) -> Option<Vec<String>> {
    let block = ARRAY_BLOCK.find(raw)?;
    let parsed: Vec<String> = serde_json::from_str(block.as_str()).ok()?;
    if parsed.is_empty() { None } else { Some(parsed) }
}

/// The rotating deck of example prompts.
#[derive(Debug, Clone)]
pub struct PlaceholderDeck {
    prompts: Vec<String>,
    index: usize,
}

impl PlaceholderDeck {
    /// A deck holding the seed prompts.
    pub fn new() -> Self {
        Self::with_prompts(INITIAL_PLACEHOLDERS.iter().map(|p| p.to_string()).collect())
    }

    /// A deck over the given prompts; an empty list falls back to the seeds
    /// so rotation and random picks are always defined.
    pub fn with_prompts(prompts: Vec<String>) -> Self {
        if prompts.is_empty() {
            return Self::new();
        }
        Self { prompts, index: 0 }
    }

    /// The prompt currently shown as the placeholder.
    pub fn current(&self) -> &str {
        &self.prompts[self.index]
    }

    /// Rotates to the next prompt, wrapping modulo deck length, and returns
    /// it.
    pub fn advance(&mut self) -> &str {
        self.index = (self.index + 1) % self.prompts.len();
        &self.prompts[self.index]
    }

    /// Picks a uniformly random prompt (the surprise-me affordance).
    pub fn random(&self) -> &str {
        let i = rand::thread_rng().gen_range(0..self.prompts.len());
        &self.prompts[i]
    }

    /// Parse-with-fallback append: extracts a batch from model output and
    /// appends it to the rotation. Returns how many prompts were added,
    /// zero when the output was not a well-formed batch (deck unchanged).
    pub fn extend_from_model_output(&mut self, raw: &str) -> usize {
        match extract_prompt_batch(raw) {
            Some(batch) => {
                let added = batch.len();
                self.prompts.extend(batch);
                added
            }
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Default for PlaceholderDeck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_modulo_deck_length() {
        let mut deck = PlaceholderDeck::with_prompts(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ]);
        assert_eq!(deck.current(), "a");
        assert_eq!(deck.advance(), "b");
        assert_eq!(deck.advance(), "c");
        assert_eq!(deck.advance(), "a");
    }

    #[test]
    fn seeds_are_used_when_given_nothing() {
        let deck = PlaceholderDeck::with_prompts(vec![]);
        assert_eq!(deck.len(), INITIAL_PLACEHOLDERS.len());
    }

    #[test]
    fn random_pick_is_a_deck_member() {
        let deck = PlaceholderDeck::new();
        let pick = deck.random().to_string();
        assert!(INITIAL_PLACEHOLDERS.contains(&pick.as_str()));
    }

    #[test]
    fn extracts_array_wrapped_in_prose() {
        let raw = "Sure! Here are some ideas:\n[\"one\", \"two\"]\nEnjoy.";
        assert_eq!(
            extract_prompt_batch(raw),
            Some(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn extracts_fenced_json_array() {
        let raw = "```json\n[\n  \"Realtime GPU telemetry wall\",\n  \"Latency heatmap\"\n]\n```";
        let batch = extract_prompt_batch(raw).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], "Realtime GPU telemetry wall");
    }

    #[test]
    fn garbage_output_leaves_the_deck_unchanged() {
        let mut deck = PlaceholderDeck::new();
        let before = deck.len();
        assert_eq!(deck.extend_from_model_output("no array here"), 0);
        assert_eq!(deck.extend_from_model_output("[1, 2, 3]"), 0);
        assert_eq!(deck.extend_from_model_output("[]"), 0);
        assert_eq!(deck.len(), before);
    }

    #[test]
    fn well_formed_batch_is_appended() {
        let mut deck = PlaceholderDeck::with_prompts(vec!["seed".to_string()]);
        let added = deck.extend_from_model_output("[\"x\", \"y\", \"z\"]");
        assert_eq!(added, 3);
        assert_eq!(deck.len(), 4);
    }
}
