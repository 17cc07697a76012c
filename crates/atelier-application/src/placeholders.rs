//! Rotating placeholder prompts for the input bar.
//!
//! The deck starts from the built-in seed prompts and rotates on a fixed
//! interval. Optionally, once at startup, the chat model is asked for a
//! fresh batch of ideas; a well-formed batch is appended to the rotation
//! and anything else is logged and ignored.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use atelier_core::config::PlaceholderSettings;
use atelier_core::placeholder::PlaceholderDeck;
use atelier_interaction::{GeneratedPart, GenerationBackend, GenerationRequest};

/// Prompt sent once at startup to refresh the deck with model-written ideas.
const REFRESH_PROMPT: &str = "Write 8 short example prompts for a multimodal generation studio \
(UI components, images, video clips, maps lookups, web questions). \
Answer with a JSON array of strings only.";

/// Rotates the input-bar placeholder and refreshes the deck from the model.
pub struct PlaceholderService {
    deck: Arc<Mutex<PlaceholderDeck>>,
    backend: Arc<dyn GenerationBackend>,
    settings: PlaceholderSettings,
    chat_model: String,
}

impl PlaceholderService {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        settings: PlaceholderSettings,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            deck: Arc::new(Mutex::new(PlaceholderDeck::new())),
            backend,
            settings,
            chat_model: chat_model.into(),
        }
    }

    /// The placeholder currently shown.
    pub fn current(&self) -> String {
        self.deck.lock().unwrap().current().to_string()
    }

    /// A uniformly random prompt for the surprise-me affordance.
    pub fn random(&self) -> String {
        self.deck.lock().unwrap().random().to_string()
    }

    /// Asks the chat model for a fresh prompt batch and appends every
    /// well-formed entry. Failures are logged and swallowed; the seed deck
    /// keeps rotating either way.
    pub async fn refresh_once(&self) {
        if !self.settings.refresh_on_start {
            return;
        }

        let request = GenerationRequest::text(&self.chat_model, REFRESH_PROMPT);
        let parts = match self.backend.generate_content(request).await {
            Ok(parts) => parts,
            Err(err) => {
                tracing::warn!("[PlaceholderService] Deck refresh failed: {}", err);
                return;
            }
        };

        let text: String = parts
            .iter()
            .filter_map(|part| match part {
                GeneratedPart::Text(text) => Some(text.as_str()),
                GeneratedPart::InlineImage { .. } => None,
            })
            .collect();

        let added = self.deck.lock().unwrap().extend_from_model_output(&text);
        if added == 0 {
            tracing::debug!("[PlaceholderService] Deck refresh returned no usable prompts");
        } else {
            tracing::info!("[PlaceholderService] Deck extended with {} prompts", added);
        }
    }

    /// Spawns the rotation loop. Dropping the handle detaches the loop; it
    /// then runs for the life of the runtime.
    pub fn spawn_rotation(&self) -> JoinHandle<()> {
        let deck = self.deck.clone();
        // tokio::time::interval panics on a zero period.
        let period = Duration::from_secs(self.settings.rotate_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                deck.lock().unwrap().advance();
            }
        })
    }
}
