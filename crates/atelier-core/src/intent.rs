//! Prompt intent classification.
//!
//! Free-text prompts are routed to one of eight generation pathways by
//! ordered, case-insensitive keyword matching. The priority order is part
//! of the contract, not an implementation detail: prompts routinely match
//! several categories ("edit this video") and the first rule wins.

use serde::{Deserialize, Serialize};

/// The classified purpose of a user prompt, selecting a generation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Text- or image-to-video job with polling
    VideoGen,
    /// Edit an attached image per the instruction
    ImageEdit,
    /// Inspect an attached image, streaming text back
    Analyze,
    /// Text-to-image, single response
    ImageGen,
    /// Streaming chat grounded in map places
    Maps,
    /// Streaming chat grounded in web search
    Search,
    /// Streaming generation of a self-contained HTML component
    UiGen,
    /// Plain streaming chat, cheapest model
    Chat,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Classifies a prompt into an [`Intent`].
///
/// Pure and deterministic; matching is case-insensitive substring search
/// over a fixed priority order (first match wins):
///
/// 1. motion vocabulary → `VideoGen`
/// 2. attachment + edit verb → `ImageEdit`
/// 3. attachment + inspection verb → `Analyze`
/// 4. imagery noun or "generate" → `ImageGen`
/// 5. place/navigation vocabulary → `Maps`
/// 6. information-seeking vocabulary → `Search`
/// 7. UI vocabulary → `UiGen`
/// 8. otherwise → `Chat`
pub fn classify(prompt: &str, has_attachment: bool) -> Intent {
    let t = prompt.to_lowercase();

    if contains_any(&t, &["video", "animate", "movie"]) {
        return Intent::VideoGen;
    }

    if has_attachment && contains_any(&t, &["add", "remove", "change", "edit", "filter"]) {
        return Intent::ImageEdit;
    }

    if has_attachment && contains_any(&t, &["analyze", "describe", "what is", "scan"]) {
        return Intent::Analyze;
    }

    if contains_any(&t, &["image", "picture", "photo", "generate"]) {
        return Intent::ImageGen;
    }

    if contains_any(&t, &["map", "location", "where", "nearby", "direction"]) {
        return Intent::Maps;
    }

    if contains_any(&t, &["search", "find", "news", "latest", "who", "when"]) {
        return Intent::Search;
    }

    if contains_any(&t, &["ui", "component", "dashboard"]) {
        return Intent::UiGen;
    }

    Intent::Chat
}
