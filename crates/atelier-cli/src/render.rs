//! Colored artifact-card rendering for the shell.

use std::collections::HashMap;

use colored::{ColoredString, Colorize};

use atelier_application::StateSnapshot;
use atelier_core::session::{Artifact, ArtifactKind, ArtifactStatus, Session};

const PREVIEW_LINES: usize = 8;

pub fn status_glyph(status: ArtifactStatus) -> ColoredString {
    match status {
        ArtifactStatus::Waiting => "…".yellow(),
        ArtifactStatus::Streaming => "↻".cyan(),
        ArtifactStatus::Complete => "✔".green(),
        ArtifactStatus::Error => "✘".red(),
    }
}

/// Prints cards as snapshots arrive, once per artifact status change.
///
/// Watch receivers coalesce bursts, so changes are detected by diffing
/// against the last printed status rather than by counting messages.
pub struct CardTracker {
    printed: HashMap<String, ArtifactStatus>,
}

impl CardTracker {
    /// Starts from a snapshot without printing it, so restored history
    /// stays quiet at startup.
    pub fn seeded(snapshot: &StateSnapshot) -> Self {
        let mut printed = HashMap::new();
        for session in &snapshot.sessions {
            for artifact in &session.artifacts {
                printed.insert(artifact.id.clone(), artifact.status);
            }
        }
        Self { printed }
    }

    /// Prints every artifact whose status moved since the last call.
    ///
    /// In-flight statuses print as one-liners; terminal statuses print the
    /// full card.
    pub fn print_changes(&mut self, snapshot: &StateSnapshot) {
        for artifact in self.take_changes(snapshot) {
            match artifact.status {
                ArtifactStatus::Complete | ArtifactStatus::Error => print_card(artifact),
                ArtifactStatus::Waiting | ArtifactStatus::Streaming => print_progress(artifact),
            }
        }
    }

    /// Records and returns the artifacts whose status moved.
    fn take_changes<'a>(&mut self, snapshot: &'a StateSnapshot) -> Vec<&'a Artifact> {
        let mut moved = Vec::new();
        for session in &snapshot.sessions {
            for artifact in &session.artifacts {
                if self.printed.get(&artifact.id).copied() == Some(artifact.status) {
                    continue;
                }
                self.printed.insert(artifact.id.clone(), artifact.status);
                moved.push(artifact);
            }
        }
        moved
    }
}

fn print_progress(artifact: &Artifact) {
    println!(
        "{} {} {}",
        status_glyph(artifact.status),
        artifact.title,
        model_tag(artifact).bright_black()
    );
}

/// Prints one card: glyph, title, model tag, content preview, sources.
pub fn print_card(artifact: &Artifact) {
    println!();
    println!(
        "{} {} {}",
        status_glyph(artifact.status),
        artifact.title.bold(),
        model_tag(artifact).bright_black()
    );

    let body = preview_text(artifact);
    let total = body.lines().count();
    for line in body.lines().take(PREVIEW_LINES) {
        if artifact.status == ArtifactStatus::Error {
            println!("  {}", line.red());
        } else {
            println!("  {line}");
        }
    }
    if total > PREVIEW_LINES {
        let hidden = total - PREVIEW_LINES;
        println!("  {}", format!("... ({hidden} more lines)").bright_black());
    }

    for line in grounding_lines(artifact) {
        println!("  {}", line.bright_black());
    }
}

pub fn print_session(index: usize, session: &Session, is_current: bool) {
    let marker = if is_current { "*" } else { " " };
    println!(
        "{}{} {}",
        marker,
        format!("[{index}]").bright_black(),
        session.prompt.bold()
    );
    for artifact in &session.artifacts {
        print_card(artifact);
    }
}

pub fn print_session_list(snapshot: &StateSnapshot) {
    if snapshot.sessions.is_empty() {
        println!("{}", "No sessions yet.".bright_black());
        return;
    }
    for (index, session) in snapshot.sessions.iter().enumerate() {
        let marker = if snapshot.current == Some(index) { "*" } else { " " };
        let glyphs = session
            .artifacts
            .iter()
            .map(|artifact| status_glyph(artifact.status).to_string())
            .collect::<Vec<_>>()
            .join("");
        println!("{} {:>3}  {}  {}", marker, index, glyphs, session.prompt);
    }
}

fn model_tag(artifact: &Artifact) -> String {
    let model = artifact
        .metadata
        .as_ref()
        .and_then(|meta| meta.model.as_deref())
        .unwrap_or("-");
    format!("[{model}]")
}

fn preview_text(artifact: &Artifact) -> String {
    match artifact.kind {
        ArtifactKind::Image => data_url_summary(&artifact.content),
        _ => artifact.content.clone(),
    }
}

/// Inline images arrive as data URLs; print their shape, not the payload.
fn data_url_summary(content: &str) -> String {
    match content.split_once(',') {
        Some((header, payload)) => format!("{header},... ({} base64 chars)", payload.len()),
        None => content.to_string(),
    }
}

fn grounding_lines(artifact: &Artifact) -> Vec<String> {
    let Some(chunks) = artifact
        .metadata
        .as_ref()
        .and_then(|meta| meta.grounding_chunks.as_ref())
    else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for chunk in chunks {
        if let Some(web) = &chunk.web {
            let title = web.title.as_deref().unwrap_or("(untitled)");
            lines.push(format!("- {} {}", title, web.uri));
        }
        if let Some(maps) = &chunk.maps {
            let title = maps.title.as_deref().unwrap_or("(unnamed)");
            lines.push(format!("- {} (place {})", title, maps.place_id));
        }
    }
    if !lines.is_empty() {
        lines.insert(0, "Sources:".to_string());
    }
    lines
}
