//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`
//! directory) so operators can tune household behavior without
//! recompiling. Two templates drive the runtime: `actor_turn.j2` renders
//! an actor's inbox and framing into its turn prompt, and
//! `arbiter_review.j2` renders an actor's output plus the resource status
//! into the arbiter's review prompt.
//!
//! Persona files live alongside the templates (default: `personas/`). A
//! persona file is plain text; an optional `## per-turn` marker splits the
//! fixed system persona from a short reminder re-sent with every turn.

use minijinja::Environment;

use crate::error::RuntimeError;

/// Marker separating a persona's system section from its per-turn reminder.
const PER_TURN_MARKER: &str = "## per-turn";

/// Manages prompt template loading and rendering.
///
/// Wraps a `minijinja` [`Environment`] with both household templates
/// pre-loaded. Templates can be edited on disk and will be picked up on
/// the next call to [`PromptEngine::new`].
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `actor_turn.j2` and `arbiter_review.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, RuntimeError> {
        let mut env = Environment::new();

        let actor_tpl = load_template(templates_dir, "actor_turn.j2")?;
        let arbiter_tpl = load_template(templates_dir, "arbiter_review.j2")?;

        env.add_template_owned("actor_turn", actor_tpl).map_err(|e| {
            RuntimeError::Template(format!("failed to add actor_turn template: {e}"))
        })?;
        env.add_template_owned("arbiter_review", arbiter_tpl)
            .map_err(|e| {
                RuntimeError::Template(format!("failed to add arbiter_review template: {e}"))
            })?;

        Ok(Self { env })
    }

    /// Render an actor's turn prompt from the serialized turn context.
    pub fn render_actor_turn(
        &self,
        context: &serde_json::Value,
    ) -> Result<String, RuntimeError> {
        self.render("actor_turn", context)
    }

    /// Render the arbiter's review prompt from the serialized turn output
    /// and resource status.
    pub fn render_arbiter_review(
        &self,
        context: &serde_json::Value,
    ) -> Result<String, RuntimeError> {
        self.render("arbiter_review", context)
    }

    fn render(
        &self,
        name: &str,
        context: &serde_json::Value,
    ) -> Result<String, RuntimeError> {
        self.env
            .get_template(name)
            .map_err(|e| RuntimeError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| RuntimeError::Template(format!("{name} render failed: {e}")))
    }
}

/// A loaded persona file, split at the per-turn marker.
#[derive(Debug, Clone)]
pub struct Persona {
    /// The fixed system persona.
    pub system: String,
    /// A short reminder appended to every turn prompt, if the file has one.
    pub per_turn: Option<String>,
}

/// Load and split a persona file.
pub fn load_persona(personas_dir: &str, filename: &str) -> Result<Persona, RuntimeError> {
    let path = format!("{personas_dir}/{filename}");
    let text = std::fs::read_to_string(&path)
        .map_err(|e| RuntimeError::Persona(format!("failed to read {path}: {e}")))?;
    Ok(split_persona(&text))
}

/// Split persona text at the first [`PER_TURN_MARKER`] line.
fn split_persona(text: &str) -> Persona {
    text.split_once(PER_TURN_MARKER).map_or_else(
        || Persona {
            system: text.trim().to_owned(),
            per_turn: None,
        },
        |(system, per_turn)| {
            let per_turn = per_turn.trim();
            Persona {
                system: system.trim().to_owned(),
                per_turn: (!per_turn.is_empty()).then(|| per_turn.to_owned()),
            }
        },
    )
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, RuntimeError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| RuntimeError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_templates(dir: &std::path::Path) {
        std::fs::write(
            dir.join("actor_turn.j2"),
            "It is {{ time_label }}. You are in {{ scene }}.\n\
             {% for m in inbox %}{{ m.from }} says: {{ m.body }}\n{% endfor %}\
             Reply with 1-thought:{...} and optionally 2-say-to{name}{words}.",
        )
        .ok();
        std::fs::write(
            dir.join("arbiter_review.j2"),
            "Facilities:\n{{ resource_status }}\n\
             {{ actor }} thought {{ thought }} and said {{ dialogue_text }} to {{ dialogue_target }}.",
        )
        .ok();
    }

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "flatshare_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn template_loading_and_rendering() {
        let dir = temp_dir("templates");
        write_test_templates(&dir);

        let engine = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(engine.is_ok(), "PromptEngine::new should succeed with valid templates");

        let engine = match engine {
            Ok(e) => e,
            Err(_) => return,
        };

        let context = serde_json::json!({
            "time_label": "Morning 07:15",
            "scene": "Ming's room",
            "inbox": [
                {"from": "Li", "body": "is the bathroom free?"}
            ]
        });

        let prompt = engine.render_actor_turn(&context).unwrap_or_default();
        assert!(prompt.contains("Morning 07:15"));
        assert!(prompt.contains("Li says: is the bathroom free?"));

        let review = serde_json::json!({
            "resource_status": "- Bathroom: idle",
            "actor": "Ming",
            "thought": "hungry",
            "dialogue_target": "Li",
            "dialogue_text": "yes, go ahead"
        });
        let prompt = engine.render_arbiter_review(&review).unwrap_or_default();
        assert!(prompt.contains("- Bathroom: idle"));
        assert!(prompt.contains("Ming thought hungry"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let dir = temp_dir("missing_templates");
        // Write only one template, leaving the other missing
        std::fs::write(dir.join("actor_turn.j2"), "test").ok();

        let result = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(result.is_err(), "should fail when templates are missing");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn persona_splits_at_the_marker() {
        let persona = split_persona(
            "You are Ming, an early riser.\n\n## per-turn\nStay in character.",
        );
        assert_eq!(persona.system, "You are Ming, an early riser.");
        assert_eq!(persona.per_turn.as_deref(), Some("Stay in character."));
    }

    #[test]
    fn persona_without_marker_is_all_system() {
        let persona = split_persona("You are Li. You sleep late.\n");
        assert_eq!(persona.system, "You are Li. You sleep late.");
        assert!(persona.per_turn.is_none());
    }

    #[test]
    fn missing_persona_file_returns_error() {
        let result = load_persona("/nonexistent", "ming.txt");
        assert!(result.is_err());
    }
}
