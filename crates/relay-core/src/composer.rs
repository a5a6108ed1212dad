//! Message composition.
//!
//! The [`MessageComposer`] renders an alert through the configured template
//! and turns the output into outbound [`ChatMessage`]s according to the
//! selected [`SchemaVersion`].

use std::fmt;
use std::path::Path;

use minijinja::{AutoEscape, Environment, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alert::Alert;
use crate::error::{RelayError, Result};
use crate::message::{CardMessage, ChatMessage};
use crate::registry::ThreadHandle;

/// Maximum number of characters Google Chat accepts in a text message.
pub const MAX_TEXT_CHARS: usize = 4096;

/// Wire schema a provider produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Flat text messages.
    #[default]
    V1,
    /// Structured card messages.
    V2,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Renders alerts into chat messages.
pub struct MessageComposer {
    env: Environment<'static>,
    template: String,
    schema: SchemaVersion,
}

impl fmt::Debug for MessageComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageComposer")
            .field("template", &self.template)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl MessageComposer {
    /// Loads and compiles a template file.
    ///
    /// The template is registered under the file's base name.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TemplateLoad`] if the file cannot be read or
    /// does not compile.
    pub fn from_file(path: impl AsRef<Path>, schema: SchemaVersion) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |reason: String| RelayError::TemplateLoad {
            path: path.display().to_string(),
            reason,
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| load_err("path has no file name".to_string()))?;
        let source = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;

        Self::build(name, source, schema).map_err(|e| load_err(e.to_string()))
    }

    /// Compiles a template from source.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TemplateLoad`] if the source does not compile.
    pub fn from_source(
        name: impl Into<String>,
        source: impl Into<String>,
        schema: SchemaVersion,
    ) -> Result<Self> {
        let name = name.into();
        Self::build(name.clone(), source.into(), schema).map_err(|e| RelayError::TemplateLoad {
            path: name,
            reason: e.to_string(),
        })
    }

    fn build(
        name: String,
        source: String,
        schema: SchemaVersion,
    ) -> std::result::Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        register_helpers(&mut env);
        env.add_template_owned(name.clone(), source)?;

        Ok(Self {
            env,
            template: name,
            schema,
        })
    }

    /// Returns the name the template is registered under.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template
    }

    /// Returns the wire schema this composer produces.
    #[must_use]
    pub const fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Renders the template against an alert.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Render`] if rendering fails.
    pub fn render(&self, alert: &Alert) -> Result<String> {
        let template = self.env.get_template(&self.template)?;
        Ok(template.render(Value::from_serialize(alert))?)
    }

    /// Builds the messages for one alert on the given thread.
    ///
    /// Flat output becomes one text message per [`MAX_TEXT_CHARS`] chunk.
    /// Structured output is decoded as a card message whose thread fields
    /// are then overwritten with the thread identity.
    ///
    /// # Errors
    ///
    /// Returns a composition error if rendering fails or structured output
    /// is not a valid card message.
    pub fn prepare(&self, alert: &Alert, thread: &ThreadHandle) -> Result<Vec<ChatMessage>> {
        let rendered = self.render(alert)?;

        match self.schema {
            SchemaVersion::V1 => Ok(chunk_text(&rendered, MAX_TEXT_CHARS)
                .into_iter()
                .map(ChatMessage::text)
                .collect()),
            SchemaVersion::V2 => {
                let mut card: CardMessage =
                    serde_json::from_str(&rendered).map_err(|e| RelayError::InvalidCard {
                        reason: e.to_string(),
                    })?;
                card.bind_thread(thread);
                debug!(fingerprint = %alert.fingerprint, thread = %thread.id(), "composed card message");
                Ok(vec![ChatMessage::Complex(card)])
            }
        }
    }
}

/// Splits text into pieces of at most `max_chars` characters.
///
/// Text within the limit, including empty text, yields a single piece.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn register_helpers(env: &mut Environment<'static>) {
    env.add_filter("Title", title);
    env.add_filter("toUpper", to_upper);
    env.add_filter("Contains", contains);
    env.add_function("Contains", contains);
    env.add_filter("escapeJSON", escape_json);
    env.add_filter("Text", replace_newlines);
    env.add_function("isEmpty", is_empty);
    env.add_test("isEmpty", is_empty);
}

/// Upper-cases the first letter of every word.
fn title(value: Value) -> String {
    let mut out = String::new();
    let mut at_word_start = true;

    for c in value.to_string().chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = is_word_separator(c);
    }
    out
}

// ASCII punctuation splits words; outside ASCII only whitespace does.
fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        return !(c.is_ascii_alphanumeric() || c == '_');
    }
    !c.is_alphanumeric() && c.is_whitespace()
}

fn to_upper(value: Value) -> String {
    value.to_string().to_uppercase()
}

fn contains(haystack: Value, needle: Value) -> bool {
    haystack.to_string().contains(&needle.to_string())
}

/// Escapes a string for embedding inside a JSON string literal.
///
/// HTML-sensitive characters (`<`, `>`, `&`) and U+2028/U+2029 are also
/// written as `\uXXXX` escapes.
fn escape_json(value: Value) -> String {
    let encoded = serde_json::to_string(&value.to_string()).unwrap_or_default();
    let inner = encoded
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or_default();

    let mut out = String::with_capacity(inner.len());
    for c in inner.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

fn replace_newlines(value: Value) -> String {
    value.to_string().replace('\n', "\\n")
}

fn is_empty(value: Value) -> bool {
    value.as_str().is_none_or(str::is_empty)
}
