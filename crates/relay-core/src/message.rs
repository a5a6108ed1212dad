//! Outbound Google Chat message payloads.
//!
//! Two wire schemas exist and a provider uses exactly one of them:
//! - [`BasicMessage`]: `{"text": "..."}`
//! - [`CardMessage`]: a threaded card message carrying `cardsV2`
//!
//! See <https://developers.google.com/chat/api/reference/rest/v1/spaces.messages>.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::ThreadHandle;
use crate::widget::Widget;

/// A message ready to be posted to a chat webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatMessage {
    /// Flat text message.
    Basic(BasicMessage),
    /// Structured card message.
    Complex(CardMessage),
}

impl ChatMessage {
    /// Creates a flat text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Basic(BasicMessage { text: text.into() })
    }

    /// Returns the flat message, if this is one.
    #[must_use]
    pub const fn as_basic(&self) -> Option<&BasicMessage> {
        match self {
            Self::Basic(message) => Some(message),
            Self::Complex(_) => None,
        }
    }

    /// Returns the card message, if this is one.
    #[must_use]
    pub const fn as_card(&self) -> Option<&CardMessage> {
        match self {
            Self::Basic(_) => None,
            Self::Complex(message) => Some(message),
        }
    }

    /// Serializes the message into its JSON wire payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A flat text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicMessage {
    /// The message text.
    pub text: String,
}

/// Thread binding of a card message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Key grouping messages into one conversation.
    #[serde(default)]
    pub thread_key: String,
}

/// A structured card message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMessage {
    /// The thread this message belongs to.
    #[serde(default)]
    pub thread: Thread,
    /// Whether the message replies to an existing thread.
    #[serde(default)]
    pub thread_reply: bool,
    /// The cards in this message.
    #[serde(default, rename = "cardsV2")]
    pub cards: Vec<CardEntry>,
}

impl CardMessage {
    /// Points the message and all of its cards at the given thread.
    ///
    /// Any thread information produced by the template is overwritten.
    pub fn bind_thread(&mut self, thread: &ThreadHandle) {
        let key = thread.id().to_string();

        for entry in &mut self.cards {
            entry.card_id.clone_from(&key);
        }
        self.thread = Thread { thread_key: key };
        self.thread_reply = thread.is_existing();
    }
}

/// A card together with its identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    /// Identifier of the card within the message.
    #[serde(default)]
    pub card_id: String,
    /// The card itself.
    #[serde(default)]
    pub card: Card,
}

/// A card: a header followed by sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// The card header.
    #[serde(default)]
    pub header: CardHeader,
    /// The card sections.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Header shown at the top of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHeader {
    /// Header title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Header subtitle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// URL of the header image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Crop style of the header image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// Alternative text of the header image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt_text: Option<String>,
}

/// A section of widgets within a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Whether the section can be collapsed.
    #[serde(default)]
    pub collapsible: bool,
    /// Widgets that stay visible when the section is collapsed.
    #[serde(default)]
    pub uncollapsible_widgets_count: u32,
    /// The widgets in this section.
    #[serde(default)]
    pub widgets: Vec<Widget>,
}
