//! Card widgets for the structured Google Chat schema.
//!
//! Google Chat identifies a widget by the single key it carries rather than
//! by a type tag, e.g. `{"decoratedText": {...}}`. Encoding uses serde's
//! externally tagged representation, which produces exactly that shape.
//! Decoding is structural: the object is first read as a generic JSON map,
//! the variant is picked by which distinguishing key is present, and only
//! that branch is then decoded strictly. Objects carrying none of the known
//! keys are rejected instead of being dropped.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const COLUMNS: &str = "columns";
const DECORATED_TEXT: &str = "decoratedText";
const TEXT_PARAGRAPH: &str = "textParagraph";

/// A widget inside a card section or column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    /// A row of columns, each holding nested widgets.
    Columns(Columns),
    /// Text with optional decorations.
    DecoratedText(DecoratedText),
    /// A plain paragraph.
    TextParagraph(TextParagraph),
}

impl Widget {
    /// Returns the key that identifies this widget on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Columns(_) => COLUMNS,
            Self::DecoratedText(_) => DECORATED_TEXT,
            Self::TextParagraph(_) => TEXT_PARAGRAPH,
        }
    }

    /// Creates a text paragraph widget.
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::TextParagraph(TextParagraph {
            text: Some(text.into()),
        })
    }

    /// Picks the variant from the keys of a decoded JSON object.
    fn from_map(mut map: Map<String, Value>) -> Result<Self, String> {
        let decode_err = |kind: &str, err: serde_json::Error| format!("invalid {kind} widget: {err}");

        if let Some(body) = map.remove(COLUMNS) {
            return decode_branch(body)
                .map(Self::Columns)
                .map_err(|e| decode_err(COLUMNS, e));
        }
        if let Some(body) = map.remove(DECORATED_TEXT) {
            return decode_branch(body)
                .map(Self::DecoratedText)
                .map_err(|e| decode_err(DECORATED_TEXT, e));
        }
        if let Some(body) = map.remove(TEXT_PARAGRAPH) {
            return decode_branch(body)
                .map(Self::TextParagraph)
                .map_err(|e| decode_err(TEXT_PARAGRAPH, e));
        }

        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        Err(format!(
            "unrecognized widget with keys {keys:?}: expected one of {COLUMNS}, {DECORATED_TEXT}, {TEXT_PARAGRAPH}"
        ))
    }
}

// A null branch, e.g. `{"decoratedText": null}`, is an empty widget.
fn decode_branch<T: DeserializeOwned + Default>(body: Value) -> serde_json::Result<T> {
    if body.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(body)
}

impl<'de> Deserialize<'de> for Widget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(de::Error::custom)
    }
}

/// Body of a columns widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    /// The columns, left to right.
    #[serde(default)]
    pub column_items: Vec<ColumnItem>,
}

/// A single column holding nested widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnItem {
    /// Width style of the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_size_style: Option<String>,
    /// Horizontal alignment of the widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_alignment: Option<String>,
    /// Vertical alignment of the widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_alignment: Option<String>,
    /// Widgets in this column.
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// Body of a decorated text widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratedText {
    /// The main text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether long text wraps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
    /// Text shown below the main text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_label: Option<String>,
}

/// Body of a text paragraph widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextParagraph {
    /// The paragraph text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn decode_decorated_text() {
        let widget: Widget =
            serde_json::from_str(r#"{"decoratedText":{"text":"x","wrapText":true}}"#).unwrap();

        assert_eq!(
            widget,
            Widget::DecoratedText(DecoratedText {
                text: Some("x".to_string()),
                wrap_text: Some(true),
                bottom_label: None,
            })
        );
    }

    #[test]
    fn decorated_text_reencodes_its_fields() {
        let input = json!({"decoratedText": {"text": "x", "wrapText": true}});
        let widget: Widget = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(serde_json::to_value(&widget).unwrap(), input);
    }

    #[test]
    fn decode_text_paragraph() {
        let widget: Widget =
            serde_json::from_value(json!({"textParagraph": {"text": "hello"}})).unwrap();
        assert_eq!(widget, Widget::paragraph("hello"));
        assert_eq!(widget.kind(), "textParagraph");
    }

    #[test]
    fn decode_nested_columns() {
        let input = json!({
            "columns": {
                "columnItems": [
                    {
                        "horizontalSizeStyle": "FILL_AVAILABLE_SPACE",
                        "horizontalAlignment": "START",
                        "verticalAlignment": "CENTER",
                        "widgets": [
                            {"decoratedText": {"text": "Severity", "bottomLabel": "critical"}}
                        ]
                    },
                    {
                        "widgets": [
                            {"columns": {"columnItems": [{"widgets": [{"textParagraph": {"text": "deep"}}]}]}}
                        ]
                    }
                ]
            }
        });

        let widget: Widget = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(widget.kind(), "columns");
        if let Widget::Columns(columns) = &widget {
            assert_eq!(columns.column_items.len(), 2);
            assert_eq!(columns.column_items[0].widgets[0].kind(), "decoratedText");
            assert!(matches!(columns.column_items[1].widgets[0], Widget::Columns(_)));
        }
        assert_eq!(serde_json::to_value(&widget).unwrap(), input);
    }

    #[test]
    fn extra_keys_do_not_change_the_variant() {
        let widget: Widget = serde_json::from_value(json!({
            "horizontalAlignment": "CENTER",
            "textParagraph": {"text": "t"}
        }))
        .unwrap();
        assert_eq!(widget, Widget::paragraph("t"));
    }

    #[test_case(json!({"image": {"imageUrl": "https://example.com/a.png"}}) ; "unknown widget key")]
    #[test_case(json!({}) ; "empty object")]
    fn unrecognized_widget_is_rejected(input: Value) {
        let err = serde_json::from_value::<Widget>(input).unwrap_err();
        assert!(err.to_string().contains("unrecognized widget"));
    }

    #[test]
    fn non_object_widget_is_rejected() {
        assert!(serde_json::from_value::<Widget>(json!("textParagraph")).is_err());
    }

    #[test_case(json!({"decoratedText": null}), Widget::DecoratedText(DecoratedText::default()) ; "decorated text")]
    #[test_case(json!({"textParagraph": null}), Widget::TextParagraph(TextParagraph::default()) ; "text paragraph")]
    #[test_case(json!({"columns": null}), Widget::Columns(Columns::default()) ; "columns")]
    fn null_branch_decodes_to_empty_widget(input: Value, expected: Widget) {
        let widget: Widget = serde_json::from_value(input).unwrap();
        assert_eq!(widget, expected);
    }

    #[test]
    fn malformed_branch_is_rejected() {
        let err = serde_json::from_value::<Widget>(json!({"decoratedText": {"wrapText": "yes"}}))
            .unwrap_err();
        assert!(err.to_string().contains("invalid decoratedText widget"));
    }

    #[test]
    fn unknown_nested_widget_fails_the_parent() {
        let input = json!({
            "columns": {"columnItems": [{"widgets": [{"divider": {}}]}]}
        });
        assert!(serde_json::from_value::<Widget>(input).is_err());
    }
}
