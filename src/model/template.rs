//! Template types and the active template binding.

use std::collections::HashMap;

/// One row of the template picker, as returned by `TemplateStore::list`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    /// Display name shown in the picker.
    pub name: String,
    /// Unsubstituted subject line, shown as a hint.
    pub subject_template: String,
}

/// Full template bodies, as returned by `TemplateStore::get`.
///
/// All three fields are unsubstituted: `{{key}}` tokens are still present.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TemplateDetail {
    pub id: i64,
    pub subject_template: String,
    pub body_text_template: String,
    pub body_html_template: String,
}

/// A placeholder declared by a template: the `{{key}}` token plus a
/// human-readable label for the input field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderSpec {
    pub key: String,
    pub label: String,
}

impl PlaceholderSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// The active template binding inside a compose session.
///
/// While a binding exists, the visible subject/text/html fields are always
/// exactly `substitute(raw_*, values)` — they are derived, never edited
/// independently of `values` and the raw fields.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TemplateBinding {
    pub template_id: i64,
    /// Declared placeholders, in the order the template store lists them.
    pub placeholders: Vec<PlaceholderSpec>,
    /// Current user-entered substitution values. Absent keys substitute
    /// as "leave the token alone", not as empty string.
    pub values: HashMap<String, String>,
    /// Unsubstituted subject template.
    pub raw_subject: String,
    /// Unsubstituted plain-text body template.
    pub raw_text: String,
    /// Unsubstituted HTML body template.
    pub raw_html: String,
}

impl TemplateBinding {
    /// Bind a freshly fetched template with empty values.
    pub fn new(detail: TemplateDetail, placeholders: Vec<PlaceholderSpec>) -> Self {
        Self {
            template_id: detail.id,
            placeholders,
            values: HashMap::new(),
            raw_subject: detail.subject_template,
            raw_text: detail.body_text_template,
            raw_html: detail.body_html_template,
        }
    }
}
