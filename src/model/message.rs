//! Compose body state and the outgoing send payload.

use super::attachment::Disposition;

/// Which body representation the user touched last. The other one is
/// derived from it whenever the session settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditedField {
    Text,
    Html,
}

/// The visible compose fields.
///
/// Outside template mode, after any settling operation exactly one of the
/// two body representations is the source of truth (per `last_edited`) and
/// the other is regenerated from it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BodyState {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub last_edited: EditedField,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            subject: String::new(),
            text: String::new(),
            html: String::new(),
            last_edited: EditedField::Text,
        }
    }
}

/// One attachment entry of the send payload. Inline images carry their
/// content id so the backend can rewrite `cid:` references; regular
/// attachments do not.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttachmentPayload {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(with = "super::attachment::serde_bytes_base64")]
    pub payload: Vec<u8>,
}

/// The assembled outgoing message handed to the send gateway.
///
/// The HTML body keeps its symbolic `cid:` references; the binary payloads
/// travel alongside in `attachments`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SendPayload {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    pub attachments: Vec<AttachmentPayload>,
}
