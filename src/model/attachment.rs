//! Attachment and inline-image records.
//!
//! Inline images are referenced from the HTML body via `cid:` tokens;
//! plain attachments are never referenced from the body.

use humansize::{format_size as humansize_format, DECIMAL};

/// How an attached payload travels in the outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Embedded in the HTML body via a `cid:` reference.
    Inline,
    /// A regular attachment outside the body.
    Attachment,
}

/// An image pasted into the editor during a compose session.
///
/// Immutable once created: the session only ever appends and removes
/// records, never rewrites one.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InlineImage {
    /// Session-unique record id (`img_<hex>_<millis>`).
    pub id: String,

    /// Filename; generated when the clipboard gave none or a generic one.
    pub filename: String,

    /// MIME content type (e.g. `"image/png"`).
    pub mime_type: String,

    /// Payload size in bytes.
    pub size_bytes: u64,

    /// Raw binary payload.
    #[serde(with = "serde_bytes_base64")]
    pub payload: Vec<u8>,

    /// Symbolic content id embedded into the HTML body as `cid:<contentId>`.
    /// Never reused across images in the same session.
    pub content_id: String,
}

/// A regular (non-inline) attachment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    /// Session-unique record id (`att_<hex>_<millis>`).
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(with = "serde_bytes_base64")]
    pub payload: Vec<u8>,
}

/// Human-readable size for UI rendering ("1.2 kB", "3.4 MB").
pub fn format_size(bytes: u64) -> String {
    humansize_format(bytes, DECIMAL)
}

/// Serialize binary payloads as base64 strings so send payloads stay
/// valid JSON when handed to transport glue.
pub(crate) mod serde_bytes_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert!(format_size(2048).starts_with("2"));
    }

    #[test]
    fn test_inline_image_payload_roundtrip() {
        let img = InlineImage {
            id: "img_1".to_string(),
            filename: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 3,
            payload: vec![1, 2, 3],
            content_id: "cid_1".to_string(),
        };
        let json = serde_json::to_string(&img).expect("serialize");
        let back: InlineImage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.payload, vec![1, 2, 3]);
        assert_eq!(back.content_id, "cid_1");
    }
}
