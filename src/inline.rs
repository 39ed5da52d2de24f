//! Inline-image registry for a compose session.
//!
//! Owns every image pasted during the session: binary payload, metadata,
//! and the generated symbolic content id that the HTML body references as
//! `cid:<contentId>`. The registry never touches the body fields itself;
//! it only produces reference snippets for the session to insert.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::bridge::escape_html;
use crate::model::attachment::InlineImage;

/// Content produced for one image, to be appended to the body fields by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSnippet {
    /// `<p><img src="cid:…" alt="…"/></p>` for the HTML body.
    pub html_fragment: String,
    /// `[image: <filename>]` marker line for the plain-text body.
    pub text_marker: String,
}

/// Generate a session-unique token: `prefix_<random hex>_<unix millis>`.
///
/// The random component makes collisions negligible; the time component
/// keeps tokens monotonic-ish and recognizable in logs.
pub fn generate_token(prefix: &str) -> String {
    let rand_part: u64 = rand::random();
    let millis = chrono::Utc::now().timestamp_millis();
    format!("{prefix}_{rand_part:x}_{millis}")
}

/// The set of inline images owned by one compose session.
///
/// Records are immutable once created; the registry only appends and
/// removes whole records.
#[derive(Debug, Clone, Default)]
pub struct InlineImageRegistry {
    images: Vec<InlineImage>,
    /// Suggested filenames treated as "no real name given".
    generic_filenames: Vec<String>,
}

impl InlineImageRegistry {
    pub fn new(generic_filenames: Vec<String>) -> Self {
        Self {
            images: Vec::new(),
            generic_filenames,
        }
    }

    /// Register a pasted image and return the created record.
    ///
    /// A fresh record id and content id are generated; the content id is
    /// never reused within the session. When `suggested_filename` is
    /// absent or one of the configured generic placeholder names, a
    /// filename is generated from the record id and the MIME subtype.
    pub fn add(
        &mut self,
        payload: Vec<u8>,
        mime_type: &str,
        suggested_filename: Option<&str>,
    ) -> &InlineImage {
        let id = generate_token("img");
        let content_id = generate_token("cid");

        let filename = match suggested_filename {
            Some(name)
                if !name.is_empty() && !self.generic_filenames.iter().any(|g| g == name) =>
            {
                name.to_string()
            }
            _ => format!("{id}.{}", extension_for(mime_type)),
        };

        let image = InlineImage {
            id,
            filename,
            mime_type: mime_type.to_string(),
            size_bytes: payload.len() as u64,
            payload,
            content_id,
        };

        tracing::debug!(
            id = %image.id,
            content_id = %image.content_id,
            filename = %image.filename,
            "Registered inline image"
        );
        self.images.push(image);
        let last = self.images.len() - 1;
        &self.images[last]
    }

    /// Remove the record with the given id. No-op when absent.
    pub fn remove(&mut self, id: &str) {
        self.images.retain(|img| img.id != id);
    }

    /// All registered images, in paste order.
    pub fn images(&self) -> &[InlineImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&InlineImage> {
        self.images.iter().find(|img| img.id == id)
    }

    /// Drop every record (session reset).
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Produce the body snippets referencing `image`.
    ///
    /// The caller appends these to the HTML and text bodies; the registry
    /// does not mutate the compose body itself.
    pub fn reference_snippet(&self, image: &InlineImage) -> ReferenceSnippet {
        ReferenceSnippet {
            html_fragment: format!(
                "<p><img src=\"cid:{}\" alt=\"{}\"/></p>",
                image.content_id,
                escape_html(&image.filename)
            ),
            text_marker: format!("[image: {}]", image.filename),
        }
    }

    /// Rewrite every `cid:<contentId>` occurrence in `html` to a base64
    /// `data:` URL for local preview rendering.
    ///
    /// Preview only — the payload submitted to the backend keeps the
    /// symbolic `cid:` form and carries the binaries separately.
    pub fn resolve_for_preview(&self, html: &str) -> String {
        let mut out = html.to_string();
        for img in &self.images {
            let needle = format!("cid:{}", img.content_id);
            if out.contains(&needle) {
                let data_url =
                    format!("data:{};base64,{}", img.mime_type, STANDARD.encode(&img.payload));
                out = out.replace(&needle, &data_url);
            }
        }
        out
    }
}

/// File extension for a MIME type, defaulting to `bin`.
fn extension_for(mime_type: &str) -> &str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}
