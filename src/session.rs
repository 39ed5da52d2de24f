//! The compose-session state machine.
//!
//! A session is either `Manual` (no template bound) or `TemplateBound`.
//! While bound, the visible subject/text/html fields are always exactly
//! `substitute(raw_*, values)` — direct edits to a bound field are
//! reinterpreted as edits to the corresponding raw template field (live
//! template editing; see the method docs). Outside template mode the two
//! body representations are kept consistent through the bridge, with
//! `last_edited` naming the source of truth.
//!
//! All mutation happens synchronously on one session instance. Template
//! loads that complete out of order are fenced with a request epoch:
//! a response whose ticket is superseded is discarded, never applied.

use crate::bridge::{self, HtmlTextExtractor, TagStripper};
use crate::config::Config;
use crate::error::{ComposeError, Result};
use crate::inline::{generate_token, InlineImageRegistry};
use crate::model::attachment::{Attachment, Disposition, InlineImage};
use crate::model::message::{AttachmentPayload, BodyState, EditedField, SendPayload};
use crate::model::template::{PlaceholderSpec, TemplateBinding, TemplateDetail};
use crate::placeholder::apply_placeholders;
use crate::store::{SendGateway, TemplateStore};

/// One clipboard item from a paste event.
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub mime_type: String,
    pub data: Vec<u8>,
    /// Filename reported by the clipboard, if any.
    pub filename: Option<String>,
}

/// Result of handling a paste event.
#[derive(Debug, Clone, Default)]
pub struct PasteOutcome {
    /// Ids of the inline images created from this paste.
    pub added: Vec<String>,
    /// Whether the event carried at least one image item, in which case
    /// the caller must suppress the default paste-as-text behavior.
    pub suppress_default: bool,
}

/// Handle for an in-flight template load. Apply it with
/// [`ComposeSession::apply_template_load`]; if another selection (or a
/// clear/reset) happened in between, the apply is discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateLoadTicket {
    template_id: i64,
    epoch: u64,
}

impl TemplateLoadTicket {
    pub fn template_id(&self) -> i64 {
        self.template_id
    }
}

/// Read-only view of the session for rendering. Binary payloads are left
/// out; the UI fetches previews through [`ComposeSession::preview_html`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSnapshot {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub last_edited: EditedField,
    pub template_id: Option<i64>,
    pub placeholders: Vec<PlaceholderSpec>,
    pub inline_image_count: usize,
    pub attachment_count: usize,
    pub sending: bool,
}

/// The compose session. Created when the compose view mounts, discarded
/// on navigation away; nothing is persisted.
pub struct ComposeSession {
    to: String,
    body: BodyState,
    binding: Option<TemplateBinding>,
    images: InlineImageRegistry,
    attachments: Vec<Attachment>,
    config: Config,
    extractor: Box<dyn HtmlTextExtractor>,
    /// Reentrancy guard: set while programmatically writing a derived
    /// field so a wired-back change notification cannot loop. Cleared
    /// synchronously, never held across a suspension point.
    syncing: bool,
    /// Monotonic fence for template-load responses.
    load_epoch: u64,
    /// Set between `begin_send` and `finish_send`; refuses double-send.
    sending: bool,
}

impl Default for ComposeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposeSession {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let images = InlineImageRegistry::new(config.compose.generic_filenames.clone());
        Self {
            to: String::new(),
            body: BodyState::default(),
            binding: None,
            images,
            attachments: Vec::new(),
            config,
            extractor: Box::new(TagStripper),
            syncing: false,
            load_epoch: 0,
            sending: false,
        }
    }

    /// Swap in a different HTML-to-text extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn HtmlTextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    // ── Read access ───────────────────────────────────────────

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn body(&self) -> &BodyState {
        &self.body
    }

    pub fn binding(&self) -> Option<&TemplateBinding> {
        self.binding.as_ref()
    }

    pub fn is_template_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn images(&self) -> &[InlineImage] {
        self.images.images()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Snapshot for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            to: self.to.clone(),
            subject: self.body.subject.clone(),
            text: self.body.text.clone(),
            html: self.body.html.clone(),
            last_edited: self.body.last_edited,
            template_id: self.binding.as_ref().map(|b| b.template_id),
            placeholders: self
                .binding
                .as_ref()
                .map(|b| b.placeholders.clone())
                .unwrap_or_default(),
            inline_image_count: self.images.len(),
            attachment_count: self.attachments.len(),
            sending: self.sending,
        }
    }

    /// HTML body with `cid:` references resolved to data URLs, for local
    /// preview only.
    pub fn preview_html(&self) -> String {
        self.images.resolve_for_preview(&self.body.html)
    }

    // ── Field edits ───────────────────────────────────────────

    pub fn edit_to(&mut self, value: &str) {
        self.to = value.to_string();
    }

    /// Edit the subject field. While bound this edits the raw subject
    /// template and re-substitutes.
    pub fn edit_subject(&mut self, value: &str) {
        if self.syncing {
            return;
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.raw_subject = value.to_string();
            self.apply_binding();
            return;
        }
        self.body.subject = value.to_string();
    }

    /// Edit the plain-text body.
    ///
    /// Manual mode: `text` becomes the source of truth and `html` is
    /// regenerated from it. Template mode: the edit rewrites the raw text
    /// template (editing the template in place), the raw HTML template is
    /// regenerated through the bridge, and values are re-applied.
    pub fn edit_text(&mut self, value: &str) {
        if self.syncing {
            return;
        }
        self.body.last_edited = EditedField::Text;
        if let Some(binding) = self.binding.as_mut() {
            binding.raw_text = value.to_string();
            binding.raw_html = bridge::text_to_html(value);
            self.apply_binding();
            return;
        }
        self.body.text = value.to_string();
        self.syncing = true;
        self.body.html = bridge::text_to_html(value);
        self.syncing = false;
    }

    /// Edit the HTML body; mirror image of [`edit_text`](Self::edit_text).
    pub fn edit_html(&mut self, value: &str) {
        if self.syncing {
            return;
        }
        self.body.last_edited = EditedField::Html;
        if let Some(binding) = self.binding.as_mut() {
            binding.raw_html = value.to_string();
            binding.raw_text = bridge::html_to_text(self.extractor.as_ref(), value);
            self.apply_binding();
            return;
        }
        self.body.html = value.to_string();
        self.syncing = true;
        self.body.text = bridge::html_to_text(self.extractor.as_ref(), value);
        self.syncing = false;
    }

    /// Update one placeholder value and re-substitute every visible
    /// field. No-op when no template is bound.
    pub fn edit_placeholder_value(&mut self, key: &str, value: &str) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        binding.values.insert(key.to_string(), value.to_string());
        self.apply_binding();
    }

    /// Recompute every visible field as `substitute(raw_*, values)`.
    fn apply_binding(&mut self) {
        let Some(binding) = self.binding.as_ref() else {
            return;
        };
        let subject = apply_placeholders(&binding.raw_subject, &binding.values);
        let text = apply_placeholders(&binding.raw_text, &binding.values);
        let html = apply_placeholders(&binding.raw_html, &binding.values);

        self.syncing = true;
        self.body.subject = subject;
        self.body.text = text;
        self.body.html = html;
        self.syncing = false;
    }

    // ── Template binding ──────────────────────────────────────

    /// Start loading a template. Bumps the load epoch so any response to
    /// an earlier selection becomes stale.
    pub fn begin_template_load(&mut self, template_id: i64) -> TemplateLoadTicket {
        self.load_epoch += 1;
        TemplateLoadTicket {
            template_id,
            epoch: self.load_epoch,
        }
    }

    /// Apply a completed template load.
    ///
    /// Binding a template overwrites the visible fields — a deliberate,
    /// destructive transition. Returns `false` (and changes nothing) when
    /// the ticket was superseded by a later selection, clear, or reset.
    pub fn apply_template_load(
        &mut self,
        ticket: TemplateLoadTicket,
        detail: TemplateDetail,
        placeholders: Vec<PlaceholderSpec>,
    ) -> bool {
        if ticket.epoch != self.load_epoch {
            tracing::warn!(
                template_id = ticket.template_id,
                "Discarding stale template load response"
            );
            return false;
        }
        tracing::debug!(template_id = detail.id, "Template bound");
        self.binding = Some(TemplateBinding::new(detail, placeholders));
        self.apply_binding();
        true
    }

    /// Select a template by id: fetch and bind in one step. Re-selecting
    /// while bound re-runs the bind, discarding the previous values.
    pub fn select_template(&mut self, store: &dyn TemplateStore, template_id: i64) -> Result<()> {
        let ticket = self.begin_template_load(template_id);
        let detail = store.get(template_id)?;
        let placeholders = store.placeholders(template_id)?;
        self.apply_template_load(ticket, detail, placeholders);
        Ok(())
    }

    /// Drop the template binding. The visible fields keep their
    /// last-substituted content so the user does not lose work; they are
    /// simply no longer derived. In-flight loads become stale.
    pub fn clear_template(&mut self) {
        self.load_epoch += 1;
        if self.binding.take().is_some() {
            tracing::debug!("Template binding cleared");
        }
    }

    // ── Inline images and attachments ─────────────────────────

    /// Handle a clipboard paste event.
    ///
    /// Non-image items are silently ignored. Each image item is
    /// registered and its reference snippet appended to the body fields
    /// (to the raw templates while bound, per the bound-edit rule).
    /// Oversized or empty image payloads are skipped with a warning.
    pub fn paste_clipboard(&mut self, items: &[ClipboardItem]) -> PasteOutcome {
        let mut outcome = PasteOutcome::default();
        for item in items {
            if !item.mime_type.starts_with("image/") {
                continue;
            }
            outcome.suppress_default = true;

            if item.data.is_empty() {
                tracing::warn!(mime = %item.mime_type, "Skipping empty clipboard image");
                continue;
            }
            if item.data.len() > self.config.compose.max_inline_image_bytes {
                tracing::warn!(
                    mime = %item.mime_type,
                    size = item.data.len(),
                    limit = self.config.compose.max_inline_image_bytes,
                    "Skipping oversized clipboard image"
                );
                continue;
            }

            let image = self
                .images
                .add(item.data.clone(), &item.mime_type, item.filename.as_deref())
                .clone();
            self.insert_inline_reference(&image);
            outcome.added.push(image.id);
        }
        outcome
    }

    /// Append the reference snippet for `image` to the body fields.
    ///
    /// Body edits and registry edits are decoupled once inserted:
    /// removing the image later does not strip the reference.
    fn insert_inline_reference(&mut self, image: &InlineImage) {
        let snippet = self.images.reference_snippet(image);
        self.body.last_edited = EditedField::Html;

        if let Some(binding) = self.binding.as_mut() {
            append_block(&mut binding.raw_html, &snippet.html_fragment);
            append_block(&mut binding.raw_text, &snippet.text_marker);
            self.apply_binding();
            return;
        }
        self.syncing = true;
        append_block(&mut self.body.html, &snippet.html_fragment);
        append_block(&mut self.body.text, &snippet.text_marker);
        self.syncing = false;
    }

    /// Remove an inline image from the registry. Any `cid:` reference
    /// already inserted into the body stays there. No-op for unknown ids.
    pub fn remove_inline_image(&mut self, id: &str) {
        self.images.remove(id);
    }

    /// Attach a regular file; returns the generated attachment id.
    pub fn add_attachment(&mut self, filename: &str, mime_type: &str, payload: Vec<u8>) -> String {
        let id = generate_token("att");
        self.attachments.push(Attachment {
            id: id.clone(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: payload.len() as u64,
            payload,
        });
        id
    }

    /// Remove an attachment by id. No-op for unknown ids.
    pub fn remove_attachment(&mut self, id: &str) {
        self.attachments.retain(|a| a.id != id);
    }

    // ── Send ──────────────────────────────────────────────────

    /// Validate and assemble the outgoing payload, marking the session as
    /// sending. Fails with `Validation` (empty/overlong recipient or
    /// subject) or `SendInProgress` without touching any state.
    pub fn begin_send(&mut self) -> Result<SendPayload> {
        if self.sending {
            return Err(ComposeError::SendInProgress);
        }

        // Limits are character counts, matching the backend's field
        // constraints; byte length would under-count multibyte subjects.
        let to = self.to.trim();
        if to.is_empty() {
            return Err(ComposeError::validation("to", "is required"));
        }
        if to.chars().count() > self.config.send.max_recipient_len {
            return Err(ComposeError::validation("to", "is too long"));
        }
        let subject = self.body.subject.trim();
        if subject.is_empty() {
            return Err(ComposeError::validation("subject", "is required"));
        }
        if subject.chars().count() > self.config.send.max_subject_len {
            return Err(ComposeError::validation("subject", "is too long"));
        }

        let mut attachments = Vec::with_capacity(self.attachments.len() + self.images.len());
        for a in &self.attachments {
            attachments.push(AttachmentPayload {
                filename: a.filename.clone(),
                mime_type: a.mime_type.clone(),
                size_bytes: a.size_bytes,
                disposition: Disposition::Attachment,
                content_id: None,
                payload: a.payload.clone(),
            });
        }
        for img in self.images.images() {
            attachments.push(AttachmentPayload {
                filename: img.filename.clone(),
                mime_type: img.mime_type.clone(),
                size_bytes: img.size_bytes,
                disposition: Disposition::Inline,
                content_id: Some(img.content_id.clone()),
                payload: img.payload.clone(),
            });
        }

        self.sending = true;
        Ok(SendPayload {
            to: to.to_string(),
            subject: subject.to_string(),
            body_text: self.body.text.clone(),
            body_html: self.body.html.clone(),
            attachments,
        })
    }

    /// Conclude the send started by `begin_send`. Success performs the
    /// implicit reset; failure only clears the in-flight flag so the user
    /// can correct and resend.
    pub fn finish_send(&mut self, success: bool) {
        self.sending = false;
        if success {
            self.reset();
        }
    }

    /// Validate, submit through the gateway, and settle the outcome.
    /// No gateway call is made when validation fails.
    pub fn send(&mut self, gateway: &dyn SendGateway) -> Result<()> {
        let payload = self.begin_send()?;
        let result = gateway.send(&payload);
        match &result {
            Ok(()) => {
                tracing::info!(to = %payload.to, "Message sent");
                self.finish_send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Send failed, state preserved for retry");
                self.finish_send(false);
            }
        }
        result
    }

    /// Discard everything: template binding, body fields, recipient,
    /// attachments, and inline images. Back to `Manual` with empty fields.
    pub fn reset(&mut self) {
        self.load_epoch += 1;
        self.binding = None;
        self.to.clear();
        self.body = BodyState::default();
        self.images.clear();
        self.attachments.clear();
        self.sending = false;
        tracing::debug!("Session reset");
    }
}

/// Append `fragment` to `target` on a new line (no leading newline when
/// the target is empty).
fn append_block(target: &mut String, fragment: &str) {
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(fragment);
}
