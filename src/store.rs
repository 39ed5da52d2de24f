//! External collaborator contracts: template store and send gateway.
//!
//! Transport and persistence are the collaborator's concern; the session
//! only sees these narrow traits. The in-memory implementations back the
//! test suite and the CLI demo.

use std::cell::RefCell;

use crate::error::{ComposeError, Result};
use crate::model::message::SendPayload;
use crate::model::template::{PlaceholderSpec, TemplateDetail, TemplateSummary};
use crate::placeholder::extract_placeholders;

/// Read access to the reusable message templates.
pub trait TemplateStore {
    /// List all templates for the picker.
    fn list(&self) -> Result<Vec<TemplateSummary>>;
    /// Fetch the full raw bodies of one template.
    fn get(&self, id: i64) -> Result<TemplateDetail>;
    /// The template's declared placeholders, in display order.
    fn placeholders(&self, id: i64) -> Result<Vec<PlaceholderSpec>>;
}

/// Delivery of an assembled message.
pub trait SendGateway {
    /// Submit the payload. Failure must leave the caller free to retry.
    fn send(&self, payload: &SendPayload) -> Result<()>;
}

// ── In-memory implementations ───────────────────────────────────

/// Template store backed by a `Vec`, with placeholders derived from the
/// template bodies (the backend stores them explicitly; deriving them
/// keeps fixtures short).
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: Vec<(TemplateSummary, TemplateDetail)>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template; returns its id.
    pub fn insert(
        &mut self,
        name: &str,
        subject_template: &str,
        body_text_template: &str,
        body_html_template: &str,
    ) -> i64 {
        let id = self.templates.len() as i64 + 1;
        self.templates.push((
            TemplateSummary {
                id,
                name: name.to_string(),
                subject_template: subject_template.to_string(),
            },
            TemplateDetail {
                id,
                subject_template: subject_template.to_string(),
                body_text_template: body_text_template.to_string(),
                body_html_template: body_html_template.to_string(),
            },
        ));
        id
    }

    fn detail(&self, id: i64) -> Result<&TemplateDetail> {
        self.templates
            .iter()
            .find(|(s, _)| s.id == id)
            .map(|(_, d)| d)
            .ok_or(ComposeError::TemplateNotFound(id))
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list(&self) -> Result<Vec<TemplateSummary>> {
        Ok(self.templates.iter().map(|(s, _)| s.clone()).collect())
    }

    fn get(&self, id: i64) -> Result<TemplateDetail> {
        self.detail(id).cloned()
    }

    fn placeholders(&self, id: i64) -> Result<Vec<PlaceholderSpec>> {
        let detail = self.detail(id)?;
        let combined = format!(
            "{}\n{}\n{}",
            detail.subject_template, detail.body_text_template, detail.body_html_template
        );
        Ok(extract_placeholders(&combined)
            .into_iter()
            .map(|key| {
                let label = key.replace('_', " ");
                PlaceholderSpec::new(key, label)
            })
            .collect())
    }
}

/// Send gateway that records every payload, optionally failing on demand.
#[derive(Debug, Default)]
pub struct MemorySendGateway {
    sent: RefCell<Vec<SendPayload>>,
    fail_next: RefCell<Option<String>>,
}

impl MemorySendGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `send` fail with a `Transport` error.
    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.borrow_mut() = Some(reason.to_string());
    }

    /// Payloads accepted so far.
    pub fn sent(&self) -> Vec<SendPayload> {
        self.sent.borrow().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl SendGateway for MemorySendGateway {
    fn send(&self, payload: &SendPayload) -> Result<()> {
        if let Some(reason) = self.fail_next.borrow_mut().take() {
            tracing::warn!(%reason, "Send rejected by gateway");
            return Err(ComposeError::Transport(reason));
        }
        tracing::info!(to = %payload.to, subject = %payload.subject, "Payload accepted");
        self.sent.borrow_mut().push(payload.clone());
        Ok(())
    }
}
