//! Data model: templates, attachments, and compose body state.

pub mod attachment;
pub mod message;
pub mod template;
