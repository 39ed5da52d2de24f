//! `mailcompose` — compose-session core for a template-driven email composer.
//!
//! This crate provides the engine behind a message-composition front end:
//! `{{key}}` placeholder extraction and substitution, bidirectional
//! plain-text/HTML body synchronization, an inline-image registry keyed by
//! symbolic `cid:` content identifiers, and the compose-session state
//! machine that reconciles manual editing against template-bound editing.

pub mod bridge;
pub mod config;
pub mod error;
pub mod inline;
pub mod model;
pub mod placeholder;
pub mod session;
pub mod store;
