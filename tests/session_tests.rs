//! Integration tests for the compose session, driven through the
//! in-memory template store and send gateway.

use std::collections::HashMap;

use mailcompose::bridge::{html_to_text, text_to_html, TagStripper};
use mailcompose::error::ComposeError;
use mailcompose::placeholder::{apply_placeholders, extract_placeholders};
use mailcompose::session::{ClipboardItem, ComposeSession};
use mailcompose::store::{MemorySendGateway, MemoryTemplateStore, TemplateStore};

fn seeded_store() -> (MemoryTemplateStore, i64) {
    let mut store = MemoryTemplateStore::new();
    let id = store.insert(
        "Follow up",
        "Following up, {{name}}",
        "Hi {{name}},\n\nJust checking in about {{topic}}.",
        "<p>Hi {{name}},</p><p><br/></p><p>Just checking in about {{topic}}.</p>",
    );
    (store, id)
}

fn png_item(data: Vec<u8>) -> ClipboardItem {
    ClipboardItem {
        mime_type: "image/png".to_string(),
        data,
        filename: None,
    }
}

// ─── 1. extract: distinct keys, first-occurrence order ──────────────

#[test]
fn test_extract_dedups_in_first_occurrence_order() {
    let keys = extract_placeholders("{{z}} {{a}} {{z}} {{m}} {{a}} {{z}}");
    assert_eq!(keys, vec!["z", "a", "m"]);
}

// ─── 2. substitute with empty values is identity ────────────────────

#[test]
fn test_substitute_empty_values_is_identity() {
    let t = "Dear {{name}}, your order {{order_id}} shipped.";
    assert_eq!(apply_placeholders(t, &HashMap::new()), t);
}

// ─── 3. substitute is a single pass ─────────────────────────────────

#[test]
fn test_substitute_is_single_pass() {
    let mut values = HashMap::new();
    values.insert("a".to_string(), "{{b}}".to_string());
    values.insert("b".to_string(), "never".to_string());
    assert_eq!(apply_placeholders("{{a}}", &values), "{{b}}");
}

// ─── 4. empty conversions ───────────────────────────────────────────

#[test]
fn test_empty_conversions() {
    assert_eq!(text_to_html(""), "");
    assert_eq!(html_to_text(&TagStripper, ""), "");
}

// ─── 5. blank line becomes a <br/> paragraph ────────────────────────

#[test]
fn test_blank_line_paragraph() {
    let html = text_to_html("line1\n\nline2");
    assert_eq!(html, "<p>line1</p><p><br/></p><p>line2</p>");
}

// ─── 6. round trip preserves non-blank line structure ───────────────

#[test]
fn test_round_trip_line_structure() {
    for t in [
        "one line",
        "first\nsecond\nthird",
        "para one\n\npara two",
        "a\n\n\nb",
    ] {
        let round = html_to_text(&TagStripper, &text_to_html(t));
        let expected: Vec<&str> = t
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let got: Vec<&str> = round
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(expected, got, "line structure lost for {t:?}");
    }
}

// ─── 7. bind then clear keeps the substituted text ──────────────────

#[test]
fn test_bind_then_clear_keeps_visible_text() {
    let (store, id) = seeded_store();
    let mut session = ComposeSession::new();
    session.select_template(&store, id).expect("bind");
    session.edit_placeholder_value("name", "Ada");
    session.edit_placeholder_value("topic", "the launch");

    session.clear_template();

    assert!(!session.is_template_bound());
    assert_eq!(session.body().subject, "Following up, Ada");
    assert!(session.body().text.contains("the launch"));
    assert!(!session.body().text.is_empty());
}

// ─── 8. inline image references are decoupled from the registry ─────

#[test]
fn test_inline_reference_survives_image_removal() {
    let mut session = ComposeSession::new();
    session.paste_clipboard(&[ClipboardItem {
        mime_type: "image/png".to_string(),
        data: vec![1, 2, 3],
        filename: Some("logo.png".to_string()),
    }]);

    let img = session.images()[0].clone();
    assert!(session.body().html.contains(&format!("cid:{}", img.content_id)));
    assert!(session.body().text.contains("[image: logo.png]"));

    session.remove_inline_image(&img.id);
    assert!(session.images().is_empty());
    // Body edits and registry edits are decoupled once inserted.
    assert!(session.body().html.contains(&format!("cid:{}", img.content_id)));
}

// ─── 9. empty recipient: ValidationError, no network call ───────────

#[test]
fn test_send_empty_recipient_no_gateway_call() {
    let gateway = MemorySendGateway::new();
    let mut session = ComposeSession::new();
    session.edit_subject("Hello");

    let err = session.send(&gateway).expect_err("must fail validation");
    assert!(matches!(err, ComposeError::Validation { .. }));
    assert_eq!(gateway.sent_count(), 0);
    // State untouched, still editable.
    assert_eq!(session.body().subject, "Hello");
    assert!(!session.is_sending());
}

// ─── 10. superseded template load does not overwrite ────────────────

#[test]
fn test_superseded_template_load_discarded() {
    let mut store = MemoryTemplateStore::new();
    let slow = store.insert("Slow", "Slow {{x}}", "slow body", "<p>slow body</p>");
    let fast = store.insert("Fast", "Fast subject", "fast body", "<p>fast body</p>");

    let mut session = ComposeSession::new();

    // The slow load starts first but its response arrives last.
    let slow_ticket = session.begin_template_load(slow);
    session.select_template(&store, fast).expect("bind fast");

    let slow_detail = store.get(slow).expect("get slow");
    let slow_placeholders = store.placeholders(slow).expect("placeholders");
    let applied = session.apply_template_load(slow_ticket, slow_detail, slow_placeholders);

    assert!(!applied);
    assert_eq!(session.binding().map(|b| b.template_id), Some(fast));
    assert_eq!(session.body().subject, "Fast subject");
}

// ─── Send success resets; failure preserves state ───────────────────

#[test]
fn test_send_success_resets_session() {
    let gateway = MemorySendGateway::new();
    let mut session = ComposeSession::new();
    session.edit_to("someone@example.com");
    session.edit_subject("Hello");
    session.edit_text("Body text");
    session.paste_clipboard(&[png_item(vec![9, 9])]);

    session.send(&gateway).expect("send ok");

    assert_eq!(gateway.sent_count(), 1);
    let payload = &gateway.sent()[0];
    assert_eq!(payload.to, "someone@example.com");
    assert_eq!(payload.attachments.len(), 1);
    // Implicit reset back to Manual with empty fields.
    assert!(session.to().is_empty());
    assert!(session.body().text.is_empty());
    assert!(session.images().is_empty());
}

#[test]
fn test_send_failure_preserves_state_for_retry() {
    let gateway = MemorySendGateway::new();
    gateway.fail_next("backend unavailable");

    let mut session = ComposeSession::new();
    session.edit_to("someone@example.com");
    session.edit_subject("Hello");
    session.edit_text("Body text");

    let err = session.send(&gateway).expect_err("transport failure");
    assert!(matches!(err, ComposeError::Transport(_)));

    // Everything still in place; the retry succeeds.
    assert_eq!(session.body().text, "Body text");
    assert!(!session.is_sending());
    session.send(&gateway).expect("retry ok");
    assert_eq!(gateway.sent_count(), 1);
}

// ─── Full compose flow ──────────────────────────────────────────────

#[test]
fn test_full_template_compose_flow() {
    let (store, id) = seeded_store();
    let gateway = MemorySendGateway::new();
    let mut session = ComposeSession::new();

    // Pick the template from the listing, as the UI would.
    let listing = store.list().expect("list");
    assert_eq!(listing[0].name, "Follow up");
    session.select_template(&store, listing[0].id).expect("bind");
    assert_eq!(id, listing[0].id);

    // Fill placeholders and paste a screenshot.
    session.edit_placeholder_value("name", "Grace");
    session.edit_placeholder_value("topic", "the demo");
    session.paste_clipboard(&[png_item(vec![0xFF, 0xD8])]);
    session.edit_to("grace@example.com");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.subject, "Following up, Grace");
    assert_eq!(snapshot.inline_image_count, 1);
    assert_eq!(snapshot.template_id, Some(id));

    // Preview resolves cid: references; the payload keeps them symbolic.
    assert!(session.preview_html().contains("data:image/png;base64,"));

    session.send(&gateway).expect("send");
    let payload = &gateway.sent()[0];
    assert!(payload.body_html.contains("cid:"));
    assert_eq!(payload.subject, "Following up, Grace");
    assert!(payload.body_text.contains("the demo"));
}
