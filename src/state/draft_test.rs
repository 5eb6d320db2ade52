use super::*;
use serde_json::json;

#[test]
fn new_draft_is_empty() {
    let draft = Draft::new();
    assert!(draft.is_empty());
    assert_eq!(draft.image(), None);
    assert_eq!(serde_json::to_value(&draft).unwrap(), json!({}));
}

#[test]
fn form_setters_build_flat_json() {
    let mut draft = Draft::new();
    draft.set_title("Hello");
    draft.set_category("reactjs");
    draft.set_content("<p>body</p>");
    assert!(draft.set("featured", true));

    assert_eq!(draft.len(), 4);
    assert_eq!(
        serde_json::to_value(&draft).unwrap(),
        json!({"title": "Hello", "category": "reactjs", "content": "<p>body</p>", "featured": true})
    );
}

#[test]
fn later_edits_replace_earlier_values() {
    let mut draft = Draft::new();
    draft.set_title("First");
    draft.set_title("Second");
    assert_eq!(draft.get_str(TITLE_FIELD), Some("Second"));
    assert_eq!(draft.len(), 1);
}

#[test]
fn generic_set_cannot_write_image() {
    let mut draft = Draft::new();
    assert!(!draft.set(IMAGE_FIELD, "https://evil.example/x.png"));
    assert_eq!(draft.image(), None);

    draft.set_image("https://cdn.example/a.png");
    assert_eq!(draft.image(), Some("https://cdn.example/a.png"));
    assert!(!draft.set(IMAGE_FIELD, "https://evil.example/x.png"));
    assert_eq!(draft.image(), Some("https://cdn.example/a.png"));
}

#[test]
fn remove_drops_field() {
    let mut draft = Draft::new();
    draft.set_content("x");
    assert_eq!(draft.remove(CONTENT_FIELD), Some(json!("x")));
    assert!(draft.is_empty());
}

#[test]
fn category_options_start_with_placeholder() {
    assert_eq!(CATEGORIES[0].0, "uncategorized");
    assert!(CATEGORIES.iter().any(|(value, _)| *value == "nextjs"));
}
