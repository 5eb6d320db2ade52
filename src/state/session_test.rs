use super::*;

fn make_user(id: &str) -> SessionUser {
    SessionUser {
        id: id.to_owned(),
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        avatar_url: None,
        is_admin: false,
    }
}

#[test]
fn starts_signed_out_with_requested_theme() {
    let ctx = AppContext::new(Theme::Dark);
    assert!(!ctx.is_signed_in());
    assert_eq!(ctx.current_user(), None);
    assert_eq!(ctx.theme(), Theme::Dark);
}

#[test]
fn sign_in_overwrites_previous_user() {
    let ctx = AppContext::default();
    ctx.sign_in_success(make_user("u1"));
    ctx.sign_in_success(make_user("u2"));
    assert_eq!(ctx.current_user().map(|u| u.id), Some("u2".to_owned()));

    ctx.sign_out_success();
    assert!(!ctx.is_signed_in());
}

#[test]
fn clones_share_state() {
    let ctx = AppContext::default();
    let other = ctx.clone();
    other.sign_in_success(make_user("u1"));
    assert!(ctx.is_signed_in());
}

#[tokio::test]
async fn subscribers_observe_session_changes() {
    let ctx = AppContext::default();
    let mut rx = ctx.subscribe_user();

    ctx.sign_in_success(make_user("u1"));
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.id.clone()), Some("u1".to_owned()));

    ctx.sign_out_success();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_none());
}

#[tokio::test]
async fn toggle_theme_notifies_subscribers() {
    let ctx = AppContext::default();
    let mut rx = ctx.subscribe_theme();

    assert_eq!(ctx.toggle_theme(), Theme::Dark);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), Theme::Dark);

    assert_eq!(ctx.toggle_theme(), Theme::Light);
    ctx.set_theme(Theme::Dark);
    assert_eq!(ctx.theme(), Theme::Dark);
}
