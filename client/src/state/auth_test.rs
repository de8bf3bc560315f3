use super::*;

fn user(token: Option<&str>) -> CurrentUser {
    CurrentUser {
        username: "alice".to_owned(),
        player_id: Some("p-1".to_owned()),
        token: token.map(str::to_owned),
    }
}

#[test]
fn bearer_returns_non_empty_token() {
    assert_eq!(user(Some("abc")).bearer(), Some("abc"));
}

#[test]
fn bearer_ignores_empty_token() {
    assert_eq!(user(Some("")).bearer(), None);
    assert_eq!(user(None).bearer(), None);
}

#[test]
fn static_session_yields_configured_user() {
    let session = StaticSession::new(user(Some("abc")));
    assert_eq!(session.current_user(), Some(user(Some("abc"))));
}

#[test]
fn anonymous_session_has_no_user() {
    assert!(StaticSession::anonymous().current_user().is_none());
    assert!(StaticSession::default().current_user().is_none());
}
