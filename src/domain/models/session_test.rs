use super::Session;
use super::SessionState;

#[test]
fn it_reports_all_missing_fields() {
    let session = Session::default();
    assert_eq!(session.missing_fields(true), vec!["model", "target url"]);
    assert_eq!(session.missing_fields(false), vec!["model"]);
}

#[test]
fn it_treats_whitespace_as_missing() {
    let session = Session {
        model_id: " ".to_string(),
        target_url: "\n".to_string(),
        enabled: false,
    };
    assert_eq!(session.missing_fields(true), vec!["model", "target url"]);
}

#[test]
fn it_reports_nothing_missing() {
    let session = Session {
        model_id: "m1".to_string(),
        target_url: "https://example.com".to_string(),
        enabled: false,
    };
    assert!(session.missing_fields(true).is_empty());
}

#[test]
fn it_displays_states() {
    assert_eq!(
        SessionState::AwaitingCredential.to_string(),
        "awaiting-credential"
    );
    assert_eq!(SessionState::Busy.to_string(), "busy");
}
