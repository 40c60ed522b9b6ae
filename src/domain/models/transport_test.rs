use super::PromptEndpoint;
use super::RequestAuth;
use super::TransportError;
use crate::domain::models::Credential;

#[test]
fn it_routes_plain_prompts_to_chat() {
    assert_eq!(PromptEndpoint::route("hello"), PromptEndpoint::Chat);
    assert_eq!(PromptEndpoint::route(""), PromptEndpoint::Chat);
}

#[test]
fn it_routes_image_prompts() {
    assert_eq!(PromptEndpoint::route("/image a cat"), PromptEndpoint::Image);
    assert_eq!(PromptEndpoint::route("/IMAGE a cat"), PromptEndpoint::Image);
    assert_eq!(PromptEndpoint::route("/Image "), PromptEndpoint::Image);
}

#[test]
fn it_requires_the_trailing_space() {
    assert_eq!(PromptEndpoint::route("/image"), PromptEndpoint::Chat);
    assert_eq!(PromptEndpoint::route("/images of cats"), PromptEndpoint::Chat);
    assert_eq!(PromptEndpoint::route(" /image a cat"), PromptEndpoint::Chat);
}

#[test]
fn it_routes_multibyte_prompts_without_panicking() {
    assert_eq!(PromptEndpoint::route("/imagé cat"), PromptEndpoint::Chat);
    assert_eq!(PromptEndpoint::route("🐱🐱"), PromptEndpoint::Chat);
}

#[test]
fn it_maps_paths() {
    assert_eq!(PromptEndpoint::Chat.path(), "/");
    assert_eq!(PromptEndpoint::Image.path(), "/i");
}

#[test]
fn it_maps_auth_statuses() {
    assert!(TransportError::from_status(401, "".to_string()).is_unauthorized());
    assert!(TransportError::from_status(403, "".to_string()).is_unauthorized());
    assert!(!TransportError::from_status(500, "".to_string()).is_unauthorized());
}

#[test]
fn it_formats_errors() {
    let err = TransportError::from_status(501, "Image endpoint not implemented".to_string());
    insta::assert_snapshot!(err.to_string(), @"the backend responded with status 501: Image endpoint not implemented");
}

#[test]
fn it_hides_the_api_key_when_debugging() {
    let auth = RequestAuth::new(Credential::new("alice@example.com"), "m1");
    let debugged = format!("{auth:?}");
    assert!(!debugged.contains("alice"));
    assert!(debugged.contains("m1"));
    assert_eq!(auth.api_key(), "alice@example.com");
}
