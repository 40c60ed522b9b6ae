use anyhow::bail;
use anyhow::Result;

use super::RequestDispatcher;
use crate::domain::models::ChatError;
use crate::domain::models::Credential;
use crate::domain::models::Message;
use crate::domain::models::MessageLog;
use crate::domain::models::PromptEndpoint;
use crate::domain::models::RequestAuth;
use crate::domain::models::Role;
use crate::domain::models::TransportError;
use crate::domain::services::fake_transport::FakeCall;
use crate::domain::services::fake_transport::FakeTransport;

fn auth() -> RequestAuth {
    return RequestAuth::new(Credential::new("alice@example.com"), "m1");
}

fn seed() -> Vec<Message> {
    return vec![
        Message::new(Role::System, "You are a helpful assistant"),
        Message::new(Role::Info, "Hello!"),
    ];
}

fn dispatcher(transport: &FakeTransport) -> RequestDispatcher {
    return RequestDispatcher::new(Box::new(transport.clone()));
}

#[tokio::test]
async fn it_replaces_the_log_on_fetch() -> Result<()> {
    let transport = FakeTransport::with_seed(seed());
    let mut log = MessageLog::new(vec![Message::user("stale")]);

    dispatcher(&transport).fetch_history(&auth(), &mut log).await?;

    assert_eq!(log.messages(), seed().as_slice());
    assert_eq!(
        transport.calls(),
        vec![FakeCall::FetchHistory {
            api_key: "alice@example.com".to_string(),
            model_id: "m1".to_string(),
        }]
    );

    return Ok(());
}

#[tokio::test]
async fn it_leaves_the_log_untouched_when_fetch_fails() -> Result<()> {
    let transport = FakeTransport::with_seed(seed());
    transport.fail_fetch(500);
    let mut log = MessageLog::new(vec![Message::user("kept")]);

    let err = dispatcher(&transport)
        .fetch_history(&auth(), &mut log)
        .await
        .unwrap_err();

    match err {
        ChatError::Fetch(TransportError::Status { status, .. }) => assert_eq!(status, 500),
        _ => bail!("Wrong error {err:?}"),
    }
    assert_eq!(log.messages(), &[Message::user("kept")]);

    return Ok(());
}

#[tokio::test]
async fn it_reports_fetch_timeouts() -> Result<()> {
    let transport = FakeTransport::default();
    transport.timeout_fetch();
    let mut log = MessageLog::default();

    let err = dispatcher(&transport)
        .fetch_history(&auth(), &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Fetch(TransportError::Timeout)));
    insta::assert_snapshot!(err.to_string(), @"failed to fetch chat history: the request timed out");

    return Ok(());
}

#[tokio::test]
async fn it_maps_rejected_keys_to_credential_errors() -> Result<()> {
    let transport = FakeTransport::default();
    let mut log = MessageLog::default();

    transport.fail_fetch(401);
    let err = dispatcher(&transport)
        .fetch_history(&auth(), &mut log)
        .await
        .unwrap_err();
    assert!(err.is_credential());

    transport.fail_send(403);
    let err = dispatcher(&transport)
        .send_message(&auth(), "hello", &mut log)
        .await
        .unwrap_err();
    assert!(err.is_credential());

    transport.fail_reset(401);
    let err = dispatcher(&transport)
        .reset_history(&auth(), &mut log)
        .await
        .unwrap_err();
    assert!(err.is_credential());

    return Ok(());
}

#[tokio::test]
async fn it_refetches_history_after_sending() -> Result<()> {
    let transport = FakeTransport::default();
    let mut log = MessageLog::default();
    log.append(Message::user("hello"));

    dispatcher(&transport)
        .send_message(&auth(), "hello", &mut log)
        .await?;

    assert_eq!(
        log.messages(),
        &[
            Message::user("hello"),
            Message::new(Role::Assistant, "hi!")
        ]
    );
    assert_eq!(
        transport.calls(),
        vec![
            FakeCall::SendPrompt {
                endpoint: PromptEndpoint::Chat,
                prompt: "hello".to_string(),
            },
            FakeCall::FetchHistory {
                api_key: "alice@example.com".to_string(),
                model_id: "m1".to_string(),
            },
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_routes_image_prompts() -> Result<()> {
    let transport = FakeTransport::default();
    let mut log = MessageLog::default();

    dispatcher(&transport)
        .send_message(&auth(), "/image a cat", &mut log)
        .await?;

    assert_eq!(
        transport.calls()[0],
        FakeCall::SendPrompt {
            endpoint: PromptEndpoint::Image,
            prompt: "/image a cat".to_string(),
        }
    );

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_echo_when_sending_fails() -> Result<()> {
    let transport = FakeTransport::default();
    transport.fail_send(500);
    let mut log = MessageLog::default();
    log.append(Message::user("hello"));

    let err = dispatcher(&transport)
        .send_message(&auth(), "hello", &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Send(_)));
    assert_eq!(log.messages(), &[Message::user("hello")]);
    assert_eq!(transport.calls().len(), 1);

    return Ok(());
}

#[tokio::test]
async fn it_reports_a_fetch_error_when_the_refresh_after_send_fails() -> Result<()> {
    let transport = FakeTransport::default();
    transport.fail_fetch(502);
    let mut log = MessageLog::default();
    log.append(Message::user("hello"));

    let err = dispatcher(&transport)
        .send_message(&auth(), "hello", &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Fetch(_)));
    assert_eq!(log.messages(), &[Message::user("hello")]);
    assert_eq!(transport.server_history().len(), 2);

    return Ok(());
}

#[tokio::test]
async fn it_replaces_the_log_on_reset() -> Result<()> {
    let transport = FakeTransport::with_seed(vec![]);
    let mut log = MessageLog::new(vec![
        Message::user("hello"),
        Message::new(Role::Assistant, "hi!"),
    ]);

    dispatcher(&transport)
        .reset_history(&auth(), &mut log)
        .await?;

    assert!(log.is_empty());
    assert_eq!(transport.calls(), vec![FakeCall::ResetHistory]);

    return Ok(());
}

#[tokio::test]
async fn it_leaves_the_log_untouched_when_reset_fails() -> Result<()> {
    let transport = FakeTransport::default();
    transport.fail_reset(500);
    let mut log = MessageLog::new(vec![Message::user("hello")]);

    let err = dispatcher(&transport)
        .reset_history(&auth(), &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Reset(_)));
    assert_eq!(log.messages(), &[Message::user("hello")]);

    return Ok(());
}

#[tokio::test]
async fn it_initialises_pages() -> Result<()> {
    let transport = FakeTransport::default();
    dispatcher(&transport)
        .init_page(&auth(), "https://example.com")
        .await?;
    assert_eq!(
        transport.calls(),
        vec![FakeCall::InitPage("https://example.com".to_string())]
    );

    transport.fail_init(500);
    let err = dispatcher(&transport)
        .init_page(&auth(), "https://example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Init(_)));

    return Ok(());
}
