//! Chat history store tests.

mod common;

use common::{MockBackend, Script, login, session, surface_with_history};
use parley_client::{Error, TurnEvent};
use types::{Message, TurnState};

fn seed(backend: &MockBackend) {
    let mut state = backend.state();
    state.chats = vec![
        session("old", "Old chat", 1_000),
        session("new", "New chat", 3_000),
        session("tie-a", "Tie A", 2_000),
        session("tie-b", "Tie B", 2_000),
    ];
    state.messages.insert(
        "old".into(),
        vec![
            Message::at(types::Role::Human, "hello", 1_000),
            Message::at(types::Role::Ai, "hi!", 1_500),
        ],
    );
}

fn ids(sessions: &[types::ChatSession]) -> Vec<&str> {
    sessions.iter().map(|s| s.chat_id.as_str()).collect()
}

#[tokio::test]
async fn guests_have_no_history() {
    let backend = MockBackend::default();
    seed(&backend);
    let (_, _, mut store) = surface_with_history(&backend).await;

    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(backend.state().list_calls, 0);

    let (_, mut client, mut store) = surface_with_history(&backend).await;
    assert!(matches!(
        store.hydrate("old", &mut client).await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        store.rename("old", "x").await,
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn list_is_newest_first_and_stable() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, _, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();

    let sessions = store.list().await.unwrap();
    assert_eq!(ids(sessions), ["new", "tie-a", "tie-b", "old"]);
}

#[tokio::test]
async fn hydrate_replaces_the_conversation() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, mut client, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();

    backend.script(Script::Stream {
        header: None,
        pieces: vec![Ok(common::body(&[common::START]))],
        hang: true,
    });
    client.send("something else").await.unwrap();
    assert!(matches!(
        client.next_event().await,
        Some(TurnEvent::Started { .. })
    ));

    store.hydrate("old", &mut client).await.unwrap();
    assert_eq!(client.state(), &TurnState::Idle);
    assert_eq!(client.chat_id(), Some("old"));
    let contents: Vec<_> = client.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hello", "hi!"]);
    assert_eq!(client.next_event().await, None);

    client.send("and another thing").await.unwrap();
    assert_eq!(backend.last_request().chat_id.as_deref(), Some("old"));
}

#[tokio::test]
async fn failed_hydrate_keeps_conversation() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, mut client, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    client.send("keep me").await.unwrap();
    client.complete(|_| {}).await;

    let err = store.hydrate("missing", &mut client).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(client.state(), &TurnState::Idle);
    assert_eq!(client.chat_id(), Some("c1"));
    assert_eq!(client.messages().len(), 2);
}

#[tokio::test]
async fn rename_updates_and_rolls_back() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, _, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    store.list().await.unwrap();

    store.rename("old", "Renamed").await.unwrap();
    assert_eq!(store.sessions()[3].title, "Renamed");
    assert_eq!(
        backend.state().renamed,
        [("old".to_owned(), "Renamed".to_owned())]
    );

    backend.state().fail_rename = true;
    let err = store.rename("old", "Rejected").await.unwrap_err();
    assert!(matches!(err, Error::History(_)));
    assert_eq!(store.sessions()[3].title, "Renamed");

    assert!(matches!(
        store.rename("nope", "x").await,
        Err(Error::UnknownChat(_))
    ));
}

#[tokio::test]
async fn delete_removes_and_rolls_back() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, mut client, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    store.list().await.unwrap();

    backend.state().fail_delete = true;
    let err = store.delete("tie-a", &mut client).await.unwrap_err();
    assert!(matches!(err, Error::History(_)));
    assert_eq!(ids(store.sessions()), ["new", "tie-a", "tie-b", "old"]);

    backend.state().fail_delete = false;
    store.delete("tie-a", &mut client).await.unwrap();
    assert_eq!(ids(store.sessions()), ["new", "tie-b", "old"]);
    assert_eq!(backend.state().deleted, ["tie-a"]);
}

#[tokio::test]
async fn deleting_the_open_conversation_resets_the_client() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, mut client, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    store.list().await.unwrap();
    store.hydrate("old", &mut client).await.unwrap();

    store.delete("old", &mut client).await.unwrap();
    assert_eq!(client.state(), &TurnState::Idle);
    assert_eq!(client.chat_id(), None);
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn logout_clears_the_list() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, _, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 4);

    identity.lock().await.release().await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn logout_hides_the_list_before_any_refetch() {
    let backend = MockBackend::default();
    seed(&backend);
    let (identity, _, mut store) = surface_with_history(&backend).await;
    identity.lock().await.authenticate(&login()).await.unwrap();
    store.list().await.unwrap();
    assert_eq!(store.sessions().len(), 4);

    identity.lock().await.release().await.unwrap();
    assert!(!identity.lock().await.is_authenticated());
    assert!(store.sessions().is_empty());
    assert_eq!(backend.state().list_calls, 1);
}
