//! A service that accepts but never answers must not wedge the session

use pixlab_core::{EditorConfig, EditorSession, Level};
use pixlab_remote::{OperationId, Parameters};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::net::TcpListener;

/// Accept connections and hold them open without replying
async fn silent_service() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn timed_out_apply_leaves_session_unchanged() {
    let config = EditorConfig::default()
        .with_backend_url(silent_service().await)
        .with_request_timeout(1);
    let session = EditorSession::connect(config).unwrap();
    session.load("slow.png", b"SLOW".to_vec()).unwrap();
    let current = session.current().unwrap();

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        session.apply(OperationId::Grayscale, &Parameters::new()),
    )
    .await
    .expect("request timeout should fire first")
    .unwrap_err();

    assert!(err.is_remote(), "{err}");
    assert_eq!(err.label(), Some("Grayscale"));
    let view = session.view();
    assert_eq!(view.labels, vec!["Original"]);
    assert_eq!(view.active, Some(0));
    assert!(!view.busy);
    assert_eq!(session.current().unwrap(), current);

    let last = session.drain_notifications().pop().unwrap();
    assert_eq!(last.level, Level::Error);
    assert_eq!(last.message, "Error applying Grayscale");

    // The busy flag was released, so the next call is accepted
    session.undo().unwrap_err();
    assert!(!session
        .drain_notifications()
        .iter()
        .any(|n| n.message.contains("wait for the current operation")));
}
