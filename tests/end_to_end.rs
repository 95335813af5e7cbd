mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use portrait_stylizer::client::{ClientError, FailureOrigin, SessionController};
use portrait_stylizer::config::ClientConfig;
use portrait_stylizer::server;
use portrait_stylizer::service::StylizeTransform;

use common::*;

/// 在独立线程的运行时上启动服务，返回实际监听地址。
fn spawn_server(staging: &std::path::Path, transform: Arc<dyn StylizeTransform>) -> SocketAddr {
    let service = service_in(staging, transform);
    let (addr_tx, addr_rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("server runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
            addr_tx.send(listener.local_addr().expect("addr")).expect("send addr");
            let _ = server::serve(listener, service).await;
        });
    });

    addr_rx.recv().expect("server address")
}

fn client_for(addr: SocketAddr) -> SessionController {
    let config = ClientConfig {
        service_url: format!("http://{addr}"),
        ..ClientConfig::default()
    };
    SessionController::connect(&config).expect("controller")
}

#[test]
fn select_process_and_save_round_trip() {
    let staging = tempfile::tempdir().expect("staging");
    let workspace = tempfile::tempdir().expect("workspace");
    let addr = spawn_server(staging.path(), Arc::new(Identity));

    let input = workspace.path().join("portrait.jpg");
    std::fs::write(&input, jpeg_bytes(24, 16)).expect("write input");

    let mut session = client_for(addr);
    session.select(&input).expect("select");
    session.request_processing().expect("request");
    assert!(!session.can_request_processing());

    let outcome = session.wait_for_completion().expect("in flight");
    assert_eq!(outcome, Ok(()));
    assert!(session.can_request_processing());

    let result = session.last_result().expect("result").to_vec();
    let decoded = image::load_from_memory(&result).expect("png");
    assert_eq!((decoded.width(), decoded.height()), (24, 16));

    let output = workspace.path().join("portrait_stylized.png");
    session.save(&output).expect("save");
    assert_eq!(std::fs::read(&output).expect("read saved"), result);
    assert_eq!(staged_files(staging.path()), 0);
}

#[test]
fn server_side_failure_surfaces_status_and_message() {
    let staging = tempfile::tempdir().expect("staging");
    let workspace = tempfile::tempdir().expect("workspace");
    let addr = spawn_server(staging.path(), Arc::new(Failing));

    let input = workspace.path().join("portrait.png");
    std::fs::write(&input, png_bytes(8, 8)).expect("write input");

    let mut session = client_for(addr);
    session.select(&input).expect("select");
    session.request_processing().expect("request");

    let failure = session
        .wait_for_completion()
        .expect("in flight")
        .expect_err("server fails");
    assert_eq!(failure.origin, FailureOrigin::Http(500));
    assert!(failure.message.contains("500"));
    assert!(failure.message.contains("model weights missing"));
    assert!(session.last_result().is_none());
    assert!(matches!(session.save(workspace.path().join("out.png")), Err(ClientError::NoResult)));
}

#[test]
fn unreachable_service_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let workspace = tempfile::tempdir().expect("workspace");
    let input = workspace.path().join("portrait.png");
    std::fs::write(&input, png_bytes(8, 8)).expect("write input");

    let mut session = client_for(addr);
    session.select(&input).expect("select");
    session.request_processing().expect("request");

    let failure = session
        .wait_for_completion()
        .expect("in flight")
        .expect_err("no server");
    assert_eq!(failure.origin, FailureOrigin::Transport);
    assert!(failure.message.starts_with("发生异常："));
}

#[test]
fn polling_eventually_delivers_the_result() {
    let staging = tempfile::tempdir().expect("staging");
    let workspace = tempfile::tempdir().expect("workspace");
    let addr = spawn_server(staging.path(), Arc::new(Identity));

    let input = workspace.path().join("portrait.png");
    std::fs::write(&input, png_bytes(10, 10)).expect("write input");

    let mut session = client_for(addr);
    session.select(&input).expect("select");
    session.request_processing().expect("request");
    assert!(matches!(session.request_processing(), Err(ClientError::Busy)));

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(30);
    let outcome = loop {
        if let Some(outcome) = session.poll() {
            break outcome;
        }
        assert!(std::time::Instant::now() < deadline, "result never arrived");
        std::thread::sleep(std::time::Duration::from_millis(20));
    };

    assert_eq!(outcome, Ok(()));
    assert!(session.last_result().is_some());
}
