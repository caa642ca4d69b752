//! End-to-end tests for the document root and virtual hosts.

mod common;

use common::{config, send_raw, spawn_server};

#[tokio::test]
async fn serves_index_and_named_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();
    std::fs::write(dir.path().join("site.css"), "p{}").unwrap();
    let server = spawn_server(config(dir.path().to_path_buf(), &[])).await;

    let index = send_raw(server.addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(
        index,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\n\r\n<p>home</p>"
    );

    let css = send_raw(server.addr, b"get /site.css?v=2 HTTP/1.1\r\n\r\n").await;
    assert!(css.contains("Content-Type: text/css\r\n"), "{}", css);
    assert!(css.ends_with("p{}"));
}

#[tokio::test]
async fn virtual_host_serves_from_its_own_root() {
    let main_root = tempfile::tempdir().unwrap();
    let docs_root = tempfile::tempdir().unwrap();
    std::fs::create_dir(docs_root.path().join("guide")).unwrap();
    std::fs::write(docs_root.path().join("guide").join("index.html"), "guide").unwrap();
    std::fs::write(docs_root.path().join("index.html"), "docs home").unwrap();

    let mut config = config(main_root.path().to_path_buf(), &[]);
    config
        .virtual_hosts
        .insert("/docs".into(), docs_root.path().to_path_buf());
    let server = spawn_server(config).await;

    let guide = send_raw(server.addr, b"GET /docs/guide/ HTTP/1.1\r\n\r\n").await;
    assert!(guide.ends_with("\r\n\r\nguide"), "{}", guide);

    let home = send_raw(server.addr, b"GET /docs HTTP/1.1\r\n\r\n").await;
    assert!(home.ends_with("\r\n\r\ndocs home"), "{}", home);

    let missing = send_raw(server.addr, b"GET /docs/nope.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(missing, "HTTP/1.1 404 Not Found\r\n\r\n");
}

#[tokio::test]
async fn traversal_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let server = spawn_server(config(dir.path().to_path_buf(), &[])).await;

    let response = send_raw(server.addr, b"GET /../etc/passwd HTTP/1.1\r\n\r\n").await;
    assert_eq!(response, "HTTP/1.1 403 Forbidden\r\n\r\n");
}

#[tokio::test]
async fn error_closes_the_connection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "home").unwrap();
    let server = spawn_server(config(dir.path().to_path_buf(), &[])).await;

    let response = send_raw(
        server.addr,
        b"GET /missing HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n",
    )
    .await;
    assert_eq!(response, "HTTP/1.1 404 Not Found\r\n\r\n");
}
