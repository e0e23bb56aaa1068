use std::net::SocketAddr;

use stats_indexer::{metrics_consts::ROWS_UPSERTED, server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

// The recorder is process-global, so everything that touches it lives in
// this one test.
#[tokio::test]
async fn serves_liveness_and_metrics() {
    let router = server::router().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    let handle = tokio::spawn(server::serve(listener, router, async move {
        stop.cancelled().await
    }));

    let liveness = get(addr, "/_liveness").await;
    assert!(liveness.starts_with("HTTP/1.1 200"), "{liveness}");
    assert!(liveness.ends_with("fpl stats indexer"));

    metrics::counter!(ROWS_UPSERTED, "table" => "teams").increment(3);
    let scrape = get(addr, "/metrics").await;
    assert!(scrape.contains(r#"stats_indexer_rows_upserted{table="teams"} 3"#), "{scrape}");
    assert!(scrape.contains("http_requests_total"));

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}
