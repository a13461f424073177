//! Exercises `HttpFetcher` against a local wiremock server.

use hydropack_common::{ArtifactSpec, FetchError, FetchStage, Fetcher};
use hydropack_net::HttpFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_fetcher() -> HttpFetcher {
    HttpFetcher::new().unwrap().allow_http(true)
}

#[tokio::test]
async fn fetch_writes_body_to_destination() {
    let server = MockServer::start().await;
    let body = vec![7u8; 256 * 1024];
    Mock::given(method("GET"))
        .and(path("/minio"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("minio");
    let spec = ArtifactSpec::executable("minio", format!("{}/minio", server.uri()), &dest);

    let written = local_fetcher().fetch(&spec, &dest).await.unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!dir.path().join(".minio.download").exists());
}

#[tokio::test]
async fn not_found_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("mongodb.tgz");
    let spec = ArtifactSpec::download_only("mongodb", format!("{}/mongodb.tgz", server.uri()), &dest);

    let err = local_fetcher().fetch(&spec, &dest).await.unwrap_err();

    assert_eq!(err.stage(), FetchStage::Download);
    assert_eq!(err.artifact(), "mongodb");
    assert!(err.to_string().contains("404"));
    assert!(!dest.exists());
    assert!(!dir.path().join(".mongodb.tgz.download").exists());
}

#[tokio::test]
async fn server_error_is_a_download_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("sandbox");
    let spec = ArtifactSpec::executable("sandbox", format!("{}/sandbox", server.uri()), &dest);

    let err = local_fetcher().fetch(&spec, &dest).await.unwrap_err();
    assert!(matches!(err, FetchError::DownloadFailed { .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn plain_http_is_refused_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("node.tar.xz");
    let spec = ArtifactSpec::download_only("node", format!("{}/node.tar.xz", server.uri()), &dest);

    let err = HttpFetcher::new().unwrap().fetch(&spec, &dest).await.unwrap_err();
    assert!(err.to_string().contains("Must be https"));
    assert!(!dest.exists());
}

#[tokio::test]
async fn unreachable_host_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("minio");
    let spec = ArtifactSpec::executable("minio", "http://127.0.0.1:1/minio", &dest);

    let err = local_fetcher().fetch(&spec, &dest).await.unwrap_err();
    assert_eq!(err.stage(), FetchStage::Download);
    assert!(!dest.exists());
}
