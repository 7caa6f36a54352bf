use pancli::client::{ApiError, PanApiClient, PanApiConfig};
use pancli::sign::Signer;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-bduss";

/// Client configuration pointing both endpoint families at the mock
/// server, with the retry delay zeroed out so retry tests run instantly.
fn test_config(server: &MockServer) -> PanApiConfig {
    let base = Url::parse(&server.uri()).unwrap();
    PanApiConfig {
        xpan_base_url: base.clone(),
        pcs_base_url: base,
        user_agent: "test-agent".to_string(),
        retry_delay: Duration::from_millis(0),
        signer: Signer::PathSigned,
    }
}

fn listing_body() -> serde_json::Value {
    json!({
        "errno": 0,
        "list": [
            {"path": "/apps/demo/zz-first.bin", "server_filename": "zz-first.bin", "isdir": 0, "fs_id": 101},
            {"path": "/apps/demo/sub", "server_filename": "sub", "isdir": 1, "fs_id": 102},
            {"path": "/apps/demo/aa-last.bin", "server_filename": "aa-last.bin", "isdir": 0, "fs_id": 103},
        ]
    })
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn get_user_info_returns_the_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nas"))
        .and(query_param("method", "uinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": 0,
            "uk": 12345,
            "baidu_name": "demo-user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let user = client.get_user_info(TOKEN).await.unwrap();
    assert_eq!(user.id, 12345);
    assert_eq!(user.name, "demo-user");
}

#[tokio::test]
async fn get_user_info_surfaces_vendor_error_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": -6,
            "errmsg": "invalid bduss"
        })))
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client.get_user_info(TOKEN).await.unwrap_err();
    assert!(matches!(
        error,
        ApiError::RemoteApiError { code: -6, .. }
    ));
}

#[tokio::test]
async fn get_user_info_reports_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": 0,
            "uk": 12345
        })))
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client.get_user_info(TOKEN).await.unwrap_err();
    assert!(matches!(
        error,
        ApiError::ResponseShapeError {
            field: "baidu_name"
        }
    ));
}

#[tokio::test]
async fn list_directory_preserves_server_order() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let entries = client.list_directory(TOKEN, "/apps/demo").await.unwrap();

    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/apps/demo/zz-first.bin",
            "/apps/demo/sub",
            "/apps/demo/aa-last.bin"
        ]
    );
}

#[tokio::test]
async fn list_directory_without_list_field_is_a_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errno": 0})))
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client.list_directory(TOKEN, "/apps/demo").await.unwrap_err();
    assert!(matches!(
        error,
        ApiError::ResponseShapeError { field: "list" }
    ));
}

#[tokio::test]
async fn find_entry_matches_by_exact_path() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let entry = client
        .find_entry(TOKEN, "/apps/demo/aa-last.bin")
        .await
        .unwrap();
    assert_eq!(entry.fs_id, 103);
}

#[tokio::test]
async fn find_entry_falls_back_to_filename_match() {
    let server = MockServer::start().await;
    // The server reports the entry under a different parent path, so
    // only the filename comparison can match.
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": 0,
            "list": [
                {"path": "/apps/elsewhere/target.bin", "server_filename": "target.bin", "isdir": 0, "fs_id": 200}
            ]
        })))
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let entry = client
        .find_entry(TOKEN, "/apps/demo/target.bin")
        .await
        .unwrap();
    assert_eq!(entry.fs_id, 200);
}

#[tokio::test]
async fn find_entry_without_match_fails_with_not_found() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client
        .find_entry(TOKEN, "/apps/demo/missing.bin")
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::NotFound(_)));
}

#[tokio::test]
async fn find_fs_ids_collects_every_match() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let fs_ids = client
        .find_fs_ids(TOKEN, "/apps/demo/zz-first.bin")
        .await
        .unwrap();
    assert_eq!(fs_ids, vec![101]);
}

#[tokio::test]
async fn locate_succeeds_on_the_second_attempt_after_a_500() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    // First locate attempt answers 500, the second one succeeds; the
    // resolver must make exactly two HTTP calls.
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": 0,
            "urls": [
                {"url": "https://mirror-a.example.com/f"},
                {"url": "https://mirror-b.example.com/f"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let location = client
        .resolve_download_location(TOKEN, "/apps/demo/zz-first.bin", 12345)
        .await
        .unwrap();

    assert_eq!(location.preferred(), Some("https://mirror-b.example.com/f"));
}

#[tokio::test]
async fn locate_gives_up_after_three_500s() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client
        .resolve_download_location(TOKEN, "/apps/demo/zz-first.bin", 12345)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::RetriesExhausted(3)));
}

#[tokio::test]
async fn locate_aborts_immediately_on_verification_demand() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errno": 9019})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client
        .resolve_download_location(TOKEN, "/apps/demo/zz-first.bin", 12345)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::VerificationRequired));
}

#[tokio::test]
async fn locate_fails_fast_on_other_statuses() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client
        .resolve_download_location(TOKEN, "/apps/demo/zz-first.bin", 12345)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ApiError::RemoteError(status) if status == 403
    ));
}

#[tokio::test]
async fn locate_by_fs_ids_returns_candidates_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("method", "locatedownload"))
        .and(query_param("ver", "2.1"))
        .and(query_param("fs_ids", "[101]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errno": 0,
            "dlink": [
                "https://mirror-a.example.com/f",
                "https://mirror-b.example.com/f"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let location = client
        .resolve_download_location_by_fs_ids(TOKEN, &[101])
        .await
        .unwrap();

    assert_eq!(
        location.urls(),
        [
            "https://mirror-a.example.com/f".to_string(),
            "https://mirror-b.example.com/f".to_string()
        ]
    );
}

#[tokio::test]
async fn locate_by_fs_ids_without_dlink_is_a_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errno": 0})))
        .mount(&server)
        .await;

    let client = PanApiClient::new(test_config(&server)).unwrap();
    let error = client
        .resolve_download_location_by_fs_ids(TOKEN, &[101])
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ApiError::ResponseShapeError { field: "dlink" }
    ));
}
