use anyhow::Result;
use attempt_etl::config::ApiConfig;
use attempt_etl::core::AttemptSource;
use attempt_etl::{EtlError, HttpFetcher};
use httpmock::prelude::*;

fn api_config(api_url: String) -> ApiConfig {
    ApiConfig {
        api_url,
        client: "skillfactory".to_string(),
        client_key: "very-secret-key".to_string(),
        start_date: "2023-04-01".to_string(),
        end_date: "2023-04-30".to_string(),
        timeout_seconds: Some(5),
    }
}

#[tokio::test]
async fn test_fetch_sends_query_parameters() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/attempts")
            .query_param("client", "skillfactory")
            .query_param("client_key", "very-secret-key")
            .query_param("start", "2023-04-01")
            .query_param("end", "2023-04-30");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([{"lti_user_id": "u1"}]));
    });

    let fetcher = HttpFetcher::new(api_config(server.url("/api/attempts")))?;
    let data = fetcher.fetch().await?;

    api_mock.assert();
    assert_eq!(data, serde_json::json!([{"lti_user_id": "u1"}]));
    Ok(())
}

#[tokio::test]
async fn test_fetch_returns_non_array_json_unchanged() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/attempts");
        then.status(200).json_body(serde_json::json!({"detail": "no data"}));
    });

    let fetcher = HttpFetcher::new(api_config(server.url("/api/attempts")))?;
    let data = fetcher.fetch().await?;

    assert_eq!(data["detail"], "no data");
    Ok(())
}

#[tokio::test]
async fn test_fetch_client_error_is_http_error() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/attempts");
        then.status(403).body("forbidden");
    });

    let fetcher = HttpFetcher::new(api_config(server.url("/api/attempts")))?;
    let err = fetcher.fetch().await.unwrap_err();

    api_mock.assert();
    match err {
        EtlError::HttpError { status, url } => {
            assert_eq!(status, 403);
            assert!(!url.contains("very-secret-key"));
        }
        other => panic!("expected HttpError, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_fetch_server_error_is_http_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/attempts");
        then.status(503);
    });

    let fetcher = HttpFetcher::new(api_config(server.url("/api/attempts")))?;
    assert!(matches!(
        fetcher.fetch().await,
        Err(EtlError::HttpError { status: 503, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_fetch_invalid_body_is_decode_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/attempts");
        then.status(200).body("<html>maintenance</html>");
    });

    let fetcher = HttpFetcher::new(api_config(server.url("/api/attempts")))?;
    assert!(matches!(
        fetcher.fetch().await,
        Err(EtlError::DecodeError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_transport_error() -> Result<()> {
    // Reserve a free port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };

    let fetcher = HttpFetcher::new(api_config(format!("http://127.0.0.1:{}/api/attempts", port)))?;
    let err = fetcher.fetch().await.unwrap_err();

    assert!(matches!(err, EtlError::TransportError { .. }));
    assert!(!err.to_string().contains("very-secret-key"));
    Ok(())
}
