use tracing::debug;

use crate::error::{Error, Result};

/// Download `url` into memory. Non-success statuses are errors.
pub async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let resp = http.get(url).send().await.map_err(|source| Error::Request {
        url: url.to_string(),
        source,
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp.bytes().await.map_err(|source| Error::Body {
        url: url.to_string(),
        source,
    })?;
    debug!(url, bytes = body.len(), "fetched media");
    Ok(body.to_vec())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cat.png")
            .with_status(200)
            .with_body(b"\x89PNG\r\n\x1a\n")
            .create_async()
            .await;

        let url = format!("{}/cat.png", server.url());
        let bytes = fetch_bytes(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(bytes, b"\x89PNG\r\n\x1a\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let err = fetch_bytes(&reqwest::Client::new(), &url)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
        assert!(!err.is_body_error());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let err = fetch_bytes(&reqwest::Client::new(), "http://127.0.0.1:1/x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request { .. }));
    }
}
