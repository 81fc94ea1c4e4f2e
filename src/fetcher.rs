use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;

/// Thin wrapper over one reqwest client. One attempt per call, no timeout.
#[derive(Default)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Self {
        Fetcher {
            client: reqwest::Client::new(),
        }
    }

    /// GET `url` and return the whole body as UTF-8 text.
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        info!("Fetching {}", url);
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url.clone()).send().await.map_err(transport)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Always UTF-8, whatever charset the Content-Type header claims.
        let bytes = response.bytes().await.map_err(transport)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(status = status.as_u16(), bytes = body.len(), "Fetched {}", url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>héllo</html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page.html", server.uri())).unwrap();
        let body = Fetcher::new().fetch(&url).await.unwrap();
        assert_eq!(body, "<html>héllo</html>");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.js", server.uri())).unwrap();
        match Fetcher::new().fetch(&url).await {
            Err(FetchError::Status { url: u, status }) => {
                assert_eq!(status, 404);
                assert!(u.ends_with("/missing.js"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_errors_fail_too() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = Fetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn body_is_decoded_as_utf8_regardless_of_charset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "m={sections:[{\"Écriture\":[1]}]}".as_bytes(),
                "text/javascript; charset=iso-8859-1",
            ))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/legacy/app.js", server.uri())).unwrap();
        let body = Fetcher::new().fetch(&url).await.unwrap();
        assert!(body.contains("\"Écriture\""));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/palette.html").unwrap();
        let err = Fetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
