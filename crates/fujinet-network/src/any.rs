//! Runtime selection of the HTTP client.

use crate::{
    client::{HttpClient, HttpRequest, HttpResponse},
    error::Result,
    mock::MockHttpClient,
    reqwest_client::ReqwestHttpClient,
};

/// Either HTTP client behind one concrete type.
///
/// [`HttpClient`] is not object-safe, so callers that pick the client at
/// runtime hold this enum instead of a trait object.
#[derive(Debug, Clone)]
pub enum AnyHttpClient {
    Reqwest(ReqwestHttpClient),
    Mock(MockHttpClient),
}

impl From<ReqwestHttpClient> for AnyHttpClient {
    fn from(client: ReqwestHttpClient) -> Self {
        AnyHttpClient::Reqwest(client)
    }
}

impl From<MockHttpClient> for AnyHttpClient {
    fn from(client: MockHttpClient) -> Self {
        AnyHttpClient::Mock(client)
    }
}

impl HttpClient for AnyHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self {
            AnyHttpClient::Reqwest(client) => client.execute(request).await,
            AnyHttpClient::Mock(client) => client.execute(request).await,
        }
    }

    async fn probe(&self, url: &str) -> Result<()> {
        match self {
            AnyHttpClient::Reqwest(client) => client.probe(url).await,
            AnyHttpClient::Mock(client) => client.probe(url).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            AnyHttpClient::Reqwest(client) => client.name(),
            AnyHttpClient::Mock(client) => client.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[tokio::test]
    async fn test_dispatch_to_mock() {
        let mock = MockHttpClient::new();
        mock.fail_probe(ClientError::ConnectionRefused("down".into()));
        let client = AnyHttpClient::from(mock.clone());

        assert_eq!(client.name(), "mock");
        assert!(client.probe("http://x/").await.is_err());
        assert_eq!(mock.requests().len(), 1);
    }
}
