//! HTTP adapter for the content API.

use std::time::Duration;

use async_trait::async_trait;
use inkpost_api_types::{
    ApiErrorBody, Post, PostCreateRequest, UpdateAuthorRequest, UpdateAuthorResponse,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::application::content::{ContentApi, ContentError};

#[derive(Clone, Debug)]
pub struct HttpContentClient {
    client: Client,
    base: Url,
}

impl HttpContentClient {
    pub fn new(site: &str, timeout: Duration) -> Result<Self, ContentError> {
        let base = Url::parse(site)
            .and_then(|url| url.join("/"))
            .map_err(|err| ContentError::Transport(format!("invalid site URL `{site}`: {err}")))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| ContentError::Transport(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("inkpost-cli/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ContentError> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ContentError::Transport(format!("invalid path `{path}`: {err}")))?;
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ContentError> {
        let response = request
            .send()
            .await
            .map_err(|err| ContentError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ContentError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ApiErrorBody>(&bytes) {
                Ok(body) => match body.error.hint {
                    Some(hint) => format!("{} ({hint})", body.error.message),
                    None => body.error.message,
                },
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(ContentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ContentError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ContentApi for HttpContentClient {
    async fn create_post(&self, request: &PostCreateRequest) -> Result<Post, ContentError> {
        Self::send(self.request(Method::POST, "posts")?.json(request)).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ContentError> {
        Self::send(self.request(Method::GET, "posts")?).await
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, ContentError> {
        Self::send(self.request(Method::GET, &format!("posts/{id}"))?).await
    }

    async fn rename_author(&self, old_author: &str, new_author: &str) -> Result<u64, ContentError> {
        let body = UpdateAuthorRequest {
            old_author: Some(old_author.to_string()),
            new_author: new_author.to_string(),
        };
        let response: UpdateAuthorResponse =
            Self::send(self.request(Method::PUT, "posts/update-author")?.json(&body)).await?;
        Ok(response.updated_count)
    }
}
