//! REST client for the acquisition backend.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("bad response body: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Text for the status line.
    pub fn status_text(&self) -> String {
        match self {
            ApiError::Rejected(message) => format!("Error: {message}"),
            _ => "Connection error".to_string(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use client::ApiClient;

#[cfg(target_arch = "wasm32")]
mod client {
    use super::ApiError;
    use crate::config::DashboardConfig;
    use gloo_net::http::{Request, Response};
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use telemetry_feed::{
        ApiReply, ConnectionStatus, DataSnapshot, EmptyBody, FileList, RepModeRequest,
        StartSessionRequest,
    };

    fn http_err(e: gloo_net::Error) -> ApiError {
        ApiError::Http(e.to_string())
    }

    /// Thin wrapper over `gloo_net` bound to one API base.
    #[derive(Debug, Clone)]
    pub struct ApiClient {
        config: DashboardConfig,
    }

    impl ApiClient {
        pub fn new(config: DashboardConfig) -> Self {
            Self { config }
        }

        async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, ApiError> {
            let url = self.config.url(path);
            Request::post(&url)
                .json(body)
                .map_err(http_err)?
                .send()
                .await
                .map_err(http_err)
        }

        async fn get(&self, path: &str) -> Result<Response, ApiError> {
            let url = self.config.url(path);
            Request::get(&url).send().await.map_err(http_err)
        }

        /// Error replies still carry `{status, message}`, so the body is read first.
        async fn reply(resp: Response) -> Result<ApiReply, ApiError> {
            let status = resp.status();
            match resp.json::<ApiReply>().await {
                Ok(reply) => Ok(reply),
                Err(_) if !resp.ok() => Err(ApiError::Status(status)),
                Err(e) => Err(ApiError::Decode(e.to_string())),
            }
        }

        async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
            if !resp.ok() {
                return Err(ApiError::Status(resp.status()));
            }
            resp.json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        }

        fn accepted(reply: ApiReply) -> Result<ApiReply, ApiError> {
            if reply.is_success() {
                Ok(reply)
            } else {
                Err(ApiError::Rejected(reply.message))
            }
        }

        /// Returns the reply as-is; a non-success status is for the caller to report.
        pub async fn start_session(&self, req: &StartSessionRequest) -> Result<ApiReply, ApiError> {
            let resp = self.post("/api/start_session", req).await?;
            Self::reply(resp).await
        }

        pub async fn stop_session(&self) -> Result<ApiReply, ApiError> {
            let resp = self.post("/api/stop_session", &EmptyBody {}).await?;
            Self::reply(resp).await
        }

        pub async fn connection_status(&self) -> Result<ConnectionStatus, ApiError> {
            let resp = self.get("/api/connection_status").await?;
            Self::decode(resp).await
        }

        /// Raw snapshot; validation happens when it is ingested.
        pub async fn data(&self) -> Result<DataSnapshot, ApiError> {
            let resp = self.get("/api/data").await?;
            Self::decode(resp).await
        }

        pub async fn set_rep_mode(&self, automatic: bool) -> Result<ApiReply, ApiError> {
            let resp = self
                .post("/api/set_rep_mode", &RepModeRequest { automatic })
                .await?;
            Self::accepted(Self::reply(resp).await?)
        }

        pub async fn manual_rep(&self) -> Result<ApiReply, ApiError> {
            let resp = self.post("/api/manual_rep", &EmptyBody {}).await?;
            Self::accepted(Self::reply(resp).await?)
        }

        /// Recorded files offered for download, newest first.
        pub async fn list_files(&self) -> Result<Vec<String>, ApiError> {
            let resp = self.get("/files/api/files").await?;
            Self::decode::<FileList>(resp).await.map(|list| list.files)
        }

        pub async fn download(&self, file: &str) -> Result<Vec<u8>, ApiError> {
            let url = self.config.download_url(file);
            let resp = Request::get(&url).send().await.map_err(http_err)?;
            if !resp.ok() {
                return Err(ApiError::Status(resp.status()));
            }
            resp.binary().await.map_err(|e| ApiError::Decode(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_distinguishes_rejection_from_transport() {
        assert_eq!(
            ApiError::Rejected("Port busy".into()).status_text(),
            "Error: Port busy"
        );
        assert_eq!(ApiError::Status(500).status_text(), "Connection error");
        assert_eq!(ApiError::Http("offline".into()).status_text(), "Connection error");
    }
}
