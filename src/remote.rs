//! Client for the municipal content API.
//!
//! Every read endpoint returns a `{"content": ...}` JSON envelope; documents
//! are downloaded as raw bytes by `(file_uuid, file_name)`. The client is
//! stateless; callers decide what to do with each failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::models::{
    Envelope, RemoteAgendaItem, RemoteFileEntry, RemoteFolderDetail, RemoteFolderSummary,
};

/// Read-only view of the remote catalog. Implemented by [`HttpRemote`] in
/// production and by in-memory fakes in tests.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// All calendar years the source has published folders for.
    async fn years(&self) -> Result<Vec<i32>, RemoteError>;

    /// Folder summaries for one calendar year.
    async fn folders_for_year(&self, year: i32)
        -> Result<Vec<RemoteFolderSummary>, RemoteError>;

    /// Detail record of one folder.
    async fn folder_detail(&self, folder_uuid: &str) -> Result<RemoteFolderDetail, RemoteError>;

    /// Agenda items of a committee session.
    async fn committee_agenda(
        &self,
        folder_uuid: &str,
        session_uuid: &str,
    ) -> Result<Vec<RemoteAgendaItem>, RemoteError>;

    /// Agenda items of a plenary session.
    async fn plenary_agenda(&self, folder_uuid: &str)
        -> Result<Vec<RemoteAgendaItem>, RemoteError>;

    /// File entries attached to one agenda item.
    async fn agenda_files(
        &self,
        folder_uuid: &str,
        agenda_uuid: &str,
    ) -> Result<Vec<RemoteFileEntry>, RemoteError>;

    /// Raw bytes of one published document.
    async fn download(&self, file_uuid: &str, file_name: &str) -> Result<Vec<u8>, RemoteError>;
}

pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_content<T: DeserializeOwned>(&self, url: String) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| RemoteError::Fetch {
                url: url.clone(),
                source,
            })?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| RemoteError::Payload {
            url,
            detail: e.to_string(),
        })?;

        Ok(envelope.content)
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn years(&self) -> Result<Vec<i32>, RemoteError> {
        self.get_content(format!("{}/inv/years", self.base_url)).await
    }

    async fn folders_for_year(
        &self,
        year: i32,
    ) -> Result<Vec<RemoteFolderSummary>, RemoteError> {
        self.get_content(format!("{}/inv/folders?year={}", self.base_url, year))
            .await
    }

    async fn folder_detail(&self, folder_uuid: &str) -> Result<RemoteFolderDetail, RemoteError> {
        self.get_content(format!("{}/detail?id={}", self.base_url, folder_uuid))
            .await
    }

    async fn committee_agenda(
        &self,
        folder_uuid: &str,
        session_uuid: &str,
    ) -> Result<Vec<RemoteAgendaItem>, RemoteError> {
        self.get_content(format!(
            "{}/inv/list?id={}&id2={}",
            self.base_url, folder_uuid, session_uuid
        ))
        .await
    }

    async fn plenary_agenda(
        &self,
        folder_uuid: &str,
    ) -> Result<Vec<RemoteAgendaItem>, RemoteError> {
        self.get_content(format!("{}/inv/listtest?id={}", self.base_url, folder_uuid))
            .await
    }

    async fn agenda_files(
        &self,
        folder_uuid: &str,
        agenda_uuid: &str,
    ) -> Result<Vec<RemoteFileEntry>, RemoteError> {
        self.get_content(format!(
            "{}/elo/djav?uuid={}&uuid2={}",
            self.base_url, folder_uuid, agenda_uuid
        ))
        .await
    }

    async fn download(&self, file_uuid: &str, file_name: &str) -> Result<Vec<u8>, RemoteError> {
        let url = format!("{}/getfile/{}/{}", self.base_url, file_uuid, file_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| RemoteError::Fetch {
                url: url.clone(),
                source,
            })?;

        let bytes = response.bytes().await.map_err(|source| RemoteError::Fetch {
            url,
            source,
        })?;

        Ok(bytes.to_vec())
    }
}
