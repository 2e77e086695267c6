//! Google Drive v3 implementation of [`RemoteStore`].
//!
//! Only the handful of endpoints the snapshot engine needs are wrapped:
//! file listing (folders only), folder creation, single-shot uploads through
//! an upload session, and deletes. A request rejected with 401 is retried
//! once after exchanging the refresh token, when there is one.

use std::future::Future;
use std::path::Path;

use async_stream::stream;
use async_trait::async_trait;
use futures_util::{pin_mut, Stream, StreamExt};
use reqwest::{header, Body, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::drive_auth::Credentials;
use super::{RemoteEntry, RemoteStore, Result, StoreError};
use crate::config::DriveSettings;

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    trashed: bool,
}

impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        let is_folder = file.mime_type == FOLDER_MIME;
        RemoteEntry { id: file.id, name: file.name, is_folder }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

///
/// Escapes a value for use inside a single-quoted Drive query literal
///
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn folders_query(parent_id: &str, name: Option<&str>) -> String {
    let mut q = format!(
        "{} in parents and trashed=false and mimeType={}",
        quote(parent_id), quote(FOLDER_MIME)
    );
    if let Some(name) = name {
        q.push_str(&format!(" and name={}", quote(name)));
    }
    q
}

pub struct DriveStore {
    client: Client,
    api_url: String,
    upload_url: String,
    token_url: String,
    credentials: Credentials,
    access_token: Mutex<String>,
}

impl DriveStore {
    pub fn new(client: Client, credentials: Credentials, access_token: String, settings: &DriveSettings) -> Self {
        Self {
            client,
            api_url: settings.api_url.clone(),
            upload_url: settings.upload_url.clone(),
            token_url: settings.token_url.clone(),
            credentials,
            access_token: Mutex::new(access_token),
        }
    }

    ///
    /// Builds a store from the configured endpoints, reading credentials
    /// from the environment and refreshing the token when required
    ///
    pub async fn connect(settings: &DriveSettings) -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let client = Client::new();
        let token = credentials.access_token(&client, &settings.token_url).await?;
        Ok(Self::new(client, credentials, token, settings))
    }

    /// `{api_url}/files/{id}` with `id` percent-encoded as one path segment
    fn file_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/files", self.api_url))
            .map_err(|e| StoreError::Protocol(format!("invalid api url {}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Protocol(format!("api url {} cannot take a path", self.api_url)))?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(token)
    }

    ///
    /// Runs `op` with the current access token. If the store rejects the token
    /// and the credentials allow it, the token is refreshed and `op` runs once more.
    ///
    async fn with_token<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.access_token.lock().await.clone();
        match op(token.clone()).await {
            Err(StoreError::Api { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() && self.credentials.can_refresh() =>
            {
                let token = self.refresh(&token).await?;
                op(token).await
            }
            other => other,
        }
    }

    /// Replaces `stale` with a fresh token, unless another request already did
    async fn refresh(&self, stale: &str) -> Result<String> {
        let mut current = self.access_token.lock().await;
        if current.as_str() != stale {
            return Ok(current.clone());
        }
        info!("access token rejected, refreshing");
        let fresh = self.credentials.access_token(&self.client, &self.token_url).await?;
        *current = fresh.clone();
        Ok(fresh)
    }

    async fn send(&self, build: impl Fn(&str) -> RequestBuilder) -> Result<Response> {
        self.with_token(|token| self.send_once(build(&token))).await
    }

    async fn send_once(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(StoreError::Api { status: status.as_u16(), message })
    }

    ///
    /// Yields each page of files matching `query`, following `nextPageToken`
    ///
    fn query_pages<'a>(&'a self, query: String) -> impl Stream<Item = Result<Vec<DriveFile>>> + Send + 'a {
        stream! {
            let url = format!("{}/files", self.api_url);
            let mut page_token: Option<String> = None;
            loop {
                let sent = self.send(|token| {
                    let req = self.request(Method::GET, &url, token)
                        .query(&[("q", query.as_str()), ("fields", LIST_FIELDS), ("pageSize", PAGE_SIZE)]);
                    match &page_token {
                        Some(next) => req.query(&[("pageToken", next.as_str())]),
                        None => req,
                    }
                }).await;

                let page = match sent {
                    Ok(resp) => resp.json::<FileList>().await.map_err(StoreError::from),
                    Err(e) => Err(e),
                };
                match page {
                    Ok(page) => {
                        yield Ok(page.files);
                        match page.next_page_token {
                            Some(token) => page_token = Some(token),
                            None => break,
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }

    async fn upload_once(&self, token: &str, local_path: &Path, name: &str, parent_id: &str) -> Result<String> {
        let len = tokio::fs::metadata(local_path).await?.len();

        let session = self.request(Method::POST, &format!("{}/files", self.upload_url), token)
            .query(&[("uploadType", "resumable")])
            .header("X-Upload-Content-Length", len)
            .json(&serde_json::json!({ "name": name, "parents": [parent_id] }));
        let session = self.send_once(session).await?;
        let location = session.headers().get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Protocol("upload session has no Location header".to_string()))?
            .to_string();

        let file = tokio::fs::File::open(local_path).await?;
        let body = Body::wrap_stream(ReaderStream::new(file));
        let put = self.request(Method::PUT, &location, token)
            .header(header::CONTENT_LENGTH, len)
            .body(body);
        let created: DriveFile = self.send_once(put).await?.json().await?;
        Ok(created.id)
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    fn root_id(&self) -> String {
        "root".to_string()
    }

    async fn get_folder(&self, id: &str) -> Result<Option<RemoteEntry>> {
        let url = self.file_url(id)?;
        let sent = self.send(|token| {
            self.request(Method::GET, url.as_str(), token)
                .query(&[("fields", "id, name, mimeType, trashed")])
        }).await;
        let file: DriveFile = match sent {
            Ok(resp) => resp.json().await?,
            Err(StoreError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => return Ok(None),
            Err(e) => return Err(e),
        };
        if file.trashed {
            return Ok(None);
        }
        let entry = RemoteEntry::from(file);
        Ok(entry.is_folder.then_some(entry))
    }

    async fn list_folders(&self, parent_id: &str) -> Result<Vec<RemoteEntry>> {
        let pages = self.query_pages(folders_query(parent_id, None));
        pin_mut!(pages);

        let mut folders = Vec::new();
        while let Some(page) = pages.next().await {
            folders.extend(page?.into_iter().map(RemoteEntry::from));
        }
        debug!(parent_id, count = folders.len(), "listed folders");
        Ok(folders)
    }

    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<RemoteEntry>> {
        let pages = self.query_pages(folders_query(parent_id, Some(name)));
        pin_mut!(pages);

        // Drive's `name=` match is not guaranteed exact; names compare byte for byte
        while let Some(page) = pages.next().await {
            if let Some(file) = page?.into_iter().find(|f| f.name == name) {
                return Ok(Some(file.into()));
            }
        }
        Ok(None)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let url = format!("{}/files", self.api_url);
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME,
            "parents": [parent_id],
        });
        let resp = self.send(|token| {
            self.request(Method::POST, &url, token)
                .query(&[("fields", "id")])
                .json(&metadata)
        }).await?;
        let created: DriveFile = resp.json().await?;
        debug!(name, parent_id, id = %created.id, "created folder");
        Ok(created.id)
    }

    async fn upload_file(&self, local_path: &Path, name: &str, parent_id: &str) -> Result<String> {
        // The body is a file stream, so a retry re-opens the session and the file
        self.with_token(|token| async move {
            self.upload_once(&token, local_path, name, parent_id).await
        }).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.file_url(id)?;
        self.send(|token| self.request(Method::DELETE, url.as_str(), token)).await?;
        Ok(())
    }
}
