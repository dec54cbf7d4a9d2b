use crate::config::{API_TOKEN_ENV, GatewayConfig};
use crate::error::{
    Error, ErrorKind, HttpClientSnafu, InvalidEndpointSnafu, InvalidResponseSnafu,
    MissingEnvVarSnafu, PathNotFoundSnafu, Result,
};
use crate::storage::constants::{MAX_UPLOAD_SIZE_LABEL, USER_AGENT};
use crate::storage::gateway::Gateway;
use crate::storage::models::{Quota, RawPage, RemoteFile, RemoteFolder, UploadReceipt};
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use snafu::{OptionExt, ResultExt, ensure};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Gateway speaking bearer-authenticated HTTP+JSON.
///
/// Metadata calls go to the API endpoint group, file bodies are fetched from
/// the separate download endpoint group. Uploads and downloads use the longer
/// transfer timeout.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    api_url: Url,
    download_url: Url,
    token: String,
    timeout: Duration,
    transfer_timeout: Duration,
}

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("api_url", &self.api_url.as_str())
            .field("download_url", &self.download_url.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("transfer_timeout", &self.transfer_timeout)
            .finish()
    }
}

impl HttpGateway {
    /// Build a gateway, failing fast when the credential is absent.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        ensure!(
            !config.token.trim().is_empty(),
            MissingEnvVarSnafu { key: API_TOKEN_ENV }
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.timeout)
            .build()
            .context(HttpClientSnafu)?;

        Ok(Self {
            client,
            api_url: parse_endpoint(&config.api_url)?,
            download_url: parse_endpoint(&config.download_url)?,
            token: config.token.trim().to_string(),
            timeout: config.timeout,
            transfer_timeout: config.transfer_timeout,
        })
    }

    fn api(&self, segments: &[&str]) -> Url {
        join_url(&self.api_url, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{method} {url}");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        check_status(response).await
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.send(request).await?;
        Ok(response.json::<Value>().await?)
    }
}

impl Gateway for HttpGateway {
    async fn upload(&self, local_path: &Path, remote_name: Option<&str>) -> Result<UploadReceipt> {
        let name = match remote_name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .context(PathNotFoundSnafu { path: local_path })?,
        };
        let data = fs::read(local_path).await?;
        log::debug!(
            "upload path={} name={} bytes={}",
            local_path.display(),
            name,
            data.len()
        );

        let form = Form::new()
            .text("name", name.clone())
            .part("file", Part::bytes(data).file_name(name));
        let request = self
            .request(Method::POST, self.api(&["files", "upload"]))
            .timeout(self.transfer_timeout)
            .multipart(form);
        let body = self.send_json(request).await?;
        extract_object(body, "file")
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<Option<u64>> {
        // The storage node is resolved on every call; it is never cached.
        let Some(info) = self.file_info(file_id).await? else {
            return Ok(None);
        };

        let mut url = join_url(&self.download_url, &["files", file_id, "data"]);
        if let Some(node_id) = &info.node_id {
            url.query_pairs_mut().append_pair("nodeId", node_id);
        }
        let response = self
            .request(Method::GET, url)
            .timeout(self.transfer_timeout)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        // `dest` is only replaced once the whole body is on disk.
        let partial = partial_path(dest);
        let written = match write_body(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                discard_partial(&partial).await;
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&partial, dest).await {
            discard_partial(&partial).await;
            return Err(e.into());
        }
        Ok(Some(written))
    }

    async fn file_info(&self, file_id: &str) -> Result<Option<RemoteFile>> {
        let response = self
            .request(Method::GET, self.api(&["files", file_id]))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = check_status(response).await?.json().await?;
        extract_object(body, "file").map(Some)
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, self.api(&["files", file_id])))
            .await?;
        Ok(())
    }

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<RawPage<RemoteFile>> {
        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(folder_id) = folder_id {
            query.push(("folderId", folder_id.to_string()));
        }
        let request = self
            .request(Method::GET, self.api(&["files"]))
            .query(&query);
        extract_page(self.send_json(request).await?, "files")
    }

    async fn search_files(
        &self,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<RawPage<RemoteFile>> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let request = self
            .request(Method::GET, self.api(&["files", "search"]))
            .query(&params);
        extract_page(self.send_json(request).await?, "files")
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<RemoteFolder> {
        let request = self
            .request(Method::POST, self.api(&["folders"]))
            .json(&json!({ "name": name, "parentId": parent_id }));
        extract_object(self.send_json(request).await?, "folder")
    }

    async fn list_folders(&self, parent_id: Option<&str>) -> Result<Vec<RemoteFolder>> {
        let mut request = self.request(Method::GET, self.api(&["folders"]));
        if let Some(parent_id) = parent_id {
            request = request.query(&[("parentId", parent_id)]);
        }
        let mut body = self.send_json(request).await?;
        extract_list(&mut body, "folders")
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, self.api(&["folders", folder_id])))
            .await?;
        Ok(())
    }

    async fn quota(&self) -> Result<Quota> {
        let body = self
            .send_json(self.request(Method::GET, self.api(&["account", "quota"])))
            .await?;
        extract_object(body, "quota")
    }
}

/// Map a non-success HTTP status to a classified error.
///
/// `body` is the raw response body; a `message`, `error` or `detail` field is
/// appended to the message when present.
pub fn classify_status(status: u16, body: &str) -> Error {
    let detail = remote_message(body);
    let (kind, message) = match status {
        401 => (
            ErrorKind::InvalidCredential,
            "Authentication failed: the access token is invalid or expired".to_string(),
        ),
        403 => (
            ErrorKind::PermissionDenied,
            with_detail("Permission denied", detail),
        ),
        404 => (ErrorKind::NotFound, with_detail("Not found", detail)),
        408 => (
            ErrorKind::Timeout,
            "The remote service timed out handling the request".to_string(),
        ),
        413 => (
            ErrorKind::PayloadTooLarge,
            format!(
                "File exceeds the remote {MAX_UPLOAD_SIZE_LABEL} upload limit; compress or split it before retrying"
            ),
        ),
        429 => (
            ErrorKind::RateLimited,
            "Rate limited by the remote service; retry later".to_string(),
        ),
        500..=599 => (
            ErrorKind::Remote { server_error: true },
            with_detail(&format!("Remote service error (HTTP {status})"), detail),
        ),
        _ => (
            ErrorKind::Remote {
                server_error: false,
            },
            with_detail(&format!("Request failed (HTTP {status})"), detail),
        ),
    };
    Error::Remote {
        kind,
        status: Some(status),
        message,
    }
}

/// Map a transport-level failure to a classified error.
pub(crate) fn classify_transport(err: &reqwest::Error) -> Error {
    if let Some(status) = err.status() {
        return classify_status(status.as_u16(), "");
    }
    let (kind, message) = if err.is_timeout() {
        (
            ErrorKind::Timeout,
            "Request timed out waiting for the remote service".to_string(),
        )
    } else if err.is_connect() {
        (
            ErrorKind::Connectivity,
            format!("Could not connect to the remote service: {err}"),
        )
    } else if err.is_decode() {
        (
            ErrorKind::Remote {
                server_error: false,
            },
            format!("Could not decode the remote response: {err}"),
        )
    } else {
        (
            ErrorKind::Remote {
                server_error: false,
            },
            format!("Request failed: {err}"),
        )
    };
    Error::Remote {
        kind,
        status: None,
        message,
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let err = classify_status(status.as_u16(), &body);
    log::warn!("{url} returned {status}: {err}");
    Err(err)
}

async fn write_body(response: Response, path: &Path) -> Result<u64> {
    let mut file = fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Sibling of `dest` that receives the body while it streams.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial download {}: {e}", path.display()),
    }
}

fn with_detail(prefix: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) => format!("{prefix}: {detail}"),
        None => prefix.to_string(),
    }
}

fn remote_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => ["message", "error", "detail"]
            .into_iter()
            .find_map(|key| match value.get(key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(o)) => o
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            }),
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        InvalidEndpointSnafu {
            url: raw,
            reason: "scheme must be http or https",
        }
    );
    Ok(url)
}

fn join_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Unwrap `{ "<key>": {...} }` envelopes, falling back to the body itself.
fn extract_object<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T> {
    let nested = body.get(key).is_some_and(Value::is_object);
    let value = if nested { body[key].take() } else { body };
    Ok(serde_json::from_value(value)?)
}

/// Find the item array under `key`, the generic `items` key, or the body itself.
fn extract_list<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<Vec<T>> {
    let list = if body.is_array() {
        Some(body.take())
    } else {
        [key, "items"]
            .into_iter()
            .find(|k| body.get(k).is_some_and(Value::is_array))
            .and_then(|k| body.get_mut(k))
            .map(Value::take)
    };
    let list = list.context(InvalidResponseSnafu {
        endpoint: key,
        reason: format!("expected a '{key}' or 'items' array"),
    })?;
    Ok(serde_json::from_value(list)?)
}

fn extract_page<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<RawPage<T>> {
    let total = body.get("total").and_then(Value::as_u64);
    let items: Vec<T> = extract_list(&mut body, key)?;
    let total = total.unwrap_or(items.len() as u64);
    Ok(RawPage { items, total })
}
