//! HTTP client of the kakeibo ledger API.
//!
//! The client is shared by the terminal front-end and the command line tool.
//! It is cheap to clone: every clone reuses the same connection pool.

use std::path::{Path, PathBuf};

use api_types::{
    ErrorBody,
    entry::{EntryCreated, EntryId, EntryNew, Withdrawal},
    receipt::{Receipt, UploadResponse},
};
use chrono::NaiveDate;
use engine::Credentials;
use reqwest::{RequestBuilder, Response, StatusCode, Url, header, multipart};
use serde::{Serialize, de::DeserializeOwned};

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base_url: {0}")]
    BaseUrl(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API key rejected")]
    Unauthorized,
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the credentials must be typed again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl Client {
    pub fn new(base_url: &str, credentials: &Credentials) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|err| ClientError::BaseUrl(err.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: credentials.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/{path}"))
            .map_err(|err| ClientError::BaseUrl(err.to_string()))
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.query(&[("key", self.api_key.as_str())])
    }

    async fn post_json<TReq: Serialize + ?Sized, TResp: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp> {
        let req = self.authed(self.http.post(self.endpoint(path)?)).json(body);
        let resp = check(req.send().await?).await?;
        Ok(resp.json::<TResp>().await?)
    }

    /// Uploads a picture of one or more receipts and returns what the server
    /// read from it.
    pub async fn upload(&self, picture: &Path) -> Result<Vec<Receipt>> {
        let bytes = tokio::fs::read(picture).await?;
        let file_name = picture
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "picture".to_string());
        self.upload_bytes(&file_name, bytes).await
    }

    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<Vec<Receipt>> {
        tracing::debug!("uploading {file_name} ({} bytes)", bytes.len());
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = multipart::Form::new().part("picture", part);

        let req = self
            .authed(self.http.post(self.endpoint("upload")?))
            .multipart(form);
        let resp = check(req.send().await?).await?;
        let body = resp.json::<UploadResponse>().await?;
        tracing::info!("{} receipt(s) read from {file_name}", body.receipts.len());
        Ok(body.receipts)
    }

    /// Records an entry and returns the id the ledger assigned to it.
    pub async fn send(&self, entry: &EntryNew) -> Result<EntryId> {
        let created: EntryCreated = self.post_json("send", entry).await?;
        tracing::info!("entry {} sent", created.id);
        Ok(created.id)
    }

    pub async fn withdraw(&self, id: &EntryId) -> Result<()> {
        let _: serde::de::IgnoredAny = self
            .post_json("withdraw", &Withdrawal { id: id.clone() })
            .await?;
        tracing::info!("entry {id} withdrawn");
        Ok(())
    }

    /// Downloads the report into `dir` and returns the path written.
    ///
    /// The file is named after the attachment name sent by the server, or
    /// `kakeibo-<today>.tsv` when it sends none.
    pub async fn download(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf> {
        let req = self.authed(self.http.get(self.endpoint("download")?));
        let resp = check(req.send().await?).await?;

        let file_name = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_name)
            .unwrap_or_else(|| format!("kakeibo-{}.tsv", today.format("%Y-%m-%d")));
        let bytes = resp.bytes().await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!("report saved to {}", path.display());
        Ok(path)
    }
}

/// Turns an error status into a [`ClientError`], reading the error detail
/// from the body.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(ClientError::Unauthorized);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(err) => err.message(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("server error")
            .to_string(),
    };
    tracing::warn!("request failed with {status}: {message}");
    Err(ClientError::Server { status, message })
}

/// Extracts the file name of a `Content-Disposition: attachment` header.
/// Directory components are dropped.
fn attachment_name(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    let name = Path::new(raw).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_string())
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
