//! Google Drive report uploads.
//!
//! Credentials come from a JSON file holding an OAuth refresh token plus
//! client id/secret. Each upload refreshes the access token, looks up (or
//! creates) the destination folder by name, and replaces any existing report
//! file with the same name so the folder always holds the latest revision.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::config::DriveConfig;

const MULTIPART_BOUNDARY: &str = "webhook_collector_upload";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("drive credentials are not configured")]
    NotConfigured,

    #[error("failed to read credentials file: {0}")]
    Credentials(#[from] std::io::Error),

    #[error("credentials file is malformed: {0}")]
    MalformedCredentials(#[from] serde_json::Error),

    #[error("drive request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token refresh rejected with status {status}")]
    TokenRefresh { status: u16 },

    #[error("drive API returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// OAuth user credentials as persisted by the Google auth flow.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: String,
}

impl StoredCredentials {
    pub fn from_file(path: &std::path::Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Authenticated Drive API client scoped to one upload session.
pub struct DriveClient {
    http: reqwest::Client,
    config: DriveConfig,
    access_token: String,
}

impl DriveClient {
    /// Load credentials and refresh the access token.
    pub async fn connect(config: &DriveConfig) -> Result<Self, DriveError> {
        let path = config
            .credentials_path
            .as_deref()
            .ok_or(DriveError::NotConfigured)?;
        let credentials = StoredCredentials::from_file(path)?;

        let http = reqwest::Client::new();
        let response = http
            .post(&credentials.token_uri)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DriveError::TokenRefresh {
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await?;
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(DriveError::TokenRefresh { status: 200 })?
            .to_string();

        Ok(Self {
            http: http.clone(),
            config: config.clone(),
            access_token,
        })
    }

    /// Upload a report, replacing any same-named file in the configured
    /// folder. Returns the Drive file id.
    pub async fn upload_report(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        let folder_id = self.ensure_folder(&self.config.folder_name).await?;
        let existing = self.find_file(file_name, Some(&folder_id)).await?;

        let file_id = match existing {
            Some(file_id) => {
                self.upload_multipart(
                    reqwest::Method::PATCH,
                    &format!("{}/files/{}?uploadType=multipart", self.config.upload_base, file_id),
                    json!({ "name": file_name }),
                    mime_type,
                    bytes,
                )
                .await?
            }
            None => {
                self.upload_multipart(
                    reqwest::Method::POST,
                    &format!("{}/files?uploadType=multipart", self.config.upload_base),
                    json!({ "name": file_name, "parents": [folder_id] }),
                    mime_type,
                    bytes,
                )
                .await?
            }
        };

        info!(file_name, file_id, "report uploaded to drive");
        Ok(file_id)
    }

    /// Find the destination folder by name, creating it when absent.
    async fn ensure_folder(&self, name: &str) -> Result<String, DriveError> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            FOLDER_MIME
        );
        if let Some(id) = self.search(&query).await? {
            return Ok(id);
        }

        let response = self
            .http
            .post(format!("{}/files", self.config.api_base))
            .bearer_auth(&self.access_token)
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME }))
            .send()
            .await?;
        let body = check(response).await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DriveError::Api {
                status: 200,
                body: "folder creation response missing id".to_string(),
            })
    }

    async fn find_file(
        &self,
        name: &str,
        folder_id: Option<&str>,
    ) -> Result<Option<String>, DriveError> {
        let mut query = format!("name = '{}' and trashed = false", escape_query(name));
        if let Some(folder_id) = folder_id {
            query.push_str(&format!(" and '{}' in parents", folder_id));
        }
        self.search(&query).await
    }

    async fn search(&self, query: &str) -> Result<Option<String>, DriveError> {
        let response = self
            .http
            .get(format!("{}/files", self.config.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("fields", "files(id, name)")])
            .send()
            .await?;
        let body = check(response).await?;

        Ok(body
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(|file| file.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Drive's multipart upload wants a multipart/related body: a JSON
    /// metadata part followed by the media part.
    async fn upload_multipart(
        &self,
        method: reqwest::Method,
        url: &str,
        metadata: Value,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--").as_bytes());

        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(
                "content-type",
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        let body = check(response).await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DriveError::Api {
                status: 200,
                body: "upload response missing id".to_string(),
            })
    }
}

async fn check(response: reqwest::Response) -> Result<Value, DriveError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DriveError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// Single quotes terminate Drive query string literals.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
