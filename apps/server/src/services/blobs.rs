//! Blob storage bridge (Azure Blob REST API, SharedKey authorization).
//!
//! Upload-by-name with overwrite semantics and list-all; no deletion, no
//! versioning. Requests are signed per the storage SharedKey scheme:
//! HMAC-SHA256 over the canonicalized request with the base64 account key.

use crate::{config::BlobConfig, Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

const STORAGE_API_VERSION: &str = "2021-08-06";

#[derive(Clone)]
pub struct BlobClient {
    http: Client,
    config: Arc<BlobConfig>,
    /// `account_url` with any trailing slash removed.
    base_url: String,
}

impl BlobClient {
    pub fn new(http: Client, config: Arc<BlobConfig>) -> Self {
        let base_url = config.account_url.trim_end_matches('/').to_string();
        Self {
            http,
            config,
            base_url,
        }
    }

    pub fn blob_url(&self, name: &str) -> String {
        format!("{}/{}/{name}", self.base_url, self.config.container)
    }

    fn rfc1123_now() -> String {
        Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    fn sign(&self, string_to_sign: &str) -> Result<String> {
        let key = BASE64
            .decode(&self.config.account_key)
            .map_err(|e| Error::Blob(format!("account key is not base64: {e}")))?;
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| Error::Blob(format!("HMAC init: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn authorization(&self, string_to_sign: &str) -> Result<String> {
        Ok(format!(
            "SharedKey {}:{}",
            self.config.account_name,
            self.sign(string_to_sign)?
        ))
    }

    /// Create the container if it does not exist yet. Called once at
    /// startup; an existing container is not an error.
    pub async fn ensure_container(&self) -> Result<()> {
        let date = Self::rfc1123_now();
        let canonical_resource = format!(
            "/{}/{}\nrestype:container",
            self.config.account_name, self.config.container
        );
        let string_to_sign = put_string_to_sign("", None, &date, None, &canonical_resource);

        let response = self
            .http
            .put(format!(
                "{}/{}?restype=container",
                self.base_url, self.config.container
            ))
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", self.authorization(&string_to_sign)?)
            .body(Vec::new())
            .send()
            .await
            .map_err(|e| Error::Blob(e.to_string()))?;

        match response.status().as_u16() {
            201 => {
                tracing::info!(container = %self.config.container, "Blob container created");
                Ok(())
            }
            409 => {
                tracing::debug!(container = %self.config.container, "Blob container already exists");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Blob(format!(
                    "container create returned {status}: {body}"
                )))
            }
        }
    }

    /// Upload bytes under a name, replacing any prior content.
    pub async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let date = Self::rfc1123_now();
        let canonical_resource = format!(
            "/{}/{}/{name}",
            self.config.account_name, self.config.container
        );
        let length = if data.is_empty() {
            String::new()
        } else {
            data.len().to_string()
        };
        let string_to_sign = put_string_to_sign(
            &length,
            Some(content_type),
            &date,
            Some("BlockBlob"),
            &canonical_resource,
        );

        let response = self
            .http
            .put(self.blob_url(name))
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", content_type)
            .header("Authorization", self.authorization(&string_to_sign)?)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Blob(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Blob(format!("upload returned {status}: {body}")));
        }

        Ok(self.blob_url(name))
    }

    /// List every blob in the container as `{name, url}` pairs.
    pub async fn list(&self) -> Result<Vec<Value>> {
        let date = Self::rfc1123_now();
        let canonical_resource = format!(
            "/{}/{}\ncomp:list\nrestype:container",
            self.config.account_name, self.config.container
        );
        let string_to_sign = get_string_to_sign(&date, &canonical_resource);

        let response = self
            .http
            .get(format!(
                "{}/{}?restype=container&comp=list",
                self.base_url, self.config.container
            ))
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", self.authorization(&string_to_sign)?)
            .send()
            .await
            .map_err(|e| Error::Blob(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Blob(format!("list returned {status}: {body}")));
        }

        let names = parse_blob_list(&body)?;
        Ok(names
            .into_iter()
            .map(|name| {
                let url = self.blob_url(&name);
                json!({"name": name, "url": url})
            })
            .collect())
    }
}

/// SharedKey string-to-sign for a PUT with the headers this client sends.
fn put_string_to_sign(
    content_length: &str,
    content_type: Option<&str>,
    date: &str,
    blob_type: Option<&str>,
    canonical_resource: &str,
) -> String {
    let mut canonical_headers = String::new();
    if let Some(blob_type) = blob_type {
        canonical_headers.push_str(&format!("x-ms-blob-type:{blob_type}\n"));
    }
    canonical_headers.push_str(&format!("x-ms-date:{date}\n"));
    canonical_headers.push_str(&format!("x-ms-version:{STORAGE_API_VERSION}\n"));

    format!(
        "PUT\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}",
        content_type = content_type.unwrap_or("")
    )
}

/// SharedKey string-to-sign for a bodyless GET.
fn get_string_to_sign(date: &str, canonical_resource: &str) -> String {
    format!(
        "GET\n\n\n\n\n\n\n\n\n\n\n\nx-ms-date:{date}\nx-ms-version:{STORAGE_API_VERSION}\n{canonical_resource}"
    )
}

/// Extract blob names from a `List Blobs` XML response.
fn parse_blob_list(xml: &str) -> Result<Vec<String>> {
    let document =
        roxmltree::Document::parse(xml).map_err(|e| Error::Blob(format!("list XML: {e}")))?;

    Ok(document
        .descendants()
        .filter(|node| node.has_tag_name("Blob"))
        .filter_map(|blob| {
            blob.children()
                .find(|child| child.has_tag_name("Name"))
                .and_then(|name| name.text())
                .map(str::to_string)
        })
        .collect())
}
