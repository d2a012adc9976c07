//! Gateway to the external FHIR repository.
//!
//! Thin verb-per-method client: every call attaches the current bearer token
//! and the FHIR JSON content type, and any non-2xx answer surfaces as
//! [`Error::Upstream`] with the upstream status and body, reported to the
//! caller, never retried. Search results may span pages; [`search_all`]
//! follows `Bundle.link[relation=next]` until the server stops handing out
//! pages.
//!
//! [`search_all`]: FhirGateway::search_all

use crate::{auth::TokenProvider, metrics, Error, Result};
use pons_mapping::models::timestamp;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

const FHIR_JSON: &str = "application/fhir+json";

/// Search query fragment matching the UHID identifier system.
pub fn identifier_query(uhid: &str) -> String {
    format!("{}|{uhid}", pons_mapping::UHID_SYSTEM)
}

/// `Patient/{uhid}` reference as used in search parameters.
pub fn subject_query(uhid: &str) -> String {
    format!("Patient/{uhid}")
}

#[derive(Clone)]
pub struct FhirGateway {
    http: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl FhirGateway {
    pub fn new(http: Client, base_url: String, tokens: TokenProvider) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.tokens.bearer_token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &str,
        resource_type: &str,
    ) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();

        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            metrics::FHIR_GATEWAY_REQUESTS_TOTAL
                .with_label_values(&[method, resource_type, "error"])
                .inc();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        metrics::FHIR_GATEWAY_REQUESTS_TOTAL
            .with_label_values(&[method, resource_type, "ok"])
            .inc();

        // DELETE and some updates come back without a body.
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(Error::from)
    }

    /// POST a single resource to its type endpoint.
    pub async fn create(&self, resource_type: &str, resource: &Value) -> Result<Value> {
        let url = format!("{}/{resource_type}", self.base_url);
        let builder = self.request(Method::POST, &url).await?.json(resource);
        self.send(builder, "POST", resource_type).await
    }

    /// POST a whole Bundle to the server root.
    pub async fn transaction(&self, bundle: &Value) -> Result<Value> {
        let url = format!("{}/", self.base_url);
        let builder = self.request(Method::POST, &url).await?.json(bundle);
        self.send(builder, "POST", "Bundle").await
    }

    /// Single search page.
    pub async fn search(&self, resource_type: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{resource_type}", self.base_url);
        let builder = self.request(Method::GET, &url).await?.query(params);
        self.send(builder, "GET", resource_type).await
    }

    /// Fetch an absolute URL, typically a pagination link.
    pub async fn get_url(&self, url: &str, resource_type: &str) -> Result<Value> {
        let builder = self.request(Method::GET, url).await?;
        self.send(builder, "GET", resource_type).await
    }

    /// Search and drain every page into one combined resource list.
    pub async fn search_all(
        &self,
        resource_type: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        let mut resources = Vec::new();
        let mut page = self.search(resource_type, params).await?;

        loop {
            resources.extend(entry_resources(&page));
            match next_link(&page) {
                Some(url) => {
                    let url = url.to_string();
                    page = self.get_url(&url, resource_type).await?;
                }
                None => break,
            }
        }

        Ok(resources)
    }

    pub async fn update(&self, resource_type: &str, id: &str, resource: &Value) -> Result<Value> {
        let url = format!("{}/{resource_type}/{id}", self.base_url);
        let builder = self.request(Method::PUT, &url).await?.json(resource);
        self.send(builder, "PUT", resource_type).await
    }

    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<()> {
        let url = format!("{}/{resource_type}/{id}", self.base_url);
        let builder = self.request(Method::DELETE, &url).await?;
        self.send(builder, "DELETE", resource_type).await?;
        Ok(())
    }
}

/// Clone the `resource` of every bundle entry.
pub fn entry_resources(bundle: &Value) -> Vec<Value> {
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("resource"))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// URL of the next search page, when the server paginated.
pub fn next_link(bundle: &Value) -> Option<&str> {
    bundle
        .get("link")
        .and_then(Value::as_array)?
        .iter()
        .find(|link| link.get("relation").and_then(Value::as_str) == Some("next"))
        .and_then(|link| link.get("url"))
        .and_then(Value::as_str)
}

/// Whether a resource carries the given internal `meta.tag` code.
pub fn has_tag(resource: &Value, code: &str) -> bool {
    resource
        .pointer("/meta/tag")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .any(|tag| tag.get("code").and_then(Value::as_str) == Some(code))
        })
        .unwrap_or(false)
}

/// Pick the resource with the most recent `dateTime`.
///
/// Values are parsed as instants and compared as such; anything unparseable
/// compares by its raw string and ranks below every parsed instant. (The
/// service this replaces compared raw strings only, which silently misorders
/// non-ISO timestamps.)
pub fn latest_by_datetime(resources: Vec<Value>) -> Option<Value> {
    resources.into_iter().max_by_key(|resource| {
        let raw = resource
            .get("dateTime")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        (timestamp::parse(&raw), raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_link_found_among_links() {
        let bundle = json!({
            "resourceType": "Bundle",
            "link": [
                {"relation": "self", "url": "https://fhir/x?page=1"},
                {"relation": "next", "url": "https://fhir/x?page=2"}
            ]
        });
        assert_eq!(next_link(&bundle), Some("https://fhir/x?page=2"));

        let last = json!({"link": [{"relation": "self", "url": "https://fhir/x?page=2"}]});
        assert_eq!(next_link(&last), None);
    }

    #[test]
    fn entry_resources_tolerates_missing_entries() {
        assert!(entry_resources(&json!({"resourceType": "Bundle"})).is_empty());

        let bundle = json!({
            "entry": [
                {"resource": {"resourceType": "Task", "id": "1"}},
                {"search": {"mode": "match"}}
            ]
        });
        let resources = entry_resources(&bundle);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]["id"], "1");
    }

    #[test]
    fn tag_discriminator() {
        let status = json!({
            "meta": {"tag": [{"system": "https://hospital.com/tags", "code": "ConsentFormStatus"}]}
        });
        assert!(has_tag(&status, "ConsentFormStatus"));
        assert!(!has_tag(&status, "ConsentFormData"));
        assert!(!has_tag(&json!({}), "ConsentFormStatus"));
    }

    #[test]
    fn latest_by_datetime_compares_instants() {
        let first = json!({"id": "a", "dateTime": "2025-01-01T00:00:00"});
        let second = json!({"id": "b", "dateTime": "2025-01-02T00:00:00"});
        let latest = latest_by_datetime(vec![first, second]).unwrap();
        assert_eq!(latest["id"], "b");
    }

    #[test]
    fn latest_by_datetime_handles_mixed_offsets() {
        // Raw string comparison would put the "+05:30" entry last; instant
        // comparison knows better.
        let utc = json!({"id": "utc", "dateTime": "2025-01-01T10:00:00Z"});
        let offset = json!({"id": "ist", "dateTime": "2025-01-01T20:00:00+05:30"});
        let latest = latest_by_datetime(vec![offset.clone(), utc]).unwrap();
        assert_eq!(latest["id"], "ist");
    }

    #[test]
    fn unparseable_datetimes_rank_last() {
        let junk = json!({"id": "junk", "dateTime": "yesterday"});
        let parsed = json!({"id": "ok", "dateTime": "2020-01-01T00:00:00"});
        let latest = latest_by_datetime(vec![junk, parsed]).unwrap();
        assert_eq!(latest["id"], "ok");
    }
}
