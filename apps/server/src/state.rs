//! Shared application state.
//!
//! All external-service handles are created once at startup and cloned into
//! request handlers: explicit dependency injection with process-scoped
//! lifetime, no module globals. Cloning is cheap; the clients share their
//! connection pool and token cache through `Arc`s.

use crate::{
    auth::TokenProvider,
    config::Config,
    fhir::FhirGateway,
    services::{blobs::BlobClient, payments::PaymentClient},
    Result,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fhir: FhirGateway,
    pub payments: PaymentClient,
    pub blobs: BlobClient,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fhir.request_timeout_seconds))
            .build()?;

        let config = Arc::new(config);

        let tokens = TokenProvider::new(http.clone(), Arc::new(config.fhir.clone()));
        let fhir = FhirGateway::new(http.clone(), config.fhir.base_url.clone(), tokens);
        let payments = PaymentClient::new(http.clone(), Arc::new(config.payments.clone()));
        let blobs = BlobClient::new(http, Arc::new(config.blobs.clone()));

        // The container is expected to exist; create it on first boot. Not
        // fatal; the upload endpoint will surface the real error if storage
        // is misconfigured.
        if !config.blobs.account_url.is_empty() {
            if let Err(e) = blobs.ensure_container().await {
                tracing::warn!(error = %e, "Could not ensure blob container exists");
            }
        }

        Ok(Self {
            config,
            fhir,
            payments,
            blobs,
        })
    }
}
