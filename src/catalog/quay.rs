//! Quay catalog client
//!
//! Listing goes through the Quay application API
//! (`/api/v1/repository...`), which pages results and signals continuation
//! with `has_additional`. Existence probes go through the registry v2
//! manifest endpoint, the same check `docker manifest inspect` performs.

use crate::catalog::{CatalogClient, Page, drain_pages};
use crate::common::with_retry;
use crate::config::{RegistryEndpoint, RetryConfig};
use crate::error::{MirrorError, Result};
use crate::logging::{EventCategory, Logger};
use crate::reference::ImageReference;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::Deserialize;
use std::time::Duration;

const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryListing {
    #[serde(default)]
    repositories: Vec<RepositoryEntry>,
    #[serde(default)]
    has_additional: bool,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TagListing {
    #[serde(default)]
    tags: Vec<TagEntry>,
    #[serde(default)]
    has_additional: bool,
}

pub struct QuayCatalogClientBuilder {
    endpoint: RegistryEndpoint,
    retry: RetryConfig,
    timeout: Duration,
    logger: Logger,
}

impl QuayCatalogClientBuilder {
    pub fn new(endpoint: RegistryEndpoint) -> Self {
        Self {
            endpoint,
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(30),
            logger: Logger::new(false),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<QuayCatalogClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MirrorError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(QuayCatalogClient {
            client,
            endpoint: self.endpoint,
            retry: self.retry,
            logger: self.logger,
        })
    }
}

/// Catalog client bound to one registry endpoint
pub struct QuayCatalogClient {
    client: Client,
    endpoint: RegistryEndpoint,
    retry: RetryConfig,
    logger: Logger,
}

impl QuayCatalogClient {
    pub fn builder(endpoint: RegistryEndpoint) -> QuayCatalogClientBuilder {
        QuayCatalogClientBuilder::new(endpoint)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.endpoint.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_repository_page(&self, page: u32) -> Result<Page<String>> {
        let url = format!(
            "https://{}/api/v1/repository?namespace={}&public=false&page={}",
            self.endpoint.host, self.endpoint.namespace, page
        );
        self.logger.event(
            EventCategory::Discovery,
            "API_FETCHING",
            &format!("Fetching repositories page {} from {}", page, self.endpoint.host),
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(MirrorError::Network(format!(
                "Repository listing returned {} for {}",
                response.status(),
                url
            )));
        }

        let listing: RepositoryListing = response.json().await?;
        Ok(Page {
            items: listing.repositories.into_iter().map(|r| r.name).collect(),
            has_more: listing.has_additional,
        })
    }

    async fn fetch_tag_page(&self, repository: &str, page: u32) -> Result<Page<String>> {
        let url = format!(
            "https://{}/api/v1/repository/{}/{}/tag/?page={}",
            self.endpoint.host, self.endpoint.namespace, repository, page
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(MirrorError::Network(format!(
                "Tag listing returned {} for {}",
                response.status(),
                url
            )));
        }

        let listing: TagListing = response.json().await?;
        Ok(Page {
            items: listing.tags.into_iter().map(|t| t.name).collect(),
            has_more: listing.has_additional,
        })
    }

    async fn probe_manifest(&self, reference: &ImageReference) -> Result<bool> {
        let url = format!(
            "https://{}/v2/{}/{}/manifests/{}",
            reference.registry, reference.namespace, reference.repository, reference.tag
        );

        let response = self
            .authorized(self.client.head(&url))
            .header(ACCEPT, MANIFEST_ACCEPT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(MirrorError::Network(format!(
                "Manifest probe returned {} for {}",
                status, reference
            ))),
        }
    }
}

#[async_trait]
impl CatalogClient for QuayCatalogClient {
    async fn list_repositories(&self) -> Result<Vec<String>> {
        let repos = drain_pages("repository listing", |page| async move {
            with_retry(&self.retry, "repository page", || {
                self.fetch_repository_page(page)
            })
            .await
        })
        .await?;

        self.logger.event(
            EventCategory::Discovery,
            "REPO_DISCOVERY_COMPLETE",
            &format!(
                "Found {} repositories in {}/{}",
                repos.len(),
                self.endpoint.host,
                self.endpoint.namespace
            ),
        );
        Ok(repos)
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        drain_pages(&format!("tag listing for {}", repository), |page| async move {
            with_retry(&self.retry, "tag page", || self.fetch_tag_page(repository, page)).await
        })
        .await
    }

    async fn exists(&self, reference: &ImageReference) -> Result<bool> {
        with_retry(&self.retry, "manifest probe", || self.probe_manifest(reference))
            .await
            .map_err(|e| {
                MirrorError::ExistenceCheck(format!("{}: {}", reference, e))
            })
    }
}
