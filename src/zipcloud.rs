// Copyright 2025 Cowboy AI, LLC.

//! Zipcloud postal code lookup client
//!
//! Implements [`AddressLookup`] against the public zipcloud search API.
//! The service wraps its own status code inside a 200 response, so both
//! the HTTP layer and the body status are checked before trusting the
//! result list.

use crate::address::{AddressLookup, ResolvedAddress, Zipcode};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Public zipcloud endpoint
pub const DEFAULT_BASE_URL: &str = "https://zipcloud.ibsnet.co.jp/api";

/// Response envelope of the search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: i32,
    message: Option<String>,
    results: Option<Vec<SearchResult>>,
}

/// One matched address
#[derive(Debug, Deserialize)]
struct SearchResult {
    zipcode: String,
    address1: String,
    address2: String,
    address3: String,
}

fn into_match(body: SearchResponse) -> DomainResult<Option<ResolvedAddress>> {
    if body.status != 200 {
        return Err(DomainError::LookupUnavailable {
            message: body
                .message
                .unwrap_or_else(|| format!("service status {}", body.status)),
        });
    }
    Ok(body
        .results
        .and_then(|results| results.into_iter().next())
        .map(|first| ResolvedAddress {
            zipcode: first.zipcode,
            prefecture: first.address1,
            city: first.address2,
            town: first.address3,
        }))
}

/// HTTP client for the zipcloud search API
pub struct ZipcloudClient {
    client: Client,
    base_url: String,
}

impl ZipcloudClient {
    /// Client against the public endpoint
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a different base URL, for tests and proxies
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for ZipcloudClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressLookup for ZipcloudClient {
    async fn lookup(&self, zipcode: &str) -> DomainResult<Option<ResolvedAddress>> {
        let zipcode = Zipcode::parse(zipcode)?;
        debug!("Looking up address for zipcode {}", zipcode);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("zipcode", zipcode.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::LookupUnavailable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DomainError::LookupUnavailable {
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| DomainError::LookupUnavailable {
                    message: format!("malformed response: {e}"),
                })?;

        into_match(body)
    }
}
