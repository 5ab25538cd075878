//! Postal code normalization and the address lookup collaborator
//!
//! Lookup runs once per explicit user request on the intake form,
//! never automatically, and its failures are surfaced as retryable
//! warnings that leave the in-progress draft untouched.

use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Strip separators from a postal code as entered
///
/// Customers type "606-8275" or "606 8275"; the lookup service and the
/// stored record both want the bare digits.
pub fn normalize_zipcode(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// A validated seven-digit postal code
///
/// Parsing strips separators first, so "606-8275" and "6068275" name
/// the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Zipcode(String);

impl Zipcode {
    /// Normalize and validate a typed postal code
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let digits = normalize_zipcode(raw);
        if digits.len() != 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "Zipcode {raw:?} must be 7 digits"
            )));
        }
        Ok(Self(digits))
    }

    /// The bare digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zipcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An address returned by the lookup service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedAddress {
    /// Normalized postal code the match is for
    pub zipcode: String,
    /// Prefecture
    pub prefecture: String,
    /// City or ward
    pub city: String,
    /// Town area
    pub town: String,
}

impl ResolvedAddress {
    /// The single-line form shown in the address field
    pub fn full(&self) -> String {
        format!("{}{}{}", self.prefecture, self.city, self.town)
    }
}

/// Address lookup collaborator
///
/// Implementations run the input through [`Zipcode::parse`] first, so a
/// malformed code fails validation without any remote call. `Ok(None)`
/// means the service answered but found nothing; the form shows a
/// warning and keeps the typed address. A transport or service failure
/// is [`crate::errors::DomainError::LookupUnavailable`], which callers
/// treat as retryable.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Resolve a postal code to an address
    async fn lookup(&self, zipcode: &str) -> DomainResult<Option<ResolvedAddress>>;
}

/// Table-backed lookup for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticAddressLookup {
    entries: HashMap<String, ResolvedAddress>,
}

impl StaticAddressLookup {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one known address, keyed by its normalized postal code
    pub fn with_entry(mut self, address: ResolvedAddress) -> Self {
        self.entries
            .insert(normalize_zipcode(&address.zipcode), address);
        self
    }
}

#[async_trait]
impl AddressLookup for StaticAddressLookup {
    async fn lookup(&self, zipcode: &str) -> DomainResult<Option<ResolvedAddress>> {
        let code = Zipcode::parse(zipcode)?;
        Ok(self.entries.get(code.as_str()).cloned())
    }
}
