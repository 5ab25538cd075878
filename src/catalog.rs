// Copyright 2025 Cowboy AI, LLC.

//! Product catalog: the declarative per-product field schema
//!
//! Each product is described by a [`ProductSpec`]: its price and a
//! [`ProductKind`] that declares which measurement fields exist and the
//! legal domain of each. The form model and order validation both
//! dispatch on the kind, so adding a product shape means adding one
//! variant here, not branching logic elsewhere.
//!
//! The catalog is validated once at construction. Lookup of an absent
//! key is a [`DomainError::UnknownProduct`]; a malformed table never
//! constructs at all.

use crate::errors::{DomainError, DomainResult};
use crate::identifiers::ProductKey;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for float comparisons in generated numeric domains
const EPSILON: f64 = 1e-9;

/// Format a domain value the way it is presented and stored
///
/// Whole numbers print without a fractional part ("70", not "70.0");
/// fractional steps keep theirs ("22.5").
pub fn format_numeric(value: f64) -> String {
    if (value - value.round()).abs() < EPSILON {
        format!("{}", value.round() as i64)
    } else {
        value.to_string()
    }
}

/// Field identifiers shared by forms, patches, and completeness checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Line item quantity
    Quantity,
    /// Size pick for QtySizeMemo products
    Size,
    /// Waist pick for Pants products
    Waist,
    /// Free-text length for Pants products
    Length,
    /// Style variant pick, when the product spec declares one
    Subtype,
    /// Free-text memo
    Memo,
}

impl FieldName {
    /// Stable lowercase name used in messages and persisted patches
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Size => "size",
            Self::Waist => "waist",
            Self::Length => "length",
            Self::Subtype => "subtype",
            Self::Memo => "memo",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A half-open numeric range generating the sequence min, min+step, ... < max
///
/// Steps may be fractional; values are never coerced to integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NumericRange {
    /// First generated value
    pub min: f64,
    /// Exclusive upper bound
    pub max: f64,
    /// Distance between consecutive values
    pub step: f64,
}

impl NumericRange {
    /// Create a range; call [`NumericRange::validate`] before trusting it
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Check the range can generate a non-empty sequence
    pub fn validate(&self) -> DomainResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || !self.step.is_finite() {
            return Err(DomainError::validation(
                "Numeric range bounds must be finite",
            ));
        }
        if self.step <= 0.0 {
            return Err(DomainError::validation(format!(
                "Numeric range step must be positive, got {}",
                self.step
            )));
        }
        if self.min >= self.max {
            return Err(DomainError::validation(format!(
                "Numeric range is empty: min {} must be below max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Generate the ordered value sequence
    ///
    /// Each value is computed as min + k*step rather than by repeated
    /// addition, so error does not accumulate across long ranges.
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut k: u32 = 0;
        loop {
            let value = self.min + f64::from(k) * self.step;
            if value >= self.max - EPSILON {
                break;
            }
            out.push(value);
            k += 1;
        }
        out
    }

    /// Check membership by reconstructing the step index
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if value < self.min - EPSILON || value >= self.max - EPSILON {
            return false;
        }
        let k = ((value - self.min) / self.step).round();
        if k < 0.0 {
            return false;
        }
        (self.min + k * self.step - value).abs() < EPSILON
    }

    /// First generated value, if the range is non-empty
    pub fn first(&self) -> Option<f64> {
        if self.min < self.max - EPSILON {
            Some(self.min)
        } else {
            None
        }
    }
}

/// The legal values of a size field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeDomain {
    /// Fixed ordered set of size labels ("S", "M", ...)
    Enumerated {
        /// The labels, in presentation order
        values: Vec<String>,
    },
    /// Labels generated from a numeric range (shoe sizes and the like)
    Range(NumericRange),
}

impl SizeDomain {
    /// Build an enumerated domain from string labels
    pub fn enumerated(values: &[&str]) -> Self {
        Self::Enumerated {
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build a range-generated domain
    pub fn range(min: f64, max: f64, step: f64) -> Self {
        Self::Range(NumericRange::new(min, max, step))
    }

    /// Ordered presentation labels for this domain
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Enumerated { values } => values.clone(),
            Self::Range(range) => range.values().iter().map(|v| format_numeric(*v)).collect(),
        }
    }

    /// Check a submitted label against the domain
    ///
    /// Range domains compare numerically, so "22" and "22.0" both match
    /// a generated 22.
    pub fn contains(&self, label: &str) -> bool {
        match self {
            Self::Enumerated { values } => values.iter().any(|v| v == label),
            Self::Range(range) => label
                .trim()
                .parse::<f64>()
                .map(|v| range.contains(v))
                .unwrap_or(false),
        }
    }

    /// First label, used as the default selection
    pub fn first(&self) -> Option<String> {
        match self {
            Self::Enumerated { values } => values.first().cloned(),
            Self::Range(range) => range.first().map(format_numeric),
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match self {
            Self::Enumerated { values } => {
                if values.is_empty() {
                    return Err(DomainError::validation("Size domain must not be empty"));
                }
                Ok(())
            }
            Self::Range(range) => range.validate(),
        }
    }
}

/// The field shape of a product
///
/// Every product has a quantity and a memo; the kind declares what sits
/// between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductKind {
    /// Quantity, a size pick, and a memo
    QtySizeMemo {
        /// Legal sizes for this product
        size_domain: SizeDomain,
    },
    /// Quantity, a waist pick, a free-text length, and a memo
    Pants {
        /// Legal waist values
        waist_domain: NumericRange,
        /// Pre-fill for the length field until staff enters a value
        length_hint: String,
    },
    /// Quantity and memo only
    QtyMemo,
}

impl ProductKind {
    /// Kind name for logs and messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::QtySizeMemo { .. } => "qty_size_memo",
            Self::Pants { .. } => "pants",
            Self::QtyMemo => "qty_memo",
        }
    }
}

/// One product's declarative schema entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductSpec {
    /// Stable key, unique within the catalog
    pub key: ProductKey,
    /// Display name (UI-facing, excluded from core logic)
    pub label: String,
    /// Unit price in whole currency units
    pub price: u32,
    /// Field shape and domains
    #[serde(flatten)]
    pub kind: ProductKind,
    /// Style variants, when the product has them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype_domain: Option<Vec<String>>,
    /// Collect size/subtype on the customer intake form instead of
    /// deferring them to staff measurement
    #[serde(default)]
    pub collect_size_at_intake: bool,
}

impl ProductSpec {
    /// Quantity + size + memo product
    pub fn qty_size_memo(
        key: impl Into<ProductKey>,
        label: impl Into<String>,
        price: u32,
        size_domain: SizeDomain,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            price,
            kind: ProductKind::QtySizeMemo { size_domain },
            subtype_domain: None,
            collect_size_at_intake: false,
        }
    }

    /// Pants-style product with waist range and length field
    pub fn pants(
        key: impl Into<ProductKey>,
        label: impl Into<String>,
        price: u32,
        waist_domain: NumericRange,
        length_hint: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            price,
            kind: ProductKind::Pants {
                waist_domain,
                length_hint: length_hint.into(),
            },
            subtype_domain: None,
            collect_size_at_intake: false,
        }
    }

    /// Quantity + memo product with no measurement fields
    pub fn qty_memo(key: impl Into<ProductKey>, label: impl Into<String>, price: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            price,
            kind: ProductKind::QtyMemo,
            subtype_domain: None,
            collect_size_at_intake: false,
        }
    }

    /// Declare style variants for this product
    pub fn with_subtypes(mut self, subtypes: &[&str]) -> Self {
        self.subtype_domain = Some(subtypes.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Collect size/subtype at intake instead of at measurement
    pub fn with_intake_size(mut self) -> Self {
        self.collect_size_at_intake = true;
        self
    }

    /// Check every declared domain is non-empty and well-formed
    pub fn validate(&self) -> DomainResult<()> {
        match &self.kind {
            ProductKind::QtySizeMemo { size_domain } => size_domain.validate()?,
            ProductKind::Pants { waist_domain, .. } => waist_domain.validate()?,
            ProductKind::QtyMemo => {}
        }
        if let Some(subtypes) = &self.subtype_domain {
            if subtypes.is_empty() {
                return Err(DomainError::validation(format!(
                    "Subtype domain of {} must not be empty",
                    self.key
                )));
            }
        }
        Ok(())
    }

    /// Size domain, when the kind has one
    pub fn size_domain(&self) -> Option<&SizeDomain> {
        match &self.kind {
            ProductKind::QtySizeMemo { size_domain } => Some(size_domain),
            _ => None,
        }
    }

    /// Waist domain, when the kind has one
    pub fn waist_domain(&self) -> Option<&NumericRange> {
        match &self.kind {
            ProductKind::Pants { waist_domain, .. } => Some(waist_domain),
            _ => None,
        }
    }

    /// Length pre-fill, when the kind has a length field
    pub fn length_hint(&self) -> Option<&str> {
        match &self.kind {
            ProductKind::Pants { length_hint, .. } => Some(length_hint),
            _ => None,
        }
    }

    /// Fields that must be populated before a line item of this product
    /// counts as measured
    pub fn required_measurement_fields(&self) -> Vec<FieldName> {
        let mut fields = match &self.kind {
            ProductKind::QtySizeMemo { .. } => vec![FieldName::Size],
            ProductKind::Pants { .. } => vec![FieldName::Waist, FieldName::Length],
            ProductKind::QtyMemo => vec![],
        };
        if self.subtype_domain.is_some() {
            fields.push(FieldName::Subtype);
        }
        fields
    }
}

/// The validated, ordered product table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductCatalog {
    specs: IndexMap<ProductKey, ProductSpec>,
}

impl ProductCatalog {
    /// Build a catalog, validating every spec and rejecting duplicates
    pub fn new(specs: Vec<ProductSpec>) -> DomainResult<Self> {
        let mut table = IndexMap::with_capacity(specs.len());
        for spec in specs {
            spec.validate()?;
            let key = spec.key.clone();
            if table.insert(key.clone(), spec).is_some() {
                return Err(DomainError::validation(format!(
                    "Duplicate product key: {key}"
                )));
            }
        }
        Ok(Self { specs: table })
    }

    /// The standard deployment's product table
    pub fn standard() -> Self {
        let sizes = || SizeDomain::enumerated(&["S", "M", "L", "XL"]);
        let waist = NumericRange::new(61.0, 111.0, 3.0);

        Self::new(vec![
            ProductSpec::qty_size_memo("blazer", "ブレザー", 12000, sizes()),
            ProductSpec::qty_size_memo("shirt", "シャツ", 2000, sizes()),
            ProductSpec::pants("pants", "ズボン", 3000, waist, "72"),
            ProductSpec::qty_size_memo("vest", "ベスト", 4000, sizes()),
            ProductSpec::qty_size_memo("sweater", "セーター", 4500, sizes()),
            ProductSpec::qty_memo("necktie", "ネクタイ", 1500),
            ProductSpec::qty_size_memo("sandals", "サンダル", 1800, SizeDomain::range(22.0, 31.0, 1.0)),
            ProductSpec::qty_size_memo("pe_shirt", "体操服（半袖）", 2200, sizes()),
            ProductSpec::qty_size_memo("pe_halfpants", "体操服（ハーフパンツ）", 2000, sizes()),
            ProductSpec::qty_size_memo("pe_jacket", "体操服（ジャージ上着）", 5000, sizes()),
            ProductSpec::pants("pe_pants", "体操服（パンツ）", 3800, waist, "72"),
        ])
        .expect("standard catalog is valid")
    }

    /// Resolve a product key
    pub fn resolve(&self, key: &ProductKey) -> DomainResult<&ProductSpec> {
        self.specs.get(key).ok_or_else(|| DomainError::UnknownProduct {
            key: key.to_string(),
        })
    }

    /// Check a key exists without resolving it
    pub fn contains_key(&self, key: &ProductKey) -> bool {
        self.specs.contains_key(key)
    }

    /// Product keys in table order
    pub fn keys(&self) -> impl Iterator<Item = &ProductKey> {
        self.specs.keys()
    }

    /// Specs in table order
    pub fn specs(&self) -> impl Iterator<Item = &ProductSpec> {
        self.specs.values()
    }

    /// Number of products in the catalog
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the catalog has no products
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Ordered legal values of a domain-bearing field
    ///
    /// Quantity, length, and memo have no enumerated domain; asking for
    /// one is a validation error.
    pub fn domain_of(&self, key: &ProductKey, field: FieldName) -> DomainResult<Vec<String>> {
        let spec = self.resolve(key)?;
        let labels = match field {
            FieldName::Size => spec.size_domain().map(|d| d.labels()),
            FieldName::Waist => spec
                .waist_domain()
                .map(|r| r.values().iter().map(|v| format_numeric(*v)).collect()),
            FieldName::Subtype => spec.subtype_domain.clone(),
            FieldName::Quantity | FieldName::Length | FieldName::Memo => None,
        };
        labels.ok_or_else(|| {
            DomainError::validation(format!("Field {field} of {key} has no declared domain"))
        })
    }
}
