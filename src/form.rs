//! Form model: derives editable fields from the catalog and an order
//!
//! Given the product table, an order snapshot, and a role, this module
//! produces the ordered field list a renderer should show: each field's
//! control, allowed options, stored value, and pre-fill default. The
//! reverse direction is [`FormSubmission`], which turns submitted
//! values back into an [`OrderPatch`] or an [`OrderDraft`].
//!
//! The renderer itself is an external collaborator; nothing here knows
//! how fields are drawn.

use crate::catalog::{format_numeric, FieldName, ProductCatalog, ProductSpec};
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::ProductKey;
use crate::order::{CustomerProfile, LineItem, Order, OrderDraft, QUANTITY_MAX};
use crate::patch::{LineItemPatch, OrderPatch};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on quantities the customer intake form offers
///
/// Staff can go higher (up to [`QUANTITY_MAX`]) when correcting an
/// order during measurement.
pub const CUSTOMER_QUANTITY_MAX: u8 = 10;

/// Who is looking at the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormRole {
    /// Customer entering the initial order
    CustomerIntake,
    /// Staff recording measurements
    StaffMeasurement,
    /// Customer reviewing the measured order before confirming
    CustomerFinal,
}

/// A submitted or displayed field value
///
/// Untagged on the wire: quantities arrive as whole numbers, waists as
/// numbers, everything else as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    /// Whole-number value (quantities)
    Integer(u64),
    /// Floating value (waist picks)
    Number(f64),
    /// Text value (sizes, lengths, subtypes, memos)
    Text(String),
}

impl FieldValue {
    /// Whole-number view, `None` for floats and text
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; whole numbers widen to floats
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text view, `None` for numbers
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{}", format_numeric(*n)),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// How a field is entered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FieldControl {
    /// Pick one of an ordered option list
    Select {
        /// Options in presentation order
        options: Vec<String>,
    },
    /// Bounded whole-number entry
    Stepper {
        /// Smallest accepted value
        min: u8,
        /// Largest accepted value
        max: u8,
    },
    /// Free text entry
    Text {
        /// Hint shown while the field is empty
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

/// One renderable field of the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormField {
    /// Product this field belongs to
    pub product: ProductKey,

    /// Product display name
    pub product_label: String,

    /// Which field of the line item
    pub field: FieldName,

    /// Entry control and its domain
    pub control: FieldControl,

    /// Stored value, when the order already has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,

    /// Pre-fill shown when no value is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,

    /// Whether the current role may change this field
    pub editable: bool,
}

impl FormField {
    /// The value a renderer should display: stored, else the default
    pub fn effective_value(&self) -> Option<&FieldValue> {
        self.value.as_ref().or(self.default.as_ref())
    }
}

/// The full field list for one role, plus totals where they apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormView {
    /// Role the view was built for
    pub role: FormRole,

    /// Fields in presentation order (catalog order, then field order)
    pub fields: Vec<FormField>,

    /// Order total, absent at intake where no order exists yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<u32>,
}

/// Ordered visible fields for a product at measurement time
///
/// The kind decides what sits between quantity and memo; a declared
/// subtype domain adds its pick regardless of kind. New kinds extend
/// this match, not the call sites.
pub fn fields_for(spec: &ProductSpec) -> Vec<FieldName> {
    let mut fields = vec![FieldName::Quantity];
    if spec.size_domain().is_some() {
        fields.push(FieldName::Size);
    }
    if spec.waist_domain().is_some() {
        fields.push(FieldName::Waist);
        fields.push(FieldName::Length);
    }
    if spec.subtype_domain.is_some() {
        fields.push(FieldName::Subtype);
    }
    fields.push(FieldName::Memo);
    fields
}

fn build_field(
    spec: &ProductSpec,
    field: FieldName,
    item: Option<&LineItem>,
    quantity_max: u8,
) -> FormField {
    let (control, value, default) = match field {
        FieldName::Quantity => (
            FieldControl::Stepper {
                min: 0,
                max: quantity_max,
            },
            item.map(|i| FieldValue::Integer(u64::from(i.quantity))),
            Some(FieldValue::Integer(0)),
        ),
        FieldName::Size => {
            // Guarded by the caller via fields_for
            let domain = spec.size_domain().expect("size field implies size domain");
            (
                FieldControl::Select {
                    options: domain.labels(),
                },
                item.and_then(|i| i.size.clone()).map(FieldValue::Text),
                domain.first().map(FieldValue::Text),
            )
        }
        FieldName::Waist => {
            let domain = spec
                .waist_domain()
                .expect("waist field implies waist domain");
            (
                FieldControl::Select {
                    options: domain.values().iter().map(|v| format_numeric(*v)).collect(),
                },
                item.and_then(|i| i.waist).map(FieldValue::Number),
                domain.first().map(FieldValue::Number),
            )
        }
        FieldName::Length => {
            let hint = spec.length_hint().map(|h| h.to_string());
            (
                FieldControl::Text {
                    placeholder: hint.clone(),
                },
                item.and_then(|i| i.length.clone()).map(FieldValue::Text),
                hint.map(FieldValue::Text),
            )
        }
        FieldName::Subtype => {
            let options = spec.subtype_domain.clone().unwrap_or_default();
            let first = options.first().cloned();
            (
                FieldControl::Select { options },
                item.and_then(|i| i.subtype.clone()).map(FieldValue::Text),
                first.map(FieldValue::Text),
            )
        }
        FieldName::Memo => (
            FieldControl::Text { placeholder: None },
            item.and_then(|i| i.memo.clone()).map(FieldValue::Text),
            Some(FieldValue::Text(String::new())),
        ),
    };

    FormField {
        product: spec.key.clone(),
        product_label: spec.label.clone(),
        field,
        control,
        value,
        default,
        editable: true,
    }
}

/// Customer intake view: a quantity pick per product, plus size and
/// subtype picks for specs that collect them at intake
pub fn intake_form(catalog: &ProductCatalog) -> FormView {
    let mut fields = Vec::new();
    for spec in catalog.specs() {
        fields.push(build_field(
            spec,
            FieldName::Quantity,
            None,
            CUSTOMER_QUANTITY_MAX,
        ));
        if spec.collect_size_at_intake {
            if spec.size_domain().is_some() {
                fields.push(build_field(spec, FieldName::Size, None, CUSTOMER_QUANTITY_MAX));
            }
            if spec.subtype_domain.is_some() {
                fields.push(build_field(
                    spec,
                    FieldName::Subtype,
                    None,
                    CUSTOMER_QUANTITY_MAX,
                ));
            }
        }
    }
    FormView {
        role: FormRole::CustomerIntake,
        fields,
        total_price: None,
    }
}

/// Staff measurement view: every field of every product the order
/// actually contains
///
/// Products with quantity zero are omitted entirely; nothing of theirs
/// gets measured.
pub fn measurement_form(catalog: &ProductCatalog, order: &Order) -> FormView {
    let mut fields = Vec::new();
    for spec in catalog.specs() {
        let item = order.line(&spec.key);
        if item.map_or(0, |i| i.quantity) == 0 {
            continue;
        }
        for field in fields_for(spec) {
            fields.push(build_field(spec, field, item, QUANTITY_MAX));
        }
    }
    FormView {
        role: FormRole::StaffMeasurement,
        fields,
        total_price: Some(order.total_price()),
    }
}

/// Customer final view: the measured fields, read-only, with the total
pub fn final_view(catalog: &ProductCatalog, order: &Order) -> FormView {
    let mut view = measurement_form(catalog, order);
    view.role = FormRole::CustomerFinal;
    for field in &mut view.fields {
        field.editable = false;
        // Read-only views show stored values, never pre-fills
        field.default = None;
    }
    view
}

/// Values collected from a rendered form, in submission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSubmission {
    entries: Vec<(ProductKey, FieldName, FieldValue)>,
}

impl FormSubmission {
    /// An empty submission
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one submitted value
    pub fn set(
        &mut self,
        product: impl Into<ProductKey>,
        field: FieldName,
        value: impl Into<FieldValue>,
    ) {
        self.entries.push((product.into(), field, value.into()));
    }

    /// Builder form of [`FormSubmission::set`]
    pub fn with(
        mut self,
        product: impl Into<ProductKey>,
        field: FieldName,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.set(product, field, value);
        self
    }

    /// Whether nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group the values into one patch per touched line item
    ///
    /// This is the progressive-saving shape: each product's patch can
    /// be persisted on its own. Value types are checked against the
    /// field here; domain membership is checked when the patch is
    /// applied.
    pub fn into_line_patches(self) -> DomainResult<Vec<(ProductKey, LineItemPatch)>> {
        let mut patches: IndexMap<ProductKey, LineItemPatch> = IndexMap::new();
        for (product, field, value) in self.entries {
            let patch = patches.entry(product.clone()).or_default();
            assign(patch, &product, field, value)?;
        }
        Ok(patches.into_iter().collect())
    }

    /// Fold the whole submission into a single aggregate patch
    pub fn into_patch(self) -> DomainResult<OrderPatch> {
        let mut patch = OrderPatch::new();
        for (product, line_patch) in self.into_line_patches()? {
            patch.items.insert(product, line_patch);
        }
        Ok(patch)
    }
}

/// Turn an intake submission into an insertable draft
pub fn draft_from_submission(
    customer: CustomerProfile,
    submission: FormSubmission,
) -> DomainResult<OrderDraft> {
    let mut draft = OrderDraft::new(customer);
    for (product, line_patch) in submission.into_line_patches()? {
        let mut item = LineItem::default();
        line_patch.merge_into(&mut item);
        draft.items.insert(product, item);
    }
    Ok(draft)
}

fn assign(
    patch: &mut LineItemPatch,
    product: &ProductKey,
    field: FieldName,
    value: FieldValue,
) -> DomainResult<()> {
    match field {
        FieldName::Quantity => {
            let n = value.as_integer().ok_or_else(|| {
                DomainError::validation(format!(
                    "Quantity for {product} must be a whole number"
                ))
            })?;
            let quantity = u8::try_from(n).map_err(|_| {
                DomainError::validation(format!(
                    "Quantity {n} for {product} is out of range"
                ))
            })?;
            patch.quantity = Some(quantity);
        }
        FieldName::Waist => {
            let waist = value.as_number().ok_or_else(|| {
                DomainError::validation(format!("Waist for {product} must be numeric"))
            })?;
            patch.waist = Some(waist);
        }
        FieldName::Size => patch.size = Some(expect_text(product, field, value)?),
        FieldName::Length => patch.length = Some(expect_text(product, field, value)?),
        FieldName::Subtype => patch.subtype = Some(expect_text(product, field, value)?),
        FieldName::Memo => patch.memo = Some(expect_text(product, field, value)?),
    }
    Ok(())
}

fn expect_text(product: &ProductKey, field: FieldName, value: FieldValue) -> DomainResult<String> {
    match value {
        FieldValue::Text(s) => Ok(s),
        other => Err(DomainError::validation(format!(
            "{field} for {product} must be text, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SizeDomain;
    use crate::identifiers::OrderId;
    use pretty_assertions::assert_eq;

    fn catalog() -> ProductCatalog {
        ProductCatalog::standard()
    }

    fn order_with_pants_and_shirt() -> Order {
        OrderDraft::new(CustomerProfile::new("Taro", "Kyoto"))
            .with_quantity("shirt", 2)
            .with_quantity("pants", 1)
            .validate_for_insert(&catalog())
            .unwrap()
            .into_order(OrderId::from_raw(1))
    }

    fn key(s: &str) -> ProductKey {
        ProductKey::from(s)
    }

    #[test]
    fn test_fields_for_each_kind() {
        let catalog = catalog();

        let pants = catalog.resolve(&key("pants")).unwrap();
        assert_eq!(
            fields_for(pants),
            vec![
                FieldName::Quantity,
                FieldName::Waist,
                FieldName::Length,
                FieldName::Memo
            ]
        );

        let shirt = catalog.resolve(&key("shirt")).unwrap();
        assert_eq!(
            fields_for(shirt),
            vec![FieldName::Quantity, FieldName::Size, FieldName::Memo]
        );

        let necktie = catalog.resolve(&key("necktie")).unwrap();
        assert_eq!(fields_for(necktie), vec![FieldName::Quantity, FieldName::Memo]);
    }

    #[test]
    fn test_intake_form_is_quantity_only_by_default() {
        let view = intake_form(&catalog());

        assert_eq!(view.role, FormRole::CustomerIntake);
        assert_eq!(view.total_price, None);
        // One quantity pick per product, nothing else
        assert_eq!(view.fields.len(), 11);
        assert!(view.fields.iter().all(|f| f.field == FieldName::Quantity));
        assert!(view.fields.iter().all(|f| f.editable));

        let blazer = &view.fields[0];
        assert_eq!(blazer.product, key("blazer"));
        assert_eq!(blazer.product_label, "ブレザー");
        assert_eq!(
            blazer.control,
            FieldControl::Stepper {
                min: 0,
                max: CUSTOMER_QUANTITY_MAX
            }
        );
        assert_eq!(blazer.value, None);
        assert_eq!(blazer.effective_value(), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn test_intake_form_with_intake_size_flag() {
        let catalog = ProductCatalog::new(vec![ProductSpec::qty_size_memo(
            "shirt",
            "シャツ",
            2000,
            SizeDomain::enumerated(&["S", "M", "L"]),
        )
        .with_intake_size()])
        .unwrap();

        let view = intake_form(&catalog);
        let fields: Vec<_> = view.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec![FieldName::Quantity, FieldName::Size]);

        let size = &view.fields[1];
        assert_eq!(
            size.control,
            FieldControl::Select {
                options: vec!["S".to_string(), "M".to_string(), "L".to_string()]
            }
        );
        assert_eq!(size.default, Some(FieldValue::Text("S".to_string())));
    }

    #[test]
    fn test_measurement_form_skips_zero_quantity_products() {
        let catalog = catalog();
        let order = order_with_pants_and_shirt();
        let view = measurement_form(&catalog, &order);

        assert_eq!(view.role, FormRole::StaffMeasurement);
        assert_eq!(view.total_price, Some(7000));

        // Catalog order: shirt before pants; nothing else ordered
        let products: Vec<_> = view
            .fields
            .iter()
            .map(|f| f.product.as_str().to_string())
            .collect();
        assert!(products.iter().all(|p| p == "shirt" || p == "pants"));
        assert_eq!(products.first().map(String::as_str), Some("shirt"));

        // Shirt: quantity, size, memo; pants: quantity, waist, length, memo
        assert_eq!(view.fields.len(), 3 + 4);
    }

    #[test]
    fn test_measurement_form_controls_and_defaults() {
        let catalog = catalog();
        let order = order_with_pants_and_shirt();
        let view = measurement_form(&catalog, &order);

        let quantity = view
            .fields
            .iter()
            .find(|f| f.product == key("shirt") && f.field == FieldName::Quantity)
            .unwrap();
        assert_eq!(quantity.control, FieldControl::Stepper { min: 0, max: QUANTITY_MAX });
        assert_eq!(quantity.value, Some(FieldValue::Integer(2)));

        let waist = view
            .fields
            .iter()
            .find(|f| f.product == key("pants") && f.field == FieldName::Waist)
            .unwrap();
        match &waist.control {
            FieldControl::Select { options } => {
                assert_eq!(options.len(), 17);
                assert_eq!(options.first().map(String::as_str), Some("61"));
                assert_eq!(options.last().map(String::as_str), Some("109"));
            }
            other => panic!("Expected a select, got {other:?}"),
        }
        assert_eq!(waist.value, None);
        assert_eq!(waist.default, Some(FieldValue::Number(61.0)));

        let length = view
            .fields
            .iter()
            .find(|f| f.product == key("pants") && f.field == FieldName::Length)
            .unwrap();
        assert_eq!(
            length.control,
            FieldControl::Text {
                placeholder: Some("72".to_string())
            }
        );
        assert_eq!(length.effective_value(), Some(&FieldValue::Text("72".to_string())));
    }

    #[test]
    fn test_stored_values_win_over_defaults() {
        let catalog = catalog();
        let mut order = order_with_pants_and_shirt();
        order
            .apply_patch(
                &catalog,
                &OrderPatch::new().line(
                    "pants",
                    LineItemPatch {
                        waist: Some(70.0),
                        ..LineItemPatch::default()
                    },
                ),
            )
            .unwrap();

        let view = measurement_form(&catalog, &order);
        let waist = view
            .fields
            .iter()
            .find(|f| f.product == key("pants") && f.field == FieldName::Waist)
            .unwrap();
        assert_eq!(waist.value, Some(FieldValue::Number(70.0)));
        assert_eq!(waist.effective_value(), Some(&FieldValue::Number(70.0)));
    }

    #[test]
    fn test_final_view_is_read_only() {
        let catalog = catalog();
        let order = order_with_pants_and_shirt();
        let view = final_view(&catalog, &order);

        assert_eq!(view.role, FormRole::CustomerFinal);
        assert_eq!(view.total_price, Some(7000));
        assert!(view.fields.iter().all(|f| !f.editable));
        assert!(view.fields.iter().all(|f| f.default.is_none()));
    }

    #[test]
    fn test_submission_groups_into_line_patches() {
        let submission = FormSubmission::new()
            .with("pants", FieldName::Quantity, FieldValue::Integer(1))
            .with("pants", FieldName::Waist, FieldValue::Number(70.0))
            .with("pants", FieldName::Length, "72")
            .with("shirt", FieldName::Size, "M");

        let patches = submission.into_line_patches().unwrap();
        assert_eq!(patches.len(), 2);

        let (pants_key, pants) = &patches[0];
        assert_eq!(pants_key, &key("pants"));
        assert_eq!(pants.quantity, Some(1));
        assert_eq!(pants.waist, Some(70.0));
        assert_eq!(pants.length.as_deref(), Some("72"));
        assert_eq!(pants.memo, None);

        let (_, shirt) = &patches[1];
        assert_eq!(shirt.size.as_deref(), Some("M"));
    }

    #[test]
    fn test_submission_accepts_integer_waist() {
        // Untagged values parse whole numbers as integers; waist widens
        let patch = FormSubmission::new()
            .with("pants", FieldName::Waist, FieldValue::Integer(70))
            .into_patch()
            .unwrap();
        assert_eq!(patch.items[&key("pants")].waist, Some(70.0));
    }

    #[test]
    fn test_submission_type_errors() {
        let err = FormSubmission::new()
            .with("shirt", FieldName::Quantity, "two")
            .into_patch()
            .unwrap_err();
        assert!(err.to_string().contains("must be a whole number"));

        let err = FormSubmission::new()
            .with("pants", FieldName::Waist, "seventy")
            .into_patch()
            .unwrap_err();
        assert!(err.to_string().contains("must be numeric"));

        let err = FormSubmission::new()
            .with("shirt", FieldName::Size, FieldValue::Number(3.5))
            .into_patch()
            .unwrap_err();
        assert!(err.to_string().contains("must be text"));

        let err = FormSubmission::new()
            .with("shirt", FieldName::Quantity, FieldValue::Integer(300))
            .into_patch()
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_draft_from_submission() {
        let submission = FormSubmission::new()
            .with("shirt", FieldName::Quantity, FieldValue::Integer(2))
            .with("pants", FieldName::Quantity, FieldValue::Integer(0));

        let draft = draft_from_submission(
            CustomerProfile::new("Taro", "Kyoto"),
            submission,
        )
        .unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[&key("shirt")].quantity, 2);

        let validated = draft.validate_for_insert(&catalog()).unwrap();
        assert_eq!(validated.total_price(), 4000);
    }

    #[test]
    fn test_field_value_serde_untagged() {
        assert_eq!(
            serde_json::from_value::<FieldValue>(serde_json::json!(3)).unwrap(),
            FieldValue::Integer(3)
        );
        assert_eq!(
            serde_json::from_value::<FieldValue>(serde_json::json!(22.5)).unwrap(),
            FieldValue::Number(22.5)
        );
        assert_eq!(
            serde_json::from_value::<FieldValue>(serde_json::json!("M")).unwrap(),
            FieldValue::Text("M".to_string())
        );

        assert_eq!(FieldValue::Number(70.0).to_string(), "70");
        assert_eq!(FieldValue::Number(22.5).to_string(), "22.5");
        assert_eq!(FieldValue::Integer(4).to_string(), "4");
    }
}
