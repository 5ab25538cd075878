//! Identifier types for orders, sessions, and catalog products

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order ID - assigned by the repository on insert
///
/// Order ids are sequential integers handed out by the backing store,
/// not generated by the domain. An `OrderId` in hand therefore always
/// refers to a record that existed at some point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create from a raw repository-assigned value
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying integer
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OrderId> for u64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Session ID - identifies one customer or staff session
///
/// Sessions are not entities - they live only as long as the client
/// interaction and never touch the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SessionId> for Uuid {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl From<&SessionId> for Uuid {
    fn from(id: &SessionId) -> Self {
        id.0
    }
}

/// Product key - identifies a product within the catalog
///
/// Keys are stable strings ("shirt", "pants", ...) shared between the
/// catalog table and the per-order line-item map.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ProductKey(String);

impl ProductKey {
    /// Create from a string
    pub fn from(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test SessionId creation and uniqueness
    ///
    /// ```mermaid
    /// graph LR
    ///     A[SessionId::new] -->|UUID v4| B[Unique ID]
    ///     C[SessionId::new] -->|UUID v4| D[Different ID]
    ///     B -->|Not Equal| D
    /// ```
    #[test]
    fn test_session_id_new() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();

        // IDs should be unique
        assert_ne!(id1, id2);

        // IDs should not be nil
        assert!(!id1.as_uuid().is_nil());
        assert!(!id2.as_uuid().is_nil());
    }

    /// Test SessionId from UUID
    #[test]
    fn test_session_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = SessionId::from_uuid(uuid);

        assert_eq!(id.as_uuid(), &uuid);
    }

    /// Test OrderId ordering matches the raw value
    #[test]
    fn test_order_id_ordering() {
        let a = OrderId::from_raw(1);
        let b = OrderId::from_raw(2);

        assert!(a < b);
        assert_eq!(a.as_u64(), 1);
        assert_eq!(u64::from(b), 2);
    }

    /// Test OrderId display formatting
    #[test]
    fn test_order_id_display() {
        let id = OrderId::from_raw(42);
        assert_eq!(format!("{}", id), "42");
    }

    /// Test OrderId serializes transparently
    #[test]
    fn test_order_id_serde() {
        let original = OrderId::from_raw(7);

        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "7");

        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    /// Test ProductKey construction and display
    #[test]
    fn test_product_key() {
        let key = ProductKey::from("shirt");

        assert_eq!(key.as_str(), "shirt");
        assert_eq!(format!("{}", key), "shirt");
        assert_eq!(ProductKey::from("shirt".to_string()), key);
    }

    /// Test IDs as map keys
    #[test]
    fn test_ids_as_keys() {
        use std::collections::BTreeMap;

        let mut orders = BTreeMap::new();
        orders.insert(OrderId::from_raw(3), "third");
        orders.insert(OrderId::from_raw(1), "first");

        // BTreeMap iterates in ascending id order
        let keys: Vec<_> = orders.keys().map(|k| k.as_u64()).collect();
        assert_eq!(keys, vec![1, 3]);

        let mut items = BTreeMap::new();
        items.insert(ProductKey::from("pants"), 1u8);
        items.insert(ProductKey::from("shirt"), 2u8);
        assert_eq!(items.get(&ProductKey::from("shirt")), Some(&2));
    }
}
