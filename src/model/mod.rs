//! Order record model.
//!
//! The canonical entity graph delivered on the inbound channel: an [`Order`]
//! owning exactly one [`Delivery`], one [`Payment`] and an ordered list of
//! [`Item`]s. Field names on the wire match the storage column names.
//!
//! Decoding is deliberately lenient: absent fields take their zero value and
//! only `order_uid` is checked after a structurally valid parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod fixtures;

#[cfg(test)]
mod tests;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors produced while turning a payload into an [`Order`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Business-rule violations detected after a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("order_uid is required")]
    MissingOrderUid,
}

/// Root entity, keyed by `order_uid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

/// Delivery details, one per order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details, keyed in storage by `transaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// A single line item. Items have no identity of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

impl Order {
    /// Decode and validate an inbound payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let order = Self::from_json(payload)?;
        order.validate()?;
        Ok(order)
    }

    /// Structural decode only. No business rules are applied.
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Check the single mandatory rule: a non-empty `order_uid`.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::MissingOrderUid);
        }
        Ok(())
    }

    /// Encode as the wire JSON payload.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
