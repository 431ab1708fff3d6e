//! Typed decoding of product and kit write payloads.
//!
//! Writes arrive either as `multipart/form-data` or as a JSON object. The
//! transport layer flattens both into [`FormFields`] (field name → text) and
//! this module turns that into [`ProductInput`] / [`KitInput`]. Child batches
//! (`variants_json`, `finishings_json`, `upsells_json`, `products_json`) are
//! JSON arrays embedded in a single field; they decode into a
//! [`BatchField`] so a broken batch never fails the enclosing write.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pricing::parse_price;
use crate::slug::slugify;
use crate::PayloadError;

const MAX_NAME_LEN: usize = 200;
const MAX_PRODUCTION_TIME_LEN: usize = 50;

// ---------------------------------------------------------------------------
// Raw fields
// ---------------------------------------------------------------------------

/// Flat text fields of a write request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. A repeated name keeps the last value, as HTML forms do.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// First present field among `names`.
    #[must_use]
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten a JSON object body.
    ///
    /// Strings are kept as-is, `null` becomes an empty string and every other
    /// value (numbers, booleans, arrays, objects) is stored as its JSON text,
    /// so `"variants": [...]` decodes exactly like a `variants_json` form field.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotAnObject`] if `value` is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, PayloadError> {
        let Value::Object(map) = value else {
            return Err(PayloadError::NotAnObject);
        };
        let mut fields = Self::new();
        for (name, value) in map {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            fields.insert(name, text);
        }
        Ok(fields)
    }
}

// ---------------------------------------------------------------------------
// Child batches
// ---------------------------------------------------------------------------

/// Outcome of decoding one child-batch field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchField<T> {
    /// The field was not sent (or was blank): leave the relation untouched.
    Absent,
    /// The field was sent but is not a JSON array: leave the relation
    /// untouched and log the reason.
    Malformed(String),
    /// Replace the relation with exactly these entries.
    Supplied(Vec<T>),
}

impl<T> BatchField<T> {
    #[must_use]
    pub fn supplied(&self) -> Option<&[T]> {
        match self {
            BatchField::Supplied(items) => Some(items),
            BatchField::Absent | BatchField::Malformed(_) => None,
        }
    }
}

/// One priced variant in a `variants_json` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    pub price: Decimal,
}

fn decode_array(raw: Option<&str>) -> Result<Option<Vec<Value>>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(Some(items)),
        Ok(other) => Err(format!("expected a JSON array, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a `variants_json` field.
///
/// Entries without a non-blank `name` or with a price that is not a
/// non-negative decimal are dropped; the remaining entries form the batch,
/// which may therefore be empty.
#[must_use]
pub fn decode_variants(raw: Option<&str>) -> BatchField<VariantSpec> {
    match decode_array(raw) {
        Ok(None) => BatchField::Absent,
        Err(reason) => BatchField::Malformed(reason),
        Ok(Some(items)) => BatchField::Supplied(items.iter().filter_map(variant_entry).collect()),
    }
}

fn variant_entry(value: &Value) -> Option<VariantSpec> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let price = match value.get("price")? {
        Value::String(s) => parse_price(s)?,
        Value::Number(n) => parse_price(&n.to_string())?,
        _ => return None,
    };
    Some(VariantSpec {
        name: name.chars().take(MAX_NAME_LEN).collect(),
        price,
    })
}

/// Decode an ID-list field such as `finishings_json` (`[1, 2, "5"]`).
///
/// Non-positive or non-integer entries are dropped and duplicates removed,
/// keeping first-seen order.
#[must_use]
pub fn decode_id_list(raw: Option<&str>) -> BatchField<i64> {
    match decode_array(raw) {
        Ok(None) => BatchField::Absent,
        Err(reason) => BatchField::Malformed(reason),
        Ok(Some(items)) => {
            let mut seen = HashSet::new();
            let ids = items
                .iter()
                .filter_map(id_entry)
                .filter(|id| seen.insert(*id))
                .collect();
            BatchField::Supplied(ids)
        }
    }
}

fn id_entry(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

fn present<'a>(fields: &'a FormFields, name: &str) -> Option<&'a str> {
    fields.get(name).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(field: &'static str, raw: &str) -> Result<bool, PayloadError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(PayloadError::Invalid {
            field,
            reason: format!("expected a boolean, got '{raw}'"),
        }),
    }
}

fn bool_field(fields: &FormFields, field: &'static str) -> Result<Option<bool>, PayloadError> {
    present(fields, field)
        .map(|raw| parse_bool(field, raw))
        .transpose()
}

fn name_field(fields: &FormFields) -> Result<Option<String>, PayloadError> {
    let Some(raw) = fields.get("name") else {
        return Ok(None);
    };
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(PayloadError::Invalid {
            field: "name",
            reason: format!("must be 1-{MAX_NAME_LEN} characters"),
        });
    }
    Ok(Some(name.to_string()))
}

fn slug_field(fields: &FormFields) -> Result<Option<String>, PayloadError> {
    let Some(raw) = present(fields, "slug") else {
        return Ok(None);
    };
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(PayloadError::Invalid {
            field: "slug",
            reason: format!("'{raw}' contains no URL-safe characters"),
        });
    }
    Ok(Some(slug))
}

#[allow(clippy::option_option)]
fn nullable_text(fields: &FormFields, field: &str) -> Option<Option<String>> {
    fields.get(field).map(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn id_field(fields: &FormFields, field: &'static str) -> Result<Option<i64>, PayloadError> {
    present(fields, field)
        .map(|raw| {
            raw.parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| PayloadError::Invalid {
                    field,
                    reason: format!("expected a positive integer id, got '{raw}'"),
                })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Decoded product write.
///
/// Every scalar is optional so the same type serves create and partial
/// update; `None` means "not sent, keep the current value".
// Option<Option<T>>: outer None = not sent, Some(None) = cleared.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<String>,
    pub production_time: Option<String>,
    pub category_id: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_per_unit_price: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub discount_percent: Option<i16>,
    pub variants: BatchField<VariantSpec>,
    pub finishings: BatchField<i64>,
    pub upsells: BatchField<i64>,
}

impl ProductInput {
    /// Validate and decode product fields.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Invalid`] when a scalar field is present but
    /// unusable. Child batches never produce errors.
    pub fn from_fields(fields: &FormFields) -> Result<Self, PayloadError> {
        let production_time = match fields.get("production_time").map(str::trim) {
            Some(t) if t.chars().count() > MAX_PRODUCTION_TIME_LEN => {
                return Err(PayloadError::Invalid {
                    field: "production_time",
                    reason: format!("must be at most {MAX_PRODUCTION_TIME_LEN} characters"),
                })
            }
            other => other.map(ToOwned::to_owned),
        };

        let discount_percent = present(fields, "discount_percent")
            .map(|raw| {
                raw.parse::<i16>()
                    .ok()
                    .filter(|p| (0..=100).contains(p))
                    .ok_or_else(|| PayloadError::Invalid {
                        field: "discount_percent",
                        reason: format!("must be an integer between 0 and 100, got '{raw}'"),
                    })
            })
            .transpose()?;

        Ok(Self {
            name: name_field(fields)?,
            slug: slug_field(fields)?,
            description: nullable_text(fields, "description"),
            image: present(fields, "image").map(ToOwned::to_owned),
            production_time,
            category_id: id_field(fields, "category")?,
            is_active: bool_field(fields, "is_active")?,
            is_featured: bool_field(fields, "is_featured")?,
            is_per_unit_price: bool_field(fields, "is_per_unit_price")?,
            is_on_sale: bool_field(fields, "is_on_sale")?,
            discount_percent,
            variants: decode_variants(fields.get_any(&["variants_json", "variants"])),
            finishings: decode_id_list(fields.get_any(&["finishings_json", "finishings"])),
            upsells: decode_id_list(fields.get_any(&["upsells_json", "upsells"])),
        })
    }

    /// Fields a new product cannot do without: `(name, category_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Missing`] naming the first absent field.
    pub fn required_for_create(&self) -> Result<(&str, i64), PayloadError> {
        let name = self
            .name
            .as_deref()
            .ok_or(PayloadError::Missing { field: "name" })?;
        let category_id = self
            .category_id
            .ok_or(PayloadError::Missing { field: "category" })?;
        Ok((name, category_id))
    }
}

// ---------------------------------------------------------------------------
// Kits
// ---------------------------------------------------------------------------

/// Decoded kit write; same optional semantics as [`ProductInput`].
#[allow(clippy::option_option)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub products: BatchField<i64>,
}

impl KitInput {
    /// Validate and decode kit fields.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Invalid`] when a scalar field is present but
    /// unusable.
    pub fn from_fields(fields: &FormFields) -> Result<Self, PayloadError> {
        let price = present(fields, "price")
            .map(|raw| {
                parse_price(raw).ok_or_else(|| PayloadError::Invalid {
                    field: "price",
                    reason: format!("expected a non-negative decimal, got '{raw}'"),
                })
            })
            .transpose()?;

        Ok(Self {
            name: name_field(fields)?,
            slug: slug_field(fields)?,
            description: nullable_text(fields, "description"),
            image: present(fields, "image").map(ToOwned::to_owned),
            price,
            is_active: bool_field(fields, "is_active")?,
            products: decode_id_list(fields.get_any(&["products_json", "products"])),
        })
    }

    /// Fields a new kit cannot do without: `(name, price)`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Missing`] naming the first absent field.
    pub fn required_for_create(&self) -> Result<(&str, Decimal), PayloadError> {
        let name = self
            .name
            .as_deref()
            .ok_or(PayloadError::Missing { field: "name" })?;
        let price = self.price.ok_or(PayloadError::Missing { field: "price" })?;
        Ok((name, price))
    }
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
