//! # Product Model
//!
//! The durable catalog entity and its write payloads.
//!
//! ## Overview
//!
//! A `Product` is the authoritative record served from the primary store and
//! mirrored into the read cache as a disposable snapshot. Write payloads
//! (`NewProduct`, `UpdateProduct`) carry raw caller input and are normalized
//! and validated before they reach a store:
//!
//! - `name` is trimmed and lower-cased, 5-255 chars, unique across products
//! - `quantity` is a non-negative integer
//! - at least one tag is required
//! - `price` is integer cents, rounded on write, minimum 10
//! - `is_active` defaults to false; an active product must carry a price
//!
//! Validation is abort-late: all field problems are collected into one map
//! rather than stopping at the first.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product name length bounds (on the trimmed name)
pub const NAME_MIN_LEN: usize = 5;
pub const NAME_MAX_LEN: usize = 255;

/// Minimum price in cents-equivalent units
pub const PRICE_MIN: i64 = 10;

/// Fixed category vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Kitchen,
    Tech,
    Car,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Kitchen, Category::Tech, Category::Car];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Kitchen => "kitchen",
            Category::Tech => "tech",
            Category::Car => "car",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kitchen" => Ok(Category::Kitchen),
            "tech" => Ok(Category::Tech),
            "car" => Ok(Category::Car),
            other => Err(format!("{other} is not a supported category")),
        }
    }
}

/// Embedded vendor details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub name: String,
    pub bio: Option<String>,
}

/// A catalog product as stored in the primary store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    /// Integer cents; present whenever `is_active` is true
    pub price: Option<i64>,
    pub is_active: bool,
    pub vendor: Option<Vendor>,
    /// Set once at creation, never refreshed
    pub created_at: NaiveDateTime,
    /// Refreshed on every mutation
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Display form of the price, e.g. `"20.00$"`
    pub fn formatted_price(&self) -> Option<String> {
        self.price.map(|price| format!("{price:.2}$", price = price as f64))
    }
}

/// Minimal projection fetched per line item during order validation
#[derive(Debug, Clone, PartialEq)]
pub struct ProductProjection {
    pub product_id: Uuid,
    pub name: String,
    pub price: Option<i64>,
    pub is_active: bool,
    pub quantity: i64,
}

/// Payload for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    /// Raw price; rounded to integer cents on write
    pub price: Option<f64>,
    #[serde(default)]
    pub is_active: bool,
    pub vendor: Option<Vendor>,
}

/// Payload for replacing a product's mutable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub quantity: i64,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub price: Option<f64>,
    pub is_active: bool,
    pub vendor: Option<Vendor>,
}

/// Normalized, validated product fields ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub quantity: i64,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub price: Option<i64>,
    pub is_active: bool,
    pub vendor: Option<Vendor>,
}

fn validate_fields(
    name: &str,
    quantity: i64,
    tags: &[String],
    price: Option<f64>,
) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    let trimmed = name.trim();
    if trimmed.chars().count() < NAME_MIN_LEN || trimmed.chars().count() > NAME_MAX_LEN {
        errors.insert(
            "name".to_string(),
            format!("name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"),
        );
    }

    if quantity < 0 {
        errors.insert(
            "quantity".to_string(),
            "quantity must not be negative".to_string(),
        );
    }

    if tags.is_empty() || tags.iter().any(|tag| tag.trim().is_empty()) {
        errors.insert(
            "tags".to_string(),
            "at least one non-empty tag is required".to_string(),
        );
    }

    match price {
        None => {
            errors.insert("price".to_string(), "price is required".to_string());
        }
        Some(raw) => {
            if !raw.is_finite() || (raw.round() as i64) < PRICE_MIN {
                errors.insert(
                    "price".to_string(),
                    format!("price must be at least {PRICE_MIN}"),
                );
            }
        }
    }

    errors
}

fn normalize(
    name: &str,
    quantity: i64,
    category: Option<Category>,
    tags: &[String],
    price: Option<f64>,
    is_active: bool,
    vendor: Option<Vendor>,
) -> ProductDraft {
    ProductDraft {
        name: name.trim().to_lowercase(),
        quantity,
        category,
        tags: tags.iter().map(|tag| tag.trim().to_string()).collect(),
        price: price.map(|raw| raw.round() as i64),
        is_active,
        vendor,
    }
}

impl NewProduct {
    /// Validate all invariants at once and produce the normalized draft.
    pub fn validate(&self) -> Result<ProductDraft, BTreeMap<String, String>> {
        let errors = validate_fields(&self.name, self.quantity, &self.tags, self.price);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(normalize(
            &self.name,
            self.quantity,
            self.category,
            &self.tags,
            self.price,
            self.is_active,
            self.vendor.clone(),
        ))
    }
}

impl UpdateProduct {
    /// Validate all invariants at once and produce the normalized draft.
    pub fn validate(&self) -> Result<ProductDraft, BTreeMap<String, String>> {
        let errors = validate_fields(&self.name, self.quantity, &self.tags, self.price);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(normalize(
            &self.name,
            self.quantity,
            self.category,
            &self.tags,
            self.price,
            self.is_active,
            self.vendor.clone(),
        ))
    }
}

/// Conjunctive catalog filter; absent fields do not constrain the result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
    /// Inclusive price range in integer cents
    pub price: Option<(i64, i64)>,
    /// Set membership over categories
    pub categories: Option<Vec<Category>>,
    /// Set membership over tags
    pub tags: Option<Vec<String>>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.categories.as_ref().map_or(true, |c| c.is_empty())
            && self.tags.as_ref().map_or(true, |t| t.is_empty())
    }

    /// Canonical filter semantics: substring match on the (normalized) name,
    /// inclusive price range, set membership on categories and tags, all
    /// combined conjunctively. Both read paths must agree with this
    /// predicate.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = self.name.as_ref().map(|n| n.trim().to_lowercase()) {
            if !name.is_empty() && !product.name.contains(&name) {
                return false;
            }
        }

        if let Some((low, high)) = self.price {
            match product.price {
                Some(price) if price >= low && price <= high => {}
                _ => return false,
            }
        }

        if let Some(categories) = self.categories.as_ref().filter(|c| !c.is_empty()) {
            match product.category {
                Some(category) if categories.contains(&category) => {}
                _ => return false,
            }
        }

        if let Some(tags) = self.tags.as_ref().filter(|t| !t.is_empty()) {
            if !product.tags.iter().any(|tag| tags.contains(tag)) {
                return false;
            }
        }

        true
    }
}
