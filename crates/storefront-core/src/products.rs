use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub const DEFAULT_CURRENCY: &str = "KES";

/// Lifecycle state controlling whether a product appears in public listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Visibility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Draft => "draft",
            Visibility::Published => "published",
            Visibility::Archived => "archived",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Visibility::Draft),
            "published" => Ok(Visibility::Published),
            "archived" => Ok(Visibility::Archived),
            other => Err(CoreError::InvalidVisibility(other.to_owned())),
        }
    }
}

/// Tri-state availability signal, distinct from the legacy `in_stock` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    Restock,
}

impl StockStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Restock => "restock",
        }
    }

    /// Parses a recognised status string. Anything else, including `""`,
    /// yields `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(StockStatus::InStock),
            "out_of_stock" => Some(StockStatus::OutOfStock),
            "restock" => Some(StockStatus::Restock),
            _ => None,
        }
    }

    /// The legacy boolean implied by this status.
    #[must_use]
    pub fn implies_in_stock(self) -> bool {
        self == StockStatus::InStock
    }

    #[must_use]
    pub fn from_in_stock(in_stock: bool) -> Self {
        if in_stock {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of discounts a product may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OfferPercent {
    Ten,
    Thirty,
    Fifty,
}

impl OfferPercent {
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            OfferPercent::Ten => 10,
            OfferPercent::Thirty => 30,
            OfferPercent::Fifty => 50,
        }
    }

    /// Accepts exactly 10, 30, or 50; every other value is `None`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_number(value: f64) -> Option<Self> {
        if value == 10.0 {
            Some(OfferPercent::Ten)
        } else if value == 30.0 {
            Some(OfferPercent::Thirty)
        } else if value == 50.0 {
            Some(OfferPercent::Fifty)
        } else {
            None
        }
    }
}

impl TryFrom<u8> for OfferPercent {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OfferPercent::from_number(f64::from(value))
            .ok_or_else(|| format!("offer_percent must be 10, 30, or 50, got {value}"))
    }
}

impl TryFrom<i16> for OfferPercent {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        OfferPercent::from_number(f64::from(value))
            .ok_or_else(|| format!("offer_percent must be 10, 30, or 50, got {value}"))
    }
}

impl From<OfferPercent> for u8 {
    fn from(value: OfferPercent) -> Self {
        value.percent()
    }
}

/// A catalog product as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    /// Denormalized reference to `Category.name`, not an id.
    pub category: Option<String>,
    pub is_banner: bool,
    pub is_new: bool,
    pub offer_percent: Option<OfferPercent>,
    pub stock_status: Option<StockStatus>,
    /// Legacy flag kept roughly in sync with `stock_status`.
    pub in_stock: bool,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Applies normalized changes in place. Does not touch `updated_at`.
    pub fn apply(&mut self, changes: &ProductChanges) {
        if let Some(ref slug) = changes.slug {
            self.slug.clone_from(slug);
        }
        if let Some(ref name) = changes.name {
            self.name.clone_from(name);
        }
        if let Some(ref description) = changes.description {
            self.description.clone_from(description);
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(ref currency) = changes.currency {
            self.currency.clone_from(currency);
        }
        if let Some(ref image) = changes.image {
            self.image.clone_from(image);
        }
        if let Some(ref gallery) = changes.gallery {
            self.gallery.clone_from(gallery);
        }
        if let Some(ref category) = changes.category {
            self.category.clone_from(category);
        }
        if let Some(is_banner) = changes.is_banner {
            self.is_banner = is_banner;
        }
        if let Some(is_new) = changes.is_new {
            self.is_new = is_new;
        }
        if let Some(offer) = changes.offer_percent {
            self.offer_percent = offer;
        }
        if let Some(status) = changes.stock_status {
            self.stock_status = status;
        }
        if let Some(in_stock) = changes.in_stock {
            self.in_stock = in_stock;
        }
        if let Some(visibility) = changes.visibility {
            self.visibility = visibility;
        }
    }
}

/// A fully-defaulted product ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub category: Option<String>,
    pub is_banner: bool,
    pub is_new: bool,
    pub offer_percent: Option<OfferPercent>,
    pub stock_status: Option<StockStatus>,
    pub in_stock: bool,
    pub visibility: Visibility,
}

/// Normalized partial update for a product.
///
/// Outer `None` = leave unchanged. For nullable columns, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub image: Option<Option<String>>,
    pub gallery: Option<Vec<String>>,
    pub category: Option<Option<String>>,
    pub is_banner: Option<bool>,
    pub is_new: Option<bool>,
    pub offer_percent: Option<Option<OfferPercent>>,
    pub stock_status: Option<Option<StockStatus>>,
    pub in_stock: Option<bool>,
    pub visibility: Option<Visibility>,
}

impl ProductChanges {
    /// Changes that only move a product to `visibility`.
    #[must_use]
    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when this update makes the target product the banner.
    #[must_use]
    pub fn sets_banner(&self) -> bool {
        self.is_banner == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_round_trips_through_str() {
        for v in [Visibility::Draft, Visibility::Published, Visibility::Archived] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
        }
        assert!(matches!(
            "hidden".parse::<Visibility>(),
            Err(CoreError::InvalidVisibility(ref s)) if s == "hidden"
        ));
    }

    #[test]
    fn stock_status_parse_rejects_unknown_and_empty() {
        assert_eq!(StockStatus::parse("restock"), Some(StockStatus::Restock));
        assert_eq!(StockStatus::parse(""), None);
        assert_eq!(StockStatus::parse("sold_out"), None);
    }

    #[test]
    fn only_in_stock_status_implies_in_stock() {
        assert!(StockStatus::InStock.implies_in_stock());
        assert!(!StockStatus::OutOfStock.implies_in_stock());
        assert!(!StockStatus::Restock.implies_in_stock());
    }

    #[test]
    fn offer_percent_serializes_as_number() {
        let json = serde_json::to_string(&Some(OfferPercent::Thirty)).unwrap();
        assert_eq!(json, "30");
        let parsed: Option<OfferPercent> = serde_json::from_str("50").unwrap();
        assert_eq!(parsed, Some(OfferPercent::Fifty));
        assert!(serde_json::from_str::<OfferPercent>("40").is_err());
    }

    #[test]
    fn offer_percent_from_number_is_exact() {
        assert_eq!(OfferPercent::from_number(10.0), Some(OfferPercent::Ten));
        assert_eq!(OfferPercent::from_number(10.5), None);
        assert_eq!(OfferPercent::from_number(-10.0), None);
        assert_eq!(OfferPercent::from_number(0.0), None);
    }

    #[test]
    fn empty_changes_are_empty() {
        assert!(ProductChanges::default().is_empty());
        assert!(!ProductChanges::visibility(Visibility::Published).is_empty());
    }
}
