//! Field-level normalization of operator input into [`ProductChanges`] and
//! [`NewProduct`].
//!
//! Operators send loosely-typed JSON: `offer_percent` may arrive as a number,
//! a numeric string, or garbage, and `stock_status` may be `""`, `null`, or a
//! recognised value. The rules here decide what is actually written.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::products::{
    NewProduct, OfferPercent, ProductChanges, StockStatus, Visibility, DEFAULT_CURRENCY,
};
use crate::slug::slugify;
use crate::CoreError;

/// Deserializes a field that is present in the body, keeping explicit
/// `null` as `Some(null)` so it can be told apart from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Raw PATCH body for a product. Unknown keys are ignored.
#[allow(clippy::option_option)]
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatchInput {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    pub gallery: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub visibility: Option<Visibility>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub stock_status: Option<Value>,
    pub is_banner: Option<bool>,
    pub is_new: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub offer_percent: Option<Value>,
}

impl ProductPatchInput {
    /// Applies the normalization rules and returns the changes to write.
    ///
    /// Stock rules:
    /// - neither `stock_status` nor `in_stock` supplied: neither changes;
    /// - only `in_stock`: `stock_status` follows it (`in_stock`/`out_of_stock`);
    /// - a recognised `stock_status`: `in_stock` is derived from it;
    /// - `stock_status` of `""`, `null`, or an unknown value: stored as null,
    ///   `in_stock` left as supplied (or untouched).
    ///
    /// `offer_percent` outside {10, 30, 50} becomes null.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when a supplied field is invalid
    /// (blank name or slug, negative price, blank currency) or when no
    /// recognised field is present at all.
    pub fn normalize(self) -> Result<ProductChanges, CoreError> {
        let (stock_status, in_stock) = resolve_stock(self.stock_status.as_ref(), self.in_stock);

        let changes = ProductChanges {
            slug: self.slug.as_deref().map(normalize_slug).transpose()?,
            name: self.name.as_deref().map(normalize_name).transpose()?,
            description: self.description,
            price: self.price.map(validate_price).transpose()?,
            currency: self.currency.as_deref().map(normalize_currency).transpose()?,
            image: self.image.map(|img| img.and_then(non_blank)),
            gallery: self.gallery,
            category: self.category.map(|c| c.and_then(non_blank)),
            is_banner: self.is_banner,
            is_new: self.is_new,
            offer_percent: self.offer_percent.as_ref().map(coerce_offer_percent),
            stock_status,
            in_stock,
            visibility: self.visibility,
        };

        if changes.is_empty() {
            return Err(CoreError::Validation(
                "patch contains no recognised fields".to_string(),
            ));
        }

        Ok(changes)
    }
}

/// Raw POST body for a new product.
#[derive(Debug, Default, Deserialize)]
pub struct NewProductInput {
    pub slug: Option<String>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub stock_status: Option<Value>,
    pub is_banner: Option<bool>,
    pub is_new: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub offer_percent: Option<Value>,
}

impl NewProductInput {
    /// Validates the body and fills documented defaults.
    ///
    /// `slug_for` is called with the trimmed name when no slug was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on a blank name, a blank supplied
    /// slug, or a negative price.
    pub fn into_new_product(
        self,
        slug_for: impl FnOnce(&str) -> String,
    ) -> Result<NewProduct, CoreError> {
        let name = normalize_name(&self.name)?;
        let slug = match self.slug.as_deref().and_then(non_blank_str) {
            Some(explicit) => normalize_slug(explicit)?,
            None => slug_for(&name),
        };
        let (stock_status, in_stock) = resolve_stock(self.stock_status.as_ref(), self.in_stock);

        Ok(NewProduct {
            slug,
            name,
            description: self.description.unwrap_or_default(),
            price: validate_price(self.price.unwrap_or(Decimal::ZERO))?,
            currency: match self.currency.as_deref() {
                Some(c) => normalize_currency(c)?,
                None => DEFAULT_CURRENCY.to_string(),
            },
            image: self.image.and_then(non_blank),
            gallery: self.gallery.unwrap_or_default(),
            category: self.category.and_then(non_blank),
            is_banner: self.is_banner.unwrap_or(false),
            is_new: self.is_new.unwrap_or(false),
            offer_percent: self.offer_percent.as_ref().and_then(coerce_offer_percent),
            stock_status: stock_status.flatten(),
            in_stock: in_stock.unwrap_or(true),
            visibility: self.visibility.unwrap_or_default(),
        })
    }
}

/// Resolves the `(stock_status, in_stock)` pair to write.
#[allow(clippy::option_option)]
fn resolve_stock(
    stock_status: Option<&Value>,
    in_stock: Option<bool>,
) -> (Option<Option<StockStatus>>, Option<bool>) {
    match stock_status.map(coerce_stock_status) {
        None => (in_stock.map(|flag| Some(StockStatus::from_in_stock(flag))), in_stock),
        Some(Some(status)) => (Some(Some(status)), Some(status.implies_in_stock())),
        Some(None) => (Some(None), in_stock),
    }
}

/// Reads a stock status; anything unrecognised is `None`.
#[must_use]
pub fn coerce_stock_status(value: &Value) -> Option<StockStatus> {
    value.as_str().and_then(StockStatus::parse)
}

/// Reads an offer from a number or numeric string; anything outside
/// 10/30/50 is `None`.
#[must_use]
pub fn coerce_offer_percent(value: &Value) -> Option<OfferPercent> {
    match value {
        Value::Number(n) => n.as_f64().and_then(OfferPercent::from_number),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(OfferPercent::from_number),
        _ => None,
    }
}

fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name is required".to_string()));
    }
    Ok(trimmed.to_owned())
}

fn normalize_slug(slug: &str) -> Result<String, CoreError> {
    let slug = slugify(slug);
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

fn normalize_currency(currency: &str) -> Result<String, CoreError> {
    let trimmed = currency.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("currency must not be blank".to_string()));
    }
    Ok(trimmed.to_owned())
}

fn validate_price(price: Decimal) -> Result<Decimal, CoreError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CoreError::Validation(format!(
            "price must be non-negative, got {price}"
        )));
    }
    Ok(price)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_owned())
    }
}

fn non_blank_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
