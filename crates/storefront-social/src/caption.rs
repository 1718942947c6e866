//! Caption composition for product posts.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use storefront_core::{
    coerce_offer_percent, coerce_stock_status, OfferPercent, Product, StockStatus,
};

pub const CAPTION_SEPARATOR: &str = "  ·  ";

/// The product fields a caption is built from.
///
/// Deserializable so an operator can post an ad-hoc product that is not in
/// the catalog. Unrecognised `stock_status` and `offer_percent` values read
/// as absent, the same as on product writes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptionSource {
    pub name: String,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub image: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "lenient_stock_status")]
    pub stock_status: Option<StockStatus>,
    pub is_new: bool,
    #[serde(deserialize_with = "lenient_offer_percent")]
    pub offer_percent: Option<OfferPercent>,
    pub category: Option<String>,
}

fn lenient_stock_status<'de, D>(deserializer: D) -> Result<Option<StockStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_stock_status))
}

fn lenient_offer_percent<'de, D>(deserializer: D) -> Result<Option<OfferPercent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_offer_percent))
}

impl From<&Product> for CaptionSource {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: Some(product.price),
            currency: Some(product.currency.clone()),
            image: product.image.clone(),
            slug: Some(product.slug.clone()),
            stock_status: product.stock_status,
            is_new: product.is_new,
            offer_percent: product.offer_percent,
            category: product.category.clone(),
        }
    }
}

/// Builds the post caption. Empty pieces are dropped before joining.
#[must_use]
pub fn compose_caption(source: &CaptionSource, public_base_url: &str) -> String {
    let price = match (source.price, source.currency.as_deref().map(str::trim)) {
        (Some(price), Some(currency)) if price > Decimal::ZERO && !currency.is_empty() => {
            format!("— {currency} {}", group_thousands(price))
        }
        _ => String::new(),
    };

    let offer = source
        .offer_percent
        .map(|o| format!("({}% off)", o.percent()))
        .unwrap_or_default();

    let new_marker = if source.is_new { "NEW arrival ✨" } else { "" };

    let restock = if source.stock_status == Some(StockStatus::Restock) {
        "Restocking soon"
    } else {
        ""
    };

    let hashtag = source
        .category
        .as_deref()
        .map(|c| c.split_whitespace().collect::<String>())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .unwrap_or_default();

    let link = source
        .slug
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|slug| format!("{}/p/{slug}", public_base_url.trim_end_matches('/')))
        .unwrap_or_default();

    [
        source.name.trim(),
        price.as_str(),
        offer.as_str(),
        new_marker,
        restock,
        hashtag.as_str(),
        link.as_str(),
    ]
    .into_iter()
    .filter(|piece| !piece.is_empty())
    .collect::<Vec<_>>()
    .join(CAPTION_SEPARATOR)
}

/// Formats a price with comma-grouped thousands, e.g. `12500.5` → `12,500.5`.
#[must_use]
pub fn group_thousands(value: Decimal) -> String {
    let rendered = value.round_dp(3).normalize().to_string();
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
