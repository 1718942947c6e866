//! WhatsApp enquiry links: orders are handed off as a pre-filled chat
//! message instead of a checkout.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::Visibility;
use storefront_social::group_thousands;

use crate::{Catalog, CatalogError};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnquiryItem {
    pub slug: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnquiryLink {
    pub url: String,
    pub message: String,
    pub total: Decimal,
}

fn ksh(amount: Decimal) -> String {
    format!("KSh {}", group_thousands(amount.round_dp(2)))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

impl Catalog {
    /// Builds a `wa.me` deep link listing the requested published products.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] for an empty list or a zero quantity.
    /// - [`CatalogError::NotFound`] when a slug is unknown or not published.
    pub async fn enquiry_link(
        &self,
        items: &[EnquiryItem],
        public_base_url: &str,
        phone: Option<&str>,
    ) -> Result<EnquiryLink, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Validation(
                "at least one item is required".to_string(),
            ));
        }
        if let Some(item) = items.iter().find(|i| i.qty == 0) {
            return Err(CatalogError::Validation(format!(
                "quantity for '{}' must be at least 1",
                item.slug
            )));
        }

        let site = public_base_url.trim_end_matches('/');
        let slugs: Vec<&str> = items.iter().map(|i| i.slug.as_str()).collect();
        let share_url = format!("{site}/enquiry/{}", encode(&slugs.join(",")));

        let mut lines = vec![
            share_url,
            String::new(),
            "Hello! I'd like to order/enquire:\n".to_string(),
        ];

        let mut total = Decimal::ZERO;
        for (i, item) in items.iter().enumerate() {
            let product = self.get_product_by_slug(&item.slug).await?;
            if product.visibility != Visibility::Published {
                return Err(CatalogError::NotFound(format!("product '{}'", item.slug)));
            }
            total += product.price * Decimal::from(item.qty);
            lines.push(format!(
                "{}. {} ×{} — {}",
                i + 1,
                product.name,
                item.qty,
                ksh(product.price)
            ));
            lines.push(format!("   Link: {site}/p/{}", product.slug));
        }

        lines.push(format!("Total (approx): {}", ksh(total)));
        lines.push("Payment: Cash on Delivery".to_string());
        lines.push("Customer name: ___".to_string());
        lines.push("Location: ___".to_string());
        lines.push("Phone: ___".to_string());

        let message = lines.join("\n");
        let phone: String = phone
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        Ok(EnquiryLink {
            url: format!("https://wa.me/{phone}?text={}", encode(&message)),
            message,
            total,
        })
    }
}
