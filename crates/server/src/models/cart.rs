//! Cart domain types.

use serde::Serialize;

use warna_moto_core::{ProductId, Rupiah};

/// A line in a customer's cart, denormalized with the product fields the
/// cart page needs.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub unit_price: Rupiah,
    pub image_url: Option<String>,
    pub weight_grams: i32,
}

impl CartItem {
    /// The line total (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Rupiah {
        self.unit_price * i64::from(self.quantity)
    }
}

/// A customer's cart with derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Rupiah,
    pub item_count: i64,
    /// Total shipment weight, used for shipping quotes.
    pub total_weight_grams: i64,
}

impl CartSummary {
    /// Build a summary from cart lines.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let subtotal = items.iter().map(CartItem::line_total).sum();
        let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
        let total_weight_grams = items
            .iter()
            .map(|i| i64::from(i.quantity) * i64::from(i.weight_grams))
            .sum();

        Self {
            items,
            subtotal,
            item_count,
            total_weight_grams,
        }
    }

    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_items(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: i32, price: i64, quantity: i32, weight: i32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            quantity,
            name: format!("product-{product_id}"),
            unit_price: Rupiah::from_whole(price),
            image_url: None,
            weight_grams: weight,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(
            item(1, 100_000, 2, 500).line_total(),
            Rupiah::from_whole(200_000)
        );
    }

    #[test]
    fn test_summary_totals() {
        let summary =
            CartSummary::from_items(vec![item(1, 100_000, 2, 400), item(2, 50_000, 1, 250)]);

        assert_eq!(summary.subtotal, Rupiah::from_whole(250_000));
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total_weight_grams, 1_050);
    }

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::empty();
        assert_eq!(summary.subtotal, Rupiah::ZERO);
        assert_eq!(summary.item_count, 0);
        assert!(summary.items.is_empty());
    }
}
