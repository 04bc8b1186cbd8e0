//! Product catalog domain types.

use serde::Serialize;

use warna_moto_core::{ProductId, Rupiah};

/// A catalog product as returned by listing, detail, and related-product
/// queries.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    /// Paint color as `#RRGGBB`, when the product is a paint.
    pub color_hex: Option<String>,
    pub price: Rupiah,
    pub weight_grams: i32,
    pub stock: i32,
    pub image_url: Option<String>,
    pub sku: Option<String>,
}

/// A nearest-color search hit: a product plus its distance from the
/// requested color, as computed by the remote `find_closest_colors`
/// procedure.
#[derive(Debug, Clone, Serialize)]
pub struct ColorMatch {
    #[serde(flatten)]
    pub product: Product,
    pub distance: f64,
}

/// Current catalog pricing for a product, used to re-price submitted cart
/// lines at order creation.
#[derive(Debug, Clone)]
pub struct ProductPricing {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub price: Rupiah,
    pub weight_grams: i32,
}

/// Validate a `#RRGGBB` hex color string.
#[must_use]
pub fn is_valid_hex_color(hex: &str) -> bool {
    let Some(digits) = hex.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hex_colors() {
        assert!(is_valid_hex_color("#A1B2C3"));
        assert!(is_valid_hex_color("#ffffff"));
        assert!(is_valid_hex_color("#000000"));
    }

    #[test]
    fn test_invalid_hex_colors() {
        assert!(!is_valid_hex_color("A1B2C3")); // missing #
        assert!(!is_valid_hex_color("#FFF")); // shorthand not accepted
        assert!(!is_valid_hex_color("#GGGGGG")); // non-hex digits
        assert!(!is_valid_hex_color("#A1B2C3D4")); // too long
        assert!(!is_valid_hex_color(""));
    }
}
