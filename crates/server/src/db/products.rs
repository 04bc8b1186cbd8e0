//! Product catalog repository.
//!
//! Listing/search/sort, nearest-color matching, and related-product lookup
//! are all delegated to remote procedures; this repository only shapes their
//! inputs and outputs. Direct table reads are limited to slug lookups and
//! the pricing snapshot used at order creation.

use std::collections::HashMap;

use sqlx::PgPool;

use warna_moto_core::{ProductId, Rupiah};

use super::RepositoryError;
use crate::models::product::{ColorMatch, Product, ProductPricing};

/// Database row for a product.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    slug: String,
    name: String,
    description: Option<String>,
    category: String,
    color_hex: Option<String>,
    price: Rupiah,
    weight_grams: i32,
    stock: i32,
    image_url: Option<String>,
    sku: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            category: row.category,
            color_hex: row.color_hex,
            price: row.price,
            weight_grams: row.weight_grams,
            stock: row.stock,
            image_url: row.image_url,
            sku: row.sku,
        }
    }
}

/// Database row for a nearest-color hit.
#[derive(sqlx::FromRow)]
struct ColorMatchRow {
    #[sqlx(flatten)]
    product: ProductRow,
    distance: f64,
}

/// Parameters for the catalog search procedure.
#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Sort key understood by the procedure (`newest`, `price_asc`,
    /// `price_desc`, `name`).
    pub sort: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search and sort the catalog via the `search_and_sort_products`
    /// procedure.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn search(&self, params: &ProductSearch) -> Result<Vec<Product>, RepositoryError> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, slug, name, description, category, color_hex,
                   price, weight_grams, stock, image_url, sku
            FROM search_and_sort_products($1, $2, $3, $4, $5)
            ",
        )
        .bind(params.search.as_deref())
        .bind(params.category.as_deref())
        .bind(params.sort.as_deref())
        .bind(params.per_page)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, slug, name, description, category, color_hex,
                   price, weight_grams, stock, image_url, sku
            FROM store.products
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Related products for a product detail page, via the
    /// `get_related_products` procedure.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn related(
        &self,
        product_id: ProductId,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, slug, name, description, category, color_hex,
                   price, weight_grams, stock, image_url, sku
            FROM get_related_products($1, $2)
            ",
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Nearest-color search via the `find_closest_colors` procedure.
    ///
    /// The hex code must already be validated (`#RRGGBB`); the color
    /// distance metric is the procedure's concern.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn match_colors(
        &self,
        hex: &str,
        limit: i64,
    ) -> Result<Vec<ColorMatch>, RepositoryError> {
        let rows = sqlx::query_as::<_, ColorMatchRow>(
            r"
            SELECT id, slug, name, description, category, color_hex,
                   price, weight_grams, stock, image_url, sku, distance
            FROM find_closest_colors($1, $2)
            ",
        )
        .bind(hex)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ColorMatch {
                product: row.product.into(),
                distance: row.distance,
            })
            .collect())
    }

    /// Current pricing for a set of products, keyed by id.
    ///
    /// Order creation uses this to re-price submitted cart lines against
    /// the catalog instead of trusting client-side prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pricing_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductPricing>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct PricingRow {
            id: ProductId,
            name: String,
            sku: Option<String>,
            image_url: Option<String>,
            price: Rupiah,
            weight_grams: i32,
        }

        let ids: Vec<i32> = product_ids.iter().map(|id| id.as_i32()).collect();

        let rows = sqlx::query_as::<_, PricingRow>(
            r"
            SELECT id, name, sku, image_url, price, weight_grams
            FROM store.products
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    ProductPricing {
                        id: row.id,
                        name: row.name,
                        sku: row.sku,
                        image_url: row.image_url,
                        price: row.price,
                        weight_grams: row.weight_grams,
                    },
                )
            })
            .collect())
    }
}
