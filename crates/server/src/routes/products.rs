//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::db::products::{ProductRepository, ProductSearch};
use crate::error::{AppError, Result};
use crate::models::product::Product;
use crate::state::AppState;

/// Default page size for catalog listings.
const DEFAULT_PER_PAGE: i64 = 12;

/// Page size ceiling, to bound procedure work.
const MAX_PER_PAGE: i64 = 48;

/// How many related products a detail page shows.
const RELATED_LIMIT: i64 = 4;

/// Query parameters for catalog search.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Catalog listing payload.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub page: i64,
    pub per_page: i64,
}

/// GET /api/products
///
/// Search, filter, sort, and paginate the catalog.
///
/// # Errors
///
/// Returns 500 if the catalog procedure fails.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let params = ProductSearch {
        search: query.search,
        category: query.category,
        sort: query.sort,
        page,
        per_page,
    };

    let products = ProductRepository::new(state.pool()).search(&params).await?;

    Ok(Json(ProductListResponse {
        products,
        page,
        per_page,
    }))
}

/// GET /api/products/{slug}
///
/// # Errors
///
/// Returns 404 if no product has the slug.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    Ok(Json(product))
}

/// GET /api/products/{slug}/related
///
/// # Errors
///
/// Returns 404 if no product has the slug.
pub async fn related(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let related = repo.related(product.id, RELATED_LIMIT).await?;

    Ok(Json(related))
}
