use std::collections::HashMap;

use actix_web::{web, HttpResponse};

use crate::db::repository::{self, ProductWithCategory};
use crate::error::{ApiError, ApiResult};
use crate::models::CatalogQuery;
use crate::AppState;

/// Storefront ordering: featured products first, sorted by their manual
/// order index, then the rest newest-first (already ordered by the query).
/// A featured product whose order entry is missing sorts to the end of the
/// featured block rather than being dropped.
pub fn merge_catalog(
    mut featured: Vec<ProductWithCategory>,
    order_index: &HashMap<i32, i32>,
    rest: Vec<ProductWithCategory>,
) -> Vec<ProductWithCategory> {
    featured.sort_by_key(|product| order_index.get(&product.id).copied().unwrap_or(i32::MAX));
    featured.extend(rest);
    featured
}

pub async fn get_catalog(
    state: web::Data<AppState>,
    query: web::Query<CatalogQuery>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let search = query.search.as_deref();
    let category_ids = query.category_ids();

    let featured = repository::catalog_products(conn, true, search, &category_ids)?;
    let rest = repository::catalog_products(conn, false, search, &category_ids)?;
    let order_index: HashMap<i32, i32> =
        repository::order_index_by_product(conn)?.into_iter().collect();

    Ok(HttpResponse::Ok().json(merge_catalog(featured, &order_index, rest)))
}

pub async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    match repository::get_product_with_category(conn, id)? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ApiError::NotFound(format!("product {} not found", id))),
    }
}

pub async fn get_categories(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let categories = repository::get_all_categories(conn)?;
    Ok(HttpResponse::Ok().json(categories))
}
