//! Featured-product ordering: a manually ordered pointer list over the
//! products table. order_index is rewritten as a dense 0..n-1 sequence on
//! every reorder, so no duplicate or gap state arises under a single
//! writer. Concurrent writers race as last-full-write-wins; there is no
//! version check.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AdminSession;
use crate::db::models::FeaturedOrder;
use crate::db::repository;
use crate::error::{ApiError, ApiResult};
use crate::models::{AdminProductQuery, FeaturedToggleRequest, ReorderRequest};
use crate::AppState;

/// Moves the entry at `from` to position `to` (remove-then-insert splice)
/// and rewrites every order_index to its new array position. Returns the
/// list unchanged when `from == to` or either index is out of range.
pub fn move_entry(mut entries: Vec<FeaturedOrder>, from: usize, to: usize) -> Vec<FeaturedOrder> {
    if from == to || from >= entries.len() || to >= entries.len() {
        return entries;
    }
    let dragged = entries.remove(from);
    entries.insert(to, dragged);
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.order_index = position as i32;
    }
    entries
}

/// Index for a newly featured product: one past the current maximum, or 0
/// when the list is empty.
pub fn next_order_index(current_max: Option<i32>) -> i32 {
    current_max.map_or(0, |max| max + 1)
}

pub async fn get_featured_order(
    state: web::Data<AppState>,
    _session: AdminSession,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let entries = repository::featured_order_with_products(conn)?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Admin product picker for the featured manager screen.
pub async fn admin_products(
    state: web::Data<AppState>,
    _session: AdminSession,
    query: web::Query<AdminProductQuery>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let products = repository::admin_products(conn, query.search.as_deref())?;
    Ok(HttpResponse::Ok().json(products))
}

/// Applies one drag move to the authoritative list and persists the whole
/// reindexed list as a batch upsert. On success the locally computed list
/// is the confirmed state and is returned without a further read; on
/// failure the stored order is untouched and the client refetches.
pub async fn reorder(
    state: web::Data<AppState>,
    _session: AdminSession,
    body: web::Json<ReorderRequest>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let entries = repository::featured_order_entries(conn)?;
    if body.from >= entries.len() || body.to >= entries.len() {
        return Err(ApiError::Validation(format!(
            "positions {}..{} out of range for {} featured entries",
            body.from,
            body.to,
            entries.len()
        )));
    }
    let reordered = move_entry(entries, body.from, body.to);
    repository::upsert_featured_order(conn, &reordered)?;
    log::info!(
        "featured order: moved entry {} -> {} across {} entries",
        body.from,
        body.to,
        reordered.len()
    );
    Ok(HttpResponse::Ok().json(reordered))
}

/// Featured membership toggle. To featured: set the flag, then append an
/// order entry at max+1. To not-featured: clear the flag, then delete the
/// product's entry, leaving the other indices as they are until the next
/// reorder. Responds with re-fetched product and order lists; the re-fetch
/// is the sole consistency mechanism.
pub async fn toggle_featured(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
    body: web::Json<FeaturedToggleRequest>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    let product = repository::get_product(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))?;

    repository::set_product_featured(conn, product.id, body.featured)?;

    if body.featured {
        if repository::featured_entry_for_product(conn, product.id)?.is_none() {
            let index = next_order_index(repository::max_order_index(conn)?);
            repository::insert_featured_entry(conn, product.id, index)?;
            log::info!("featured product {} at index {}", product.id, index);
        }
    } else {
        repository::delete_featured_entry_for_product(conn, product.id)?;
        log::info!("unfeatured product {}", product.id);
    }

    let products = repository::admin_products(conn, None)?;
    let featured_order = repository::featured_order_with_products(conn)?;
    Ok(HttpResponse::Ok().json(json!({
        "products": products,
        "featured_order": featured_order,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn entry(id: i32, product_id: i32, order_index: i32) -> FeaturedOrder {
        FeaturedOrder {
            id,
            product_id,
            order_index,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn positions(entries: &[FeaturedOrder]) -> Vec<(i32, i32)> {
        entries.iter().map(|e| (e.product_id, e.order_index)).collect()
    }

    #[test]
    fn dragging_last_to_front() {
        // A(0), B(1), C(2); dragging C to position 0 yields C(0), A(1), B(2).
        let entries = vec![entry(10, 1, 0), entry(11, 2, 1), entry(12, 3, 2)];
        let moved = move_entry(entries, 2, 0);
        assert_eq!(positions(&moved), vec![(3, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn indices_are_a_dense_permutation_after_any_move() {
        let entries: Vec<_> = (0..6).map(|i| entry(i, i + 100, i)).collect();
        for from in 0..6 {
            for to in 0..6 {
                let moved = move_entry(entries.clone(), from, to);
                let mut indices: Vec<i32> = moved.iter().map(|e| e.order_index).collect();
                indices.sort_unstable();
                assert_eq!(indices, (0..6).collect::<Vec<i32>>());
                for (position, e) in moved.iter().enumerate() {
                    assert_eq!(e.order_index, position as i32);
                }
            }
        }
    }

    #[test]
    fn same_source_and_target_is_a_no_op() {
        let entries = vec![entry(1, 1, 0), entry(2, 2, 1)];
        assert_eq!(move_entry(entries.clone(), 1, 1), entries);
    }

    #[test]
    fn out_of_range_positions_leave_the_list_unchanged() {
        let entries = vec![entry(1, 1, 0), entry(2, 2, 1)];
        assert_eq!(move_entry(entries.clone(), 5, 0), entries);
        assert_eq!(move_entry(entries.clone(), 0, 5), entries);
        assert_eq!(move_entry(Vec::new(), 0, 0), Vec::new());
    }

    #[test]
    fn move_forward_shifts_intermediate_entries_back() {
        let entries = vec![entry(1, 1, 0), entry(2, 2, 1), entry(3, 3, 2), entry(4, 4, 3)];
        let moved = move_entry(entries, 0, 2);
        assert_eq!(positions(&moved), vec![(2, 0), (3, 1), (1, 2), (4, 3)]);
    }

    #[test]
    fn first_featured_product_gets_index_zero() {
        assert_eq!(next_order_index(None), 0);
    }

    #[test]
    fn second_featured_product_gets_index_one() {
        assert_eq!(next_order_index(Some(0)), 1);
    }

    #[test]
    fn next_index_follows_the_maximum_not_the_count() {
        // Un-featuring leaves gaps until the next reorder; appending still
        // has to go past the largest surviving index.
        assert_eq!(next_order_index(Some(7)), 8);
    }
}
