use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::StreamExt;

use crate::auth::AdminSession;
use crate::db::models::{NewCategory, NewProduct, UpdateProduct};
use crate::db::repository;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateCategoryRequest, CreateProductRequest, UpdateProductRequest, PRODUCT_STATUSES,
};
use crate::storage::MediaStore;
use crate::AppState;

// --- validation ---

fn validate_status(status: &str) -> ApiResult<()> {
    if PRODUCT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "status must be one of {:?}",
            PRODUCT_STATUSES
        )))
    }
}

fn validate_new_product(request: &CreateProductRequest) -> ApiResult<()> {
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("product name cannot be empty".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "product description cannot be empty".to_string(),
        ));
    }
    if request.condition.trim().is_empty() {
        return Err(ApiError::Validation(
            "product condition cannot be empty".to_string(),
        ));
    }
    if !request.price.is_finite() || request.price <= 0.0 {
        return Err(ApiError::Validation(
            "price must be greater than 0".to_string(),
        ));
    }
    if request.category_id <= 0 {
        return Err(ApiError::Validation("invalid category id".to_string()));
    }
    if let Some(status) = &request.status {
        validate_status(status)?;
    }
    Ok(())
}

fn validate_update_product(request: &UpdateProductRequest) -> ApiResult<()> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("product name cannot be empty".to_string()));
        }
    }
    if let Some(description) = &request.description {
        if description.trim().is_empty() {
            return Err(ApiError::Validation(
                "product description cannot be empty".to_string(),
            ));
        }
    }
    if let Some(condition) = &request.condition {
        if condition.trim().is_empty() {
            return Err(ApiError::Validation(
                "product condition cannot be empty".to_string(),
            ));
        }
    }
    if let Some(price) = request.price {
        if !price.is_finite() || price <= 0.0 {
            return Err(ApiError::Validation(
                "price must be greater than 0".to_string(),
            ));
        }
    }
    if let Some(category_id) = request.category_id {
        if category_id <= 0 {
            return Err(ApiError::Validation("invalid category id".to_string()));
        }
    }
    if let Some(status) = &request.status {
        validate_status(status)?;
    }
    Ok(())
}

fn validate_category_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("category name cannot be empty".to_string()));
    }
    Ok(name)
}

/// Deletion is blocked while any product still references the category;
/// the check is a count query, not a database constraint.
pub fn category_delete_blocked(dependents: i64) -> Option<ApiError> {
    if dependents > 0 {
        Some(ApiError::Conflict(format!(
            "cannot delete category: {} product(s) still reference it",
            dependents
        )))
    } else {
        None
    }
}

// --- products ---

pub async fn create_product(
    state: web::Data<AppState>,
    _session: AdminSession,
    body: web::Json<CreateProductRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    validate_new_product(&request)?;
    let conn = &mut state.pool.get()?;
    let product = repository::create_product(
        conn,
        NewProduct {
            name: request.name.trim().to_string(),
            description: request.description,
            price: request.price,
            condition: request.condition,
            category_id: request.category_id,
            whatsapp: request.whatsapp,
            location: request.location,
            observation: request.observation,
            status: request
                .status
                .unwrap_or_else(|| repository::STATUS_AVAILABLE.to_string()),
        },
    )?;
    log::info!("created product {} ({})", product.id, product.name);
    Ok(HttpResponse::Created().json(product))
}

pub async fn update_product(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    validate_update_product(&request)?;
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    if repository::get_product(conn, id)?.is_none() {
        return Err(ApiError::NotFound(format!("product {} not found", id)));
    }
    let product = repository::update_product(
        conn,
        id,
        UpdateProduct {
            name: request.name.map(|name| name.trim().to_string()),
            description: request.description,
            price: request.price,
            condition: request.condition,
            category_id: request.category_id,
            whatsapp: request.whatsapp,
            location: request.location,
            observation: request.observation,
            status: request.status,
        },
    )?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_product(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    let deleted = repository::delete_product(conn, id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("product {} not found", id)));
    }
    // The pointer table must not keep entries for products that are gone.
    repository::delete_featured_entry_for_product(conn, id)?;
    log::info!("deleted product {}", id);
    Ok(HttpResponse::NoContent().finish())
}

// --- images ---

/// Cover position after removing the image at `removed`: removing the
/// cover itself falls back to the first image, removing an earlier image
/// shifts the cover left one slot, removing a later image leaves it where
/// it is.
pub fn cover_after_removal(removed: usize, current: i32, remaining: usize) -> i32 {
    if remaining == 0 {
        return 0;
    }
    let current = current.max(0) as usize;
    if removed == current {
        0
    } else if removed < current {
        (current - 1) as i32
    } else {
        current as i32
    }
}

/// Chosen cover position, clamped into the image list. Skipped uploads
/// shrink the list, so a requested index can only ever land on an image
/// that was actually stored.
pub fn resolve_cover_index(requested: Option<usize>, current: i32, image_count: usize) -> i32 {
    if image_count == 0 {
        return 0;
    }
    let wanted = requested.unwrap_or(current.max(0) as usize);
    wanted.min(image_count - 1) as i32
}

/// Best-effort store of uploaded files: a failure on one file is logged and
/// skipped, the remaining files continue. Returns the public URLs of the
/// files that made it.
pub fn store_uploaded_files(
    store: &MediaStore,
    product_id: i32,
    timestamp_millis: i64,
    files: &[(Option<String>, Vec<u8>)],
) -> Vec<String> {
    let mut urls = Vec::new();
    for (seq, (filename, bytes)) in files.iter().enumerate() {
        let original = filename.as_deref().unwrap_or("upload.bin");
        let name = MediaStore::object_name(product_id, timestamp_millis, seq, original);
        match store.save(&name, bytes) {
            Ok(()) => urls.push(store.public_url(&name)),
            Err(err) => log::warn!(
                "skipping image {} for product {}: {}",
                seq,
                product_id,
                err
            ),
        }
    }
    urls
}

/// Multipart upload of product images. Repeated `image` file parts plus an
/// optional `cover_index` text part; stored URLs are appended to the
/// product's existing list.
pub async fn upload_product_images(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    let product = repository::get_product(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))?;

    let mut files: Vec<(Option<String>, Vec<u8>)> = Vec::new();
    let mut requested_cover: Option<usize> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|err| ApiError::Multipart(err.to_string()))?;
        let field_name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|err| ApiError::Multipart(err.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "image" => files.push((filename, bytes)),
            "cover_index" => {
                requested_cover = String::from_utf8_lossy(&bytes).trim().parse().ok();
            }
            other => log::warn!("ignoring unexpected multipart field '{}'", other),
        }
    }

    if files.is_empty() && requested_cover.is_none() {
        return Err(ApiError::Validation("no image parts in upload".to_string()));
    }

    let uploaded = store_uploaded_files(
        &state.media,
        product.id,
        Utc::now().timestamp_millis(),
        &files,
    );
    log::info!(
        "product {}: stored {}/{} uploaded images",
        product.id,
        uploaded.len(),
        files.len()
    );

    // Existing URLs are preserved; new ones are appended. The cover index
    // refers to the combined list.
    let mut images = product.images.clone();
    images.extend(uploaded);
    let cover = resolve_cover_index(requested_cover, product.cover_image_index, images.len());
    let updated = repository::set_product_images(conn, product.id, &images, cover)?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn remove_product_image(
    state: web::Data<AppState>,
    _session: AdminSession,
    path: web::Path<(i32, usize)>,
) -> ApiResult<HttpResponse> {
    let (id, index) = path.into_inner();
    let conn = &mut state.pool.get()?;
    let product = repository::get_product(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))?;
    if index >= product.images.len() {
        return Err(ApiError::Validation(format!(
            "image index {} out of range for {} images",
            index,
            product.images.len()
        )));
    }

    let mut images = product.images.clone();
    images.remove(index);
    let cover = cover_after_removal(index, product.cover_image_index, images.len());
    let updated = repository::set_product_images(conn, product.id, &images, cover)?;
    Ok(HttpResponse::Ok().json(updated))
}

// --- categories ---

pub async fn create_category(
    state: web::Data<AppState>,
    _session: AdminSession,
    body: web::Json<CreateCategoryRequest>,
) -> ApiResult<HttpResponse> {
    let name = validate_category_name(&body.name)?;
    let conn = &mut state.pool.get()?;
    let category = repository::create_category(
        conn,
        NewCategory {
            name: name.to_string(),
        },
    )?;
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
    body: web::Json<CreateCategoryRequest>,
) -> ApiResult<HttpResponse> {
    let name = validate_category_name(&body.name)?;
    let conn = &mut state.pool.get()?;
    match repository::update_category(conn, id.into_inner(), name) {
        Ok(category) => Ok(HttpResponse::Ok().json(category)),
        Err(diesel::result::Error::NotFound) => {
            Err(ApiError::NotFound("category not found".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_category(
    state: web::Data<AppState>,
    _session: AdminSession,
    id: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let id = id.into_inner();
    let dependents = repository::count_products_in_category(conn, id)?;
    if let Some(blocked) = category_delete_blocked(dependents) {
        return Err(blocked);
    }
    let deleted = repository::delete_category(conn, id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("category not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Livro O Alquimista".to_string(),
            description: "Bom estado".to_string(),
            price: 25.0,
            condition: "good".to_string(),
            category_id: 2,
            whatsapp: Some("5511999990000".to_string()),
            location: None,
            observation: None,
            status: None,
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(validate_new_product(&request()).is_ok());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        for field in ["name", "description", "condition"] {
            let mut bad = request();
            match field {
                "name" => bad.name = "   ".to_string(),
                "description" => bad.description = String::new(),
                _ => bad.condition = String::new(),
            }
            assert!(validate_new_product(&bad).is_err(), "{} accepted blank", field);
        }
    }

    #[test]
    fn non_positive_or_non_finite_price_is_rejected() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut bad = request();
            bad.price = price;
            assert!(validate_new_product(&bad).is_err(), "price {} accepted", price);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut bad = request();
        bad.status = Some("lost".to_string());
        assert!(validate_new_product(&bad).is_err());
        bad.status = Some("reserved".to_string());
        assert!(validate_new_product(&bad).is_ok());
    }

    #[test]
    fn partial_update_validates_only_provided_fields() {
        assert!(validate_update_product(&UpdateProductRequest::default()).is_ok());
        let bad = UpdateProductRequest {
            price: Some(-5.0),
            ..Default::default()
        };
        assert!(validate_update_product(&bad).is_err());
    }

    #[test]
    fn removing_the_cover_falls_back_to_the_first_image() {
        assert_eq!(cover_after_removal(2, 2, 3), 0);
    }

    #[test]
    fn removing_an_earlier_image_shifts_the_cover_left() {
        assert_eq!(cover_after_removal(0, 2, 3), 1);
        assert_eq!(cover_after_removal(1, 2, 3), 1);
    }

    #[test]
    fn removing_a_later_image_leaves_the_cover_in_place() {
        assert_eq!(cover_after_removal(3, 1, 3), 1);
    }

    #[test]
    fn removing_the_last_image_resets_the_cover() {
        assert_eq!(cover_after_removal(0, 0, 0), 0);
    }

    #[test]
    fn category_delete_is_blocked_only_while_products_reference_it() {
        assert!(category_delete_blocked(0).is_none());
        for dependents in [1, 7] {
            match category_delete_blocked(dependents) {
                Some(ApiError::Conflict(message)) => {
                    assert!(message.contains(&dependents.to_string()))
                }
                other => panic!("expected a conflict, got {:?}", other),
            }
        }
    }

    #[test]
    fn category_names_are_trimmed_and_must_be_non_empty() {
        assert_eq!(validate_category_name("  Livros ").unwrap(), "Livros");
        assert!(validate_category_name("").is_err());
        assert!(validate_category_name("   ").is_err());
    }

    #[test]
    fn cover_index_is_clamped_into_the_stored_list() {
        assert_eq!(resolve_cover_index(Some(2), 0, 2), 1);
        assert_eq!(resolve_cover_index(Some(1), 0, 3), 1);
        assert_eq!(resolve_cover_index(None, 1, 3), 1);
        assert_eq!(resolve_cover_index(None, 5, 2), 1);
        assert_eq!(resolve_cover_index(Some(4), 0, 0), 0);
    }

    #[test]
    fn failed_upload_is_skipped_and_the_rest_continue() {
        let root = std::env::temp_dir().join(format!("usados-upload-{}", uuid::Uuid::new_v4()));
        let store = MediaStore::new(&root, "http://localhost:3001");
        let files = vec![
            (Some("a.jpg".to_string()), b"first".to_vec()),
            (Some("b.jpg".to_string()), b"second".to_vec()),
            (Some("c.jpg".to_string()), b"third".to_vec()),
        ];

        // Pre-create the second object's path so that save fails on it.
        let ts = 1_700_000_000_000;
        let colliding = root.join(MediaStore::object_name(9, ts, 1, "b.jpg"));
        fs::create_dir_all(colliding.parent().unwrap()).unwrap();
        fs::write(&colliding, b"occupied").unwrap();

        let urls = store_uploaded_files(&store, 9, ts, &files);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with(&MediaStore::object_name(9, ts, 0, "a.jpg")));
        assert!(urls[1].ends_with(&MediaStore::object_name(9, ts, 2, "c.jpg")));

        // Cover chosen over the combined list can only point at a success.
        let cover = resolve_cover_index(Some(2), 0, urls.len());
        assert!((cover as usize) < urls.len());

        fs::remove_dir_all(&root).unwrap();
    }
}
