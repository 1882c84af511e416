use chrono::{NaiveDateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde::Serialize;

use crate::db::models::*;
use crate::db::schema::*;

pub const STATUS_AVAILABLE: &str = "available";

// --- products ---

pub fn create_product(conn: &mut PgConnection, new_product: NewProduct) -> QueryResult<Product> {
    diesel::insert_into(products::table)
        .values(&new_product)
        .get_result(conn)
}

pub fn get_product(conn: &mut PgConnection, id: i32) -> QueryResult<Option<Product>> {
    products::table.find(id).first(conn).optional()
}

pub fn update_product(
    conn: &mut PgConnection,
    id: i32,
    update_data: UpdateProduct,
) -> QueryResult<Product> {
    diesel::update(products::table.find(id))
        .set((update_data, products::updated_at.eq(Utc::now().naive_utc())))
        .get_result(conn)
}

pub fn delete_product(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(products::table.find(id)).execute(conn)
}

pub fn set_product_images(
    conn: &mut PgConnection,
    id: i32,
    images: &[String],
    cover_image_index: i32,
) -> QueryResult<Product> {
    diesel::update(products::table.find(id))
        .set((
            products::images.eq(images.to_vec()),
            products::cover_image_index.eq(cover_image_index),
            products::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(conn)
}

pub fn set_product_featured(conn: &mut PgConnection, id: i32, featured: bool) -> QueryResult<usize> {
    diesel::update(products::table.find(id))
        .set((
            products::is_featured.eq(featured),
            products::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}

/// Admin product picker list: name match only, alphabetical.
pub fn admin_products(conn: &mut PgConnection, search: Option<&str>) -> QueryResult<Vec<Product>> {
    let mut query = products::table.into_boxed();
    if let Some(term) = search {
        let term = term.trim();
        if !term.is_empty() {
            query = query.filter(products::name.ilike(format!("%{}%", term)));
        }
    }
    query.order(products::name.asc()).load(conn)
}

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct ProductWithCategory {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub category_id: i32,
    pub images: Vec<String>,
    pub cover_image_index: i32,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
    pub observation: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub category_name: String,
}

type ProductWithCategorySelect = (
    products::id,
    products::name,
    products::description,
    products::price,
    products::condition,
    products::category_id,
    products::images,
    products::cover_image_index,
    products::whatsapp,
    products::location,
    products::observation,
    products::status,
    products::is_featured,
    products::created_at,
    products::updated_at,
    categories::name,
);

const PRODUCT_WITH_CATEGORY: ProductWithCategorySelect = (
    products::id,
    products::name,
    products::description,
    products::price,
    products::condition,
    products::category_id,
    products::images,
    products::cover_image_index,
    products::whatsapp,
    products::location,
    products::observation,
    products::status,
    products::is_featured,
    products::created_at,
    products::updated_at,
    categories::name,
);

/// One half of the storefront listing: available products with the given
/// featured flag, optionally narrowed by a search term (name or description,
/// case-insensitive) and a category id set. The non-featured half is ordered
/// newest first in SQL; the featured half is ordered in process by its
/// manual order index.
pub fn catalog_products(
    conn: &mut PgConnection,
    featured: bool,
    search: Option<&str>,
    category_ids: &[i32],
) -> QueryResult<Vec<ProductWithCategory>> {
    let mut query = products::table
        .inner_join(categories::table)
        .filter(products::status.eq(STATUS_AVAILABLE))
        .filter(products::is_featured.eq(featured))
        .select(PRODUCT_WITH_CATEGORY)
        .into_boxed();

    if let Some(term) = search {
        let term = term.trim();
        if !term.is_empty() {
            let pattern = format!("%{}%", term);
            query = query.filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern)),
            );
        }
    }

    if !category_ids.is_empty() {
        query = query.filter(products::category_id.eq_any(category_ids.to_vec()));
    }

    if !featured {
        query = query.order(products::created_at.desc());
    }

    query.load(conn)
}

pub fn get_product_with_category(
    conn: &mut PgConnection,
    id: i32,
) -> QueryResult<Option<ProductWithCategory>> {
    products::table
        .inner_join(categories::table)
        .filter(products::id.eq(id))
        .select(PRODUCT_WITH_CATEGORY)
        .first(conn)
        .optional()
}

// --- categories ---

pub fn create_category(conn: &mut PgConnection, new_category: NewCategory) -> QueryResult<Category> {
    diesel::insert_into(categories::table)
        .values(&new_category)
        .get_result(conn)
}

pub fn update_category(conn: &mut PgConnection, id: i32, name: &str) -> QueryResult<Category> {
    diesel::update(categories::table.find(id))
        .set(categories::name.eq(name))
        .get_result(conn)
}

pub fn delete_category(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(categories::table.find(id)).execute(conn)
}

pub fn get_all_categories(conn: &mut PgConnection) -> QueryResult<Vec<Category>> {
    categories::table.order(categories::name.asc()).load(conn)
}

pub fn count_products_in_category(conn: &mut PgConnection, category_id: i32) -> QueryResult<i64> {
    products::table
        .filter(products::category_id.eq(category_id))
        .count()
        .get_result(conn)
}

// --- featured order ---

pub fn featured_order_entries(conn: &mut PgConnection) -> QueryResult<Vec<FeaturedOrder>> {
    featured_products_order::table
        .order(featured_products_order::order_index.asc())
        .load(conn)
}

/// (product_id, order_index) pairs for the storefront's featured sort.
pub fn order_index_by_product(conn: &mut PgConnection) -> QueryResult<Vec<(i32, i32)>> {
    featured_products_order::table
        .select((
            featured_products_order::product_id,
            featured_products_order::order_index,
        ))
        .load(conn)
}

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct FeaturedOrderWithProduct {
    pub id: i32,
    pub product_id: i32,
    pub order_index: i32,
    pub product_name: String,
    pub images: Vec<String>,
    pub cover_image_index: i32,
}

pub fn featured_order_with_products(
    conn: &mut PgConnection,
) -> QueryResult<Vec<FeaturedOrderWithProduct>> {
    featured_products_order::table
        .inner_join(products::table)
        .order(featured_products_order::order_index.asc())
        .select((
            featured_products_order::id,
            featured_products_order::product_id,
            featured_products_order::order_index,
            products::name,
            products::images,
            products::cover_image_index,
        ))
        .load(conn)
}

pub fn max_order_index(conn: &mut PgConnection) -> QueryResult<Option<i32>> {
    featured_products_order::table
        .select(max(featured_products_order::order_index))
        .first(conn)
}

pub fn featured_entry_for_product(
    conn: &mut PgConnection,
    product_id: i32,
) -> QueryResult<Option<FeaturedOrder>> {
    featured_products_order::table
        .filter(featured_products_order::product_id.eq(product_id))
        .first(conn)
        .optional()
}

pub fn insert_featured_entry(
    conn: &mut PgConnection,
    product_id: i32,
    order_index: i32,
) -> QueryResult<FeaturedOrder> {
    diesel::insert_into(featured_products_order::table)
        .values(&NewFeaturedOrder {
            product_id,
            order_index,
        })
        .get_result(conn)
}

pub fn delete_featured_entry_for_product(
    conn: &mut PgConnection,
    product_id: i32,
) -> QueryResult<usize> {
    diesel::delete(
        featured_products_order::table.filter(featured_products_order::product_id.eq(product_id)),
    )
    .execute(conn)
}

/// Persists a full reordered list in one statement: insert-or-update keyed
/// by entry id, rewriting every order_index.
pub fn upsert_featured_order(
    conn: &mut PgConnection,
    entries: &[FeaturedOrder],
) -> QueryResult<usize> {
    let rows: Vec<FeaturedOrderUpsert> = entries
        .iter()
        .map(|entry| FeaturedOrderUpsert {
            id: entry.id,
            product_id: entry.product_id,
            order_index: entry.order_index,
        })
        .collect();

    diesel::insert_into(featured_products_order::table)
        .values(&rows)
        .on_conflict(featured_products_order::id)
        .do_update()
        .set((
            featured_products_order::order_index
                .eq(excluded(featured_products_order::order_index)),
            featured_products_order::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}

// --- users / sessions ---

pub fn find_user_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .first(conn)
        .optional()
}

pub fn create_user(conn: &mut PgConnection, new_user: NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(conn)
}

pub fn create_session(conn: &mut PgConnection, new_session: NewSession) -> QueryResult<Session> {
    diesel::insert_into(sessions::table)
        .values(&new_session)
        .get_result(conn)
}

pub fn find_valid_session(
    conn: &mut PgConnection,
    token: &str,
    now: NaiveDateTime,
) -> QueryResult<Option<Session>> {
    sessions::table
        .filter(sessions::token.eq(token))
        .filter(sessions::expires_at.gt(now))
        .first(conn)
        .optional()
}

pub fn delete_session(conn: &mut PgConnection, token: &str) -> QueryResult<usize> {
    diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(conn)
}
