use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::{categories, featured_products_order, products, sessions, users};

#[derive(Queryable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Queryable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = products)]
pub struct Product {
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
}

#[derive(Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub category_id: i32,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
    pub observation: Option<String>,
    pub status: String,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = products)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub category_id: Option<i32>,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
    pub observation: Option<String>,
    pub status: Option<String>,
}

// One row per featured product; order_index is the display position.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = featured_products_order)]
pub struct FeaturedOrder {
    pub id: i32,
    pub product_id: i32,
    pub order_index: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = featured_products_order)]
pub struct NewFeaturedOrder {
    pub product_id: i32,
    pub order_index: i32,
}

// Row shape for the batch insert-or-update that persists a full reorder.
#[derive(Insertable)]
#[diesel(table_name = featured_products_order)]
pub struct FeaturedOrderUpsert {
    pub id: i32,
    pub product_id: i32,
    pub order_index: i32,
}

#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub token: String,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub token: String,
    pub user_id: i32,
    pub expires_at: NaiveDateTime,
}
