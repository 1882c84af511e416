use std::collections::HashMap;

use actix_web::http::{header, StatusCode};
use actix_web::test as actix_test;
use actix_web::{web, App, HttpResponse};
use chrono::NaiveDateTime;

use usados_backend::auth::SessionGuard;
use usados_backend::catalog::merge_catalog;
use usados_backend::db::models::FeaturedOrder;
use usados_backend::db::repository::ProductWithCategory;
use usados_backend::featured::{move_entry, next_order_index};

fn entry(id: i32, product_id: i32, order_index: i32) -> FeaturedOrder {
    FeaturedOrder {
        id,
        product_id,
        order_index,
        created_at: NaiveDateTime::default(),
        updated_at: NaiveDateTime::default(),
    }
}

fn product(id: i32, name: &str, featured: bool) -> ProductWithCategory {
    ProductWithCategory {
        id,
        name: name.to_string(),
        description: format!("{} description", name),
        price: 20.0,
        condition: "good".to_string(),
        category_id: 2,
        images: Vec::new(),
        cover_image_index: 0,
        whatsapp: None,
        location: None,
        observation: None,
        status: "available".to_string(),
        is_featured: featured,
        created_at: NaiveDateTime::default(),
        updated_at: NaiveDateTime::default(),
        category_name: "livros".to_string(),
    }
}

#[test]
fn reorder_then_merge_matches_the_storefront_order() {
    // Admin featured list A, B, C; after dragging C to the front the
    // storefront must show C, A, B ahead of everything non-featured.
    let entries = vec![entry(1, 101, 0), entry(2, 102, 1), entry(3, 103, 2)];
    let reordered = move_entry(entries, 2, 0);
    let order: HashMap<i32, i32> = reordered
        .iter()
        .map(|e| (e.product_id, e.order_index))
        .collect();

    let featured = vec![
        product(101, "A", true),
        product(102, "B", true),
        product(103, "C", true),
    ];
    let rest = vec![product(200, "newest", false), product(199, "older", false)];
    let merged = merge_catalog(featured, &order, rest);

    let ids: Vec<i32> = merged.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![103, 101, 102, 200, 199]);
}

#[test]
fn featuring_products_assigns_sequential_indices() {
    let mut entries: Vec<FeaturedOrder> = Vec::new();

    let first = next_order_index(entries.iter().map(|e| e.order_index).max());
    assert_eq!(first, 0);
    entries.push(entry(1, 11, first));

    let second = next_order_index(entries.iter().map(|e| e.order_index).max());
    assert_eq!(second, 1);
    entries.push(entry(2, 12, second));

    // Un-featuring the first leaves the second's index untouched.
    entries.retain(|e| e.product_id != 11);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].order_index, 1);

    // The next featured product appends past the surviving maximum.
    assert_eq!(next_order_index(entries.iter().map(|e| e.order_index).max()), 2);
}

async fn page() -> HttpResponse {
    HttpResponse::Ok().body("page")
}

#[actix_web::test]
async fn guard_redirects_protected_paths_without_a_session() {
    let app = actix_test::init_service(
        App::new()
            .wrap(SessionGuard)
            .route("/admin", web::get().to(page))
            .route("/admin/destaques", web::get().to(page)),
    )
    .await;

    let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        "/login?redirected_from=/admin"
    );

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/admin/destaques").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        "/login?redirected_from=/admin/destaques"
    );
}

#[actix_web::test]
async fn guard_leaves_public_and_login_paths_alone() {
    let app = actix_test::init_service(
        App::new()
            .wrap(SessionGuard)
            .route("/login", web::get().to(page))
            .route("/api/catalog", web::get().to(page)),
    )
    .await;

    // No session: the login page renders instead of redirecting.
    let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/catalog").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
