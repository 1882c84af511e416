diesel::table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        description -> Text,
        price -> Float8,
        condition -> Varchar,
        category_id -> Int4,
        images -> Array<Text>,
        cover_image_index -> Int4,
        whatsapp -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        observation -> Nullable<Text>,
        status -> Varchar,
        is_featured -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    featured_products_order (id) {
        id -> Int4,
        product_id -> Int4,
        order_index -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    sessions (token) {
        token -> Varchar,
        user_id -> Int4,
        created_at -> Timestamp,
        expires_at -> Timestamp,
    }
}

diesel::joinable!(products -> categories (category_id));
diesel::joinable!(featured_products_order -> products (product_id));
diesel::joinable!(sessions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    categories,
    products,
    featured_products_order,
    users,
    sessions,
);
