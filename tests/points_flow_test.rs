mod common;

use axum::http::StatusCode;
use common::{body_text, half_product_form, location, Multipart, TestApp};
use tawzi::auth::Role;
use tawzi::notifications::{NotificationKind, NotificationStore};
use tawzi::points::{PointQuery, PointRepository, PointStatus};

#[tokio::test]
async fn owner_creates_point_and_everyone_is_notified() {
    let app = TestApp::new();
    let owner = app.user("olivia", Role::Owner).await;
    let seller = app.user("sam", Role::Seller).await;
    let cookie = app.login("olivia").await;

    let response = app
        .post_multipart("/owner/points", &cookie, half_product_form())
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/owner?created=1");

    let points = app.state.points().list(&PointQuery::default()).await.unwrap();
    assert_eq!(points.len(), 1);
    let point = &points[0];
    assert_eq!(point.status, PointStatus::Active);
    assert_eq!(point.created_by, owner.id);
    assert_eq!(point.images.len(), 1);
    assert!(point.images[0].starts_with("/uploads/"));
    assert_eq!(point.latitude, Some(24.7136));
    assert_eq!(point.longitude, Some(46.6753));

    // The stored image is served back
    let image = app.get(&point.images[0], "").await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()["content-type"], "image/png");

    for user_id in [&owner.id, &seller.id] {
        let inbox = app.state.notifications().list(user_id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::NewProduct);
        assert_eq!(inbox[0].message, "New product: Half");
        assert!(!inbox[0].read);
    }

    let page = body_text(app.get("/owner?created=1", &cookie).await).await;
    assert!(page.contains("Product added"));
}

#[tokio::test]
async fn create_without_images_is_rejected_with_message() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .text("product_type", "half")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=1,2")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Add at least one image"));
    assert!(app
        .state
        .points()
        .list(&PointQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn other_product_needs_a_label() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .file("images", "a.jpg", "image/jpeg", b"jpeg bytes")
        .text("product_type", "other")
        .text("product_value", "   ")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=1,2")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Specify the product type"));
}

#[tokio::test]
async fn current_location_needs_a_fix() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .file("images", "a.jpg", "image/jpeg", b"jpeg bytes")
        .text("product_type", "single")
        .text("location_mode", "current")
        .text("latitude", "")
        .text("longitude", "")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Add a location"));
}

#[tokio::test]
async fn script_links_are_not_accepted_as_locations() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .file("images", "a.jpg", "image/jpeg", b"jpeg bytes")
        .text("product_type", "half")
        .text("location_mode", "manual")
        .text("location_url", "javascript:alert(document.cookie)")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("http:// or https://"));
    assert!(app
        .state
        .points()
        .list(&PointQuery::default())
        .await
        .unwrap()
        .is_empty());

    let seller = body_text(app.get("/seller?filter=all", &cookie).await).await;
    assert!(!seller.contains("javascript:"));
}

#[tokio::test]
async fn uploads_are_served_as_images_whatever_the_file_name() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .file("images", "x.html", "image/png", b"<script>alert(1)</script>")
        .text("product_type", "half")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=1,2")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let points = app.state.points().list(&PointQuery::default()).await.unwrap();
    let stored = &points[0].images[0];
    assert!(stored.ends_with(".png"), "{}", stored);

    let image = app.get(stored, "").await;
    assert_eq!(image.status(), StatusCode::OK);
    let content_type = image.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("image/"), "{}", content_type);
    assert_eq!(image.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn svg_uploads_are_rejected() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    let form = Multipart::new()
        .file("images", "logo.svg", "image/svg+xml", b"<svg onload=\"alert(1)\"/>")
        .text("product_type", "half")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=1,2")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app
        .state
        .points()
        .list(&PointQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn pasted_images_are_accepted() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    // "hello" in base64
    let form = Multipart::new()
        .text("pasted_images", "data:image/png;base64,aGVsbG8=")
        .text("product_type", "other")
        .text("product_value", "Dates box")
        .text("location_mode", "current")
        .text("latitude", "21.5")
        .text("longitude", "39.1")
        .finish();
    let response = app.post_multipart("/owner/points", &cookie, form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let points = app.state.points().list(&PointQuery::default()).await.unwrap();
    assert_eq!(points[0].display_name(), "Dates box");
    assert_eq!(points[0].coordinates().map(|c| c.latitude), Some(21.5));
}

#[tokio::test]
async fn only_owners_create_points() {
    let app = TestApp::new();
    app.user("adam", Role::Admin).await;
    app.user("sam", Role::Seller).await;

    for username in ["adam", "sam"] {
        let cookie = app.login(username).await;
        let response = app
            .post_multipart("/owner/points", &cookie, half_product_form())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", username);
    }
    assert!(app
        .state
        .points()
        .list(&PointQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn non_owners_are_sent_home_from_owner_page() {
    let app = TestApp::new();
    app.user("sam", Role::Seller).await;
    let cookie = app.login("sam").await;

    let response = app.get("/owner", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/seller");
}

async fn created_point_id(app: &TestApp, cookie: &str) -> String {
    let response = app
        .post_multipart("/owner/points", cookie, half_product_form())
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    app.state.points().list(&PointQuery::default()).await.unwrap()[0]
        .id
        .clone()
}

#[tokio::test]
async fn sell_then_undo_round_trip() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let seller = app.user("sam", Role::Seller).await;
    let owner_cookie = app.login("olivia").await;
    let seller_cookie = app.login("sam").await;
    let id = created_point_id(&app, &owner_cookie).await;

    let response = app
        .post_form(
            &format!("/seller/points/{}/sell", id),
            &seller_cookie,
            "confirm=yes&filter=active",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/seller?filter=active");

    let sold = app.state.points().get(&id).await.unwrap().unwrap();
    assert_eq!(sold.status, PointStatus::Sold);
    assert_eq!(sold.sold_by.as_deref(), Some(seller.id.as_str()));
    assert!(sold.sold_at.is_some());

    let inbox = app.state.notifications().list(&seller.id).await.unwrap();
    assert_eq!(inbox[0].kind, NotificationKind::ProductSold);
    assert_eq!(inbox[0].message, "Sold: Half");

    // The seller who sold it sees the undo control; another session does not
    let page = body_text(app.get("/seller?filter=all", &seller_cookie).await).await;
    assert!(page.contains(&format!("/seller/points/{}/undo", id)));
    let other = body_text(app.get("/seller?filter=all", &owner_cookie).await).await;
    assert!(!other.contains(&format!("/seller/points/{}/undo", id)));

    let response = app
        .post_form(&format!("/seller/points/{}/undo", id), &seller_cookie, "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let restored = app.state.points().get(&id).await.unwrap().unwrap();
    assert_eq!(restored.status, PointStatus::Active);
    assert!(restored.sold_by.is_none());
    assert!(restored.sold_at.is_none());

    let page = body_text(app.get("/seller?filter=all", &seller_cookie).await).await;
    assert!(!page.contains(&format!("/seller/points/{}/undo", id)));
}

#[tokio::test]
async fn undo_control_disappears_after_window() {
    let app = TestApp::with_config(|config| config.points.undo_window_secs = 0);
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;
    let id = created_point_id(&app, &cookie).await;

    app.post_form(&format!("/seller/points/{}/sell", id), &cookie, "confirm=yes")
        .await;

    let page = body_text(app.get("/seller?filter=all", &cookie).await).await;
    assert!(!page.contains(&format!("/seller/points/{}/undo", id)));

    // The control is gone but a direct revert still goes through
    let response = app
        .post_form(&format!("/seller/points/{}/undo", id), &cookie, "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let point = app.state.points().get(&id).await.unwrap().unwrap();
    assert_eq!(point.status, PointStatus::Active);
}

#[tokio::test]
async fn sale_requires_confirmation() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;
    let id = created_point_id(&app, &cookie).await;

    let response = app
        .post_form(&format!("/seller/points/{}/sell", id), &cookie, "")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let point = app.state.points().get(&id).await.unwrap().unwrap();
    assert_eq!(point.status, PointStatus::Active);
}

#[tokio::test]
async fn selling_twice_is_rejected() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;
    let id = created_point_id(&app, &cookie).await;

    let uri = format!("/seller/points/{}/sell", id);
    assert_eq!(
        app.post_form(&uri, &cookie, "confirm=yes").await.status(),
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        app.post_form(&uri, &cookie, "confirm=yes").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn unknown_point_is_not_found() {
    let app = TestApp::new();
    app.user("sam", Role::Seller).await;
    let cookie = app.login("sam").await;

    let response = app
        .post_form("/seller/points/missing/sell", &cookie, "confirm=yes")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seller_list_filters_and_searches() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;
    let sold_id = created_point_id(&app, &cookie).await;
    app.post_form(&format!("/seller/points/{}/sell", sold_id), &cookie, "confirm=yes")
        .await;

    let form = Multipart::new()
        .file("images", "b.png", "image/png", b"png")
        .text("product_type", "other")
        .text("product_value", "Saffron")
        .text("location_mode", "manual")
        .text("location_url", "https://maps.google.com/?q=1,2")
        .finish();
    app.post_multipart("/owner/points", &cookie, form).await;

    let active = body_text(app.get("/seller", &cookie).await).await;
    assert!(active.contains("<h3>Saffron</h3>"));
    assert!(!active.contains(&format!("/seller/points/{}/sell", sold_id)));

    let sold = body_text(app.get("/seller?filter=sold", &cookie).await).await;
    assert!(!sold.contains("<h3>Saffron</h3>"));
    assert!(sold.contains("<h3>Half</h3>"));

    let searched = body_text(app.get("/seller?filter=all&q=saff", &cookie).await).await;
    assert!(searched.contains("<h3>Saffron</h3>"));
    assert!(!searched.contains("<h3>Half</h3>"));
}

#[tokio::test]
async fn logs_list_sold_points() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;
    let id = created_point_id(&app, &cookie).await;

    let before = body_text(app.get("/logs", &cookie).await).await;
    assert!(before.contains("No sales in this period."));

    app.post_form(&format!("/seller/points/{}/sell", id), &cookie, "confirm=yes")
        .await;

    let response = app.get("/logs?range=today", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains("No sales in this period."));
    assert!(body.contains("<td>Half</td>"));
}

#[tokio::test]
async fn map_ranks_by_distance_from_fix() {
    let app = TestApp::new();
    app.user("olivia", Role::Owner).await;
    let cookie = app.login("olivia").await;

    // Newest first without a fix, so the far point is created last
    for (label, url) in [
        ("Near", "https://maps.google.com/?q=24.7136,46.6753"),
        ("Far", "https://maps.google.com/?q=21.4858,39.1925"),
    ] {
        let form = Multipart::new()
            .file("images", "x.png", "image/png", b"png")
            .text("product_type", "other")
            .text("product_value", label)
            .text("location_mode", "manual")
            .text("location_url", url)
            .finish();
        app.post_multipart("/owner/points", &cookie, form).await;
    }

    let unranked = body_text(app.get("/map", &cookie).await).await;
    assert!(unranked.find("<h3>Far</h3>").unwrap() < unranked.find("<h3>Near</h3>").unwrap());

    let response = app.get("/map?lat=24.7&lng=46.7", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.find("<h3>Near</h3>").unwrap() < body.find("<h3>Far</h3>").unwrap());
    assert!(body.contains("km"));
}
