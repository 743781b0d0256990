mod support;

use axum::http::StatusCode;
use tempfile::TempDir;

use support::{
    Part, TestApp, body_json, body_text, form_request, get_request, location, multipart_request,
    stored_files,
};

#[tokio::test]
async fn created_item_clamps_rank_and_reads_missing_checkbox_as_off() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request(
            "/admin/menu/create",
            Some(&cookie),
            "name=Smash+Burger&price=12.50&featured_rank=15",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/menu"));

    let state = app.repo.state.lock().await;
    assert_eq!(state.items.len(), 1);
    let item = &state.items[0];
    assert_eq!(item.name, "Smash Burger");
    assert_eq!(item.price_cents, 1250);
    assert_eq!(item.featured_rank, 9);
    assert!(!item.available);
}

#[tokio::test]
async fn item_without_price_is_rejected() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request("/admin/menu/create", Some(&cookie), "name=Fries"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.repo.state.lock().await.items.is_empty());
}

#[tokio::test]
async fn tag_in_use_cannot_be_deleted() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request(
            "/admin/tags/create",
            Some(&cookie),
            "name=Vegan&type=dietary",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let tag_id = app.repo.state.lock().await.tags[0].id;

    for name in ["Garden+Bowl", "Tofu+Tacos"] {
        let response = app
            .send(form_request(
                "/admin/menu/create",
                Some(&cookie),
                &format!("name={name}&price=9&available=on&tag_ids={tag_id}"),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let response = app
        .send(form_request(
            &format!("/admin/tags/delete/{tag_id}"),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("used by 2 menu items"));
    assert_eq!(app.repo.state.lock().await.tags.len(), 1);
}

#[tokio::test]
async fn bulk_ranking_skips_malformed_entries() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    for name in ["Nachos", "Wings"] {
        app.send(form_request(
            "/admin/menu/create",
            Some(&cookie),
            &format!("name={name}&price=8&available=1"),
        ))
        .await;
    }
    let (first, second) = {
        let state = app.repo.state.lock().await;
        (state.items[0].id, state.items[1].id)
    };

    let response = app
        .send(form_request(
            "/admin/menu/feature",
            Some(&cookie),
            &format!("rank_{first}=2&rank_{second}=abc&rank_bogus=1"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let state = app.repo.state.lock().await;
    assert_eq!(state.items[0].featured_rank, 2);
    assert_eq!(state.items[1].featured_rank, 0);
}

#[tokio::test]
async fn menu_screen_filters_by_search() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    for name in ["Pale+Ale", "Pretzel"] {
        app.send(form_request(
            "/admin/menu/create",
            Some(&cookie),
            &format!("name={name}&price=6&available=on"),
        ))
        .await;
    }

    let response = app
        .send(get_request("/admin/menu?q=ale", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Pale Ale");
}

#[tokio::test]
async fn deleting_a_missing_item_is_not_found() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request("/admin/menu/delete/404", Some(&cookie), ""))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_with_unknown_category_keeps_no_image() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(multipart_request(
            "/admin/menu/create",
            Some(&cookie),
            &[
                Part::Text("name", "Mystery Plate"),
                Part::Text("price", "9"),
                Part::Text("category_id", "4242"),
                Part::File {
                    name: "image",
                    file_name: "plate.jpg",
                    content_type: "image/jpeg",
                    data: b"\xff\xd8\xff\xe0plate",
                },
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.repo.state.lock().await.items.is_empty());
    assert_eq!(stored_files(media.path()), 0);
}
