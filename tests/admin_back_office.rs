mod support;

use axum::http::StatusCode;
use serde_json::json;
use tempfile::TempDir;

use taproom::domain::types::{MusicianStatus, RentalStatus};

use support::{TestApp, body_json, body_text, form_request, get_request, location};

#[tokio::test]
async fn rental_inbox_moves_through_statuses() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    app.send(form_request(
        "/api/rental",
        None,
        "name=Dana&email=dana%40example.com&venue_area=Deck",
    ))
    .await;
    let id = app.repo.state.lock().await.rentals[0].id;

    let response = app
        .send(form_request(
            "/admin/rentals/status",
            Some(&cookie),
            &format!("id={id}&status=approved"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/rentals"));
    assert_eq!(
        app.repo.state.lock().await.rentals[0].status,
        RentalStatus::Approved
    );

    let response = app
        .send(get_request(
            "/admin/rentals?status=approved&area=Deck",
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));

    let response = app
        .send(get_request("/admin/rentals?status=new", Some(&cookie)))
        .await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn unknown_statuses_are_rejected() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    app.send(form_request(
        "/api/musician",
        None,
        "name=Trio&email=trio%40example.com",
    ))
    .await;
    let id = app.repo.state.lock().await.musicians[0].id;

    let response = app
        .send(form_request(
            "/admin/musician/status",
            Some(&cookie),
            &format!("id={id}&status=famous"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        app.repo.state.lock().await.musicians[0].status,
        MusicianStatus::New
    );

    let response = app
        .send(get_request("/admin/musician?status=famous", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(form_request(
            "/admin/musician/status",
            Some(&cookie),
            "id=999&status=booked",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn featured_reviews_lead_the_public_page() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request(
            "/admin/reviews/create",
            Some(&cookie),
            "source=google&rating=7",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for body in [
        "source=google&rating=5&text=Great+burgers&reviewer_name=Sam",
        "source=Yelp&rating=4&text=Fun+music",
    ] {
        let response = app
            .send(form_request("/admin/reviews/create", Some(&cookie), body))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    let first = app.repo.state.lock().await.reviews[0].id;

    let response = app
        .send(form_request(
            "/admin/reviews/feature",
            Some(&cookie),
            &format!("id={first}"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = body_json(app.send(get_request("/reviews", None)).await).await;
    assert_eq!(page["featured"][0]["body"], "Great burgers");
    assert_eq!(page["others"][0]["source"], "yelp");

    let response = app
        .send(form_request("/admin/reviews/delete", Some(&cookie), "id=999"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn holiday_overrides_upsert_by_date() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    for body in [
        "date=2030-12-25&closed=on",
        "date=2030-12-25&open=12:00&close=18:00",
    ] {
        let response = app
            .send(form_request("/admin/site/holiday", Some(&cookie), body))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin/site"));
    }

    let screen = body_json(app.send(get_request("/admin/site", Some(&cookie))).await).await;
    let holidays = screen["holidays"].as_array().expect("holidays");
    assert_eq!(holidays.len(), 1);
    assert_eq!(holidays[0]["date"], "2030-12-25");
    assert_eq!(holidays[0]["open_time"], "12:00");
    assert_eq!(holidays[0]["closed"], json!(false));
    assert_eq!(screen["hours"].as_array().map(Vec::len), Some(7));

    let response = app
        .send(form_request(
            "/admin/site/holiday",
            Some(&cookie),
            "date=25/12/2030",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(form_request(
            "/admin/site/holiday/delete",
            Some(&cookie),
            "date=2030-12-25",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.repo.state.lock().await.holidays.is_empty());

    let response = app
        .send(form_request(
            "/admin/site/holiday/delete",
            Some(&cookie),
            "date=2030-12-25",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/site"));
}

#[tokio::test]
async fn categories_reject_duplicates_and_deletes_while_used() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request(
            "/admin/categories/create",
            Some(&cookie),
            "name=Drinks",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/categories"));

    let response = app
        .send(form_request(
            "/admin/menu/category/create",
            Some(&cookie),
            "name=Drinks",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("same name or slug"));

    let category_id = app.repo.state.lock().await.categories[0].id;
    app.send(form_request(
        "/admin/menu/create",
        Some(&cookie),
        &format!("name=Lager&price=6&category_id={category_id}"),
    ))
    .await;

    let response = app
        .send(form_request(
            &format!("/admin/categories/delete/{category_id}"),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_text(response)
            .await
            .contains("Cannot delete category used by 1 menu items")
    );
    assert_eq!(app.repo.state.lock().await.categories.len(), 1);
}

#[tokio::test]
async fn dashboard_counts_new_submissions() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    app.send(form_request(
        "/api/rental",
        None,
        "name=Dana&email=dana%40example.com",
    ))
    .await;
    app.send(form_request(
        "/admin/menu/create",
        Some(&cookie),
        "name=Fries&price=4",
    ))
    .await;

    let body = body_json(app.send(get_request("/admin", Some(&cookie))).await).await;
    assert_eq!(body["counts"]["new_rentals"], json!(1));
    assert_eq!(body["counts"]["menu_items"], json!(1));
    assert_eq!(body["counts"]["new_musician_apps"], json!(0));
}
