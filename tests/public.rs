mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tempfile::TempDir;

use support::{TestApp, body_json, body_text, form_request, get_request};

#[tokio::test]
async fn liveness_and_robots_are_plain_text() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());

    let response = app.send(get_request("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = app.send(get_request("/robots.txt", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sitemap: /sitemap.xml"));
}

#[tokio::test]
async fn sitemap_uses_the_request_host() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());

    let request = Request::get("/sitemap.xml")
        .header(header::HOST, "venue.test")
        .body(Body::empty())
        .expect("request");
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<loc>http://venue.test/menu</loc>"));
}

#[tokio::test]
async fn site_edits_show_up_in_the_page_chrome() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let before = body_json(app.send(get_request("/", None)).await).await;
    assert_eq!(before["settings"], json!(null));

    let response = app
        .send(form_request(
            "/admin/site/basic",
            Some(&cookie),
            "site_name=The+Tap+Room&city=Austin&show_weather=on",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app
        .send(form_request(
            "/admin/site/hours",
            Some(&cookie),
            "dow=mon&closed=on",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let after = body_json(app.send(get_request("/rentals", None)).await).await;
    assert_eq!(after["settings"]["site_name"], "The Tap Room");
    assert_eq!(after["settings"]["show_weather"], json!(true));
    assert_eq!(after["hours"], "Mon: Closed");
}

#[tokio::test]
async fn home_lists_featured_items_and_upcoming_events() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    for body in [
        "name=Wings&price=11&available=on&featured_rank=1",
        "name=Hidden&price=5&featured_rank=2",
        "name=Salad&price=9&available=on",
    ] {
        app.send(form_request("/admin/menu/create", Some(&cookie), body))
            .await;
    }
    app.send(form_request(
        "/admin/events/create",
        Some(&cookie),
        "title=Karaoke&start=2099-01-01T21:00",
    ))
    .await;

    let home = body_json(app.send(get_request("/", None)).await).await;
    let featured = home["featured"].as_array().expect("featured");
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["name"], "Wings");
    assert_eq!(featured[0]["price"], json!(11.0));
    let events = home["events"].as_array().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Karaoke");
}

#[tokio::test]
async fn missing_media_is_not_found() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());

    let response = app
        .send(get_request("/static/media/events/nope.png", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(get_request("/static/media/../secret.txt", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    std::fs::create_dir_all(media.path().join("events/2030")).expect("mkdir");
    let response = app
        .send(get_request("/static/media/events/2030", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
