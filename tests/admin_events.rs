mod support;

use axum::http::StatusCode;
use tempfile::TempDir;

use support::{Part, TestApp, form_request, location, multipart_request, stored_files};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

#[tokio::test]
async fn event_image_lives_and_dies_with_the_event() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(multipart_request(
            "/admin/events/create",
            Some(&cookie),
            &[
                Part::Text("title", "Friday Blues"),
                Part::Text("start", "2030-05-03T20:00"),
                Part::Text("venue_area", "Main Stage"),
                Part::File {
                    name: "image",
                    file_name: "poster.png",
                    content_type: "image/png",
                    data: PNG_BYTES,
                },
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/events"));

    let (id, image_url) = {
        let state = app.repo.state.lock().await;
        let event = &state.events[0];
        assert!(event.is_published);
        (event.id, event.image_url.clone().expect("stored image"))
    };
    let relative = image_url
        .strip_prefix("/static/media/")
        .expect("local media url");
    assert!(relative.starts_with("events/"));
    let path = media.path().join(relative);
    assert!(path.exists());

    let response = app
        .send(form_request(
            "/admin/events/delete",
            Some(&cookie),
            &format!("event_id={id}"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.repo.state.lock().await.events.is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn event_without_start_is_rejected() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(form_request(
            "/admin/events/create",
            Some(&cookie),
            "title=Open+Mic",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.repo.state.lock().await.events.is_empty());
}

#[tokio::test]
async fn publish_toggle_flips_visibility() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    app.send(form_request(
        "/admin/events/create",
        Some(&cookie),
        "title=Trivia&start=2030-01-10T19:00",
    ))
    .await;
    let id = app.repo.state.lock().await.events[0].id;

    let response = app
        .send(form_request(
            &format!("/admin/events/publish/{id}"),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!app.repo.state.lock().await.events[0].is_published);
}

#[tokio::test]
async fn rejected_event_keeps_no_image() {
    let media = TempDir::new().expect("tempdir");
    let app = TestApp::new(media.path());
    let cookie = app.session_cookie();

    let response = app
        .send(multipart_request(
            "/admin/events/create",
            Some(&cookie),
            &[
                Part::Text("title", "Late Show"),
                Part::Text("start", "2030-05-03T22:00"),
                Part::Text("end", "2030-05-03T20:00"),
                Part::File {
                    name: "image",
                    file_name: "poster.png",
                    content_type: "image/png",
                    data: PNG_BYTES,
                },
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.repo.state.lock().await.events.is_empty());
    assert_eq!(stored_files(media.path()), 0);
}
