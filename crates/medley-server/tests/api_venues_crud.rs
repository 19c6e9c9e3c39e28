use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use medley_db::{create_pool, run_venues_migrations, DbPool, DbRuntimeSettings};
use medley_server::{venues_app, AppState};
use medley_venues::{create_show, create_venue, get_venue, ListingError, NewShow, NewVenue};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_app() -> (Router, DbPool) {
    // A single pooled connection keeps every query on the same in-memory
    // database.
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            busy_timeout_ms: 5_000,
            pool_max_size: 1,
        },
    )
    .unwrap();
    {
        let conn = pool.get().unwrap();
        run_venues_migrations(&conn).unwrap();
    }
    (venues_app(AppState { pool: pool.clone() }), pool)
}

fn sample_venue(name: &str, city: &str) -> NewVenue {
    NewVenue {
        name: name.to_string(),
        genres: vec!["Jazz".to_string()],
        city: city.to_string(),
        state: "CA".to_string(),
        address: "1 Main St".to_string(),
        phone: None,
        image_link: None,
        facebook_link: None,
        website: None,
        seeking_talent: false,
        seeking_description: None,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_venue_success() {
    let (app, pool) = setup_app();

    let body = json!({
        "name": "The Musical Hop",
        "genres": ["Jazz", "Reggae"],
        "city": "San Francisco",
        "state": "CA",
        "address": "1015 Folsom Street",
        "phone": "123-123-1234",
        "seeking_talent": true,
        "seeking_description": "Looking for local acts"
    });

    let request = Request::builder()
        .uri("/venues")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let created = json["created"].as_i64().unwrap();

    let conn = pool.get().unwrap();
    let venue = get_venue(&conn, created).unwrap();
    assert_eq!(venue.name, "The Musical Hop");
    assert_eq!(venue.genres, vec!["Jazz", "Reggae"]);
    assert!(venue.seeking_talent);
}

#[tokio::test]
async fn test_create_venue_missing_fields_unprocessable() {
    let (app, _pool) = setup_app();

    let request = Request::builder()
        .uri("/venues")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "No City"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], 422);
}

#[tokio::test]
async fn test_create_venue_body_not_json_is_bad_request() {
    let (app, _pool) = setup_app();

    let request = Request::builder()
        .uri("/venues")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from("definitely not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], 400);
}

#[tokio::test]
async fn test_list_venues_groups_by_city() {
    let (app, pool) = setup_app();

    {
        let conn = pool.get().unwrap();
        create_venue(&conn, &sample_venue("Alpha", "Berkeley")).unwrap();
        create_venue(&conn, &sample_venue("Beta", "Berkeley")).unwrap();
        create_venue(&conn, &sample_venue("Gamma", "Oakland")).unwrap();
    }

    let request = Request::builder()
        .uri("/venues")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let areas = json["areas"].as_array().unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0]["city"], "Berkeley");
    assert_eq!(areas[0]["venues"].as_array().unwrap().len(), 2);
    assert_eq!(areas[1]["city"], "Oakland");
}

#[tokio::test]
async fn test_get_venue_detail_with_shows() {
    let (app, pool) = setup_app();

    let venue_id = {
        let conn = pool.get().unwrap();
        let venue_id = create_venue(&conn, &sample_venue("Hall", "SF")).unwrap();
        let artist_id = medley_venues::create_artist(
            &conn,
            &medley_venues::NewArtist {
                name: "Band".to_string(),
                genres: vec![],
                city: "SF".to_string(),
                state: "CA".to_string(),
                phone: None,
                image_link: None,
                facebook_link: None,
                website: None,
                seeking_venue: false,
                seeking_description: None,
            },
        )
        .unwrap();
        // One show far in the past, one far in the future.
        for start in ["2000-01-01T20:00:00Z", "2200-01-01T20:00:00Z"] {
            create_show(
                &conn,
                &NewShow {
                    artist_id,
                    venue_id,
                    start_time: start.to_string(),
                },
            )
            .unwrap();
        }
        venue_id
    };

    let request = Request::builder()
        .uri(format!("/venues/{venue_id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let venue = &json["venue"];
    assert_eq!(venue["name"], "Hall");
    assert_eq!(venue["past_shows_count"], 1);
    assert_eq!(venue["upcoming_shows_count"], 1);
    assert_eq!(venue["upcoming_shows"][0]["artist_name"], "Band");
}

#[tokio::test]
async fn test_get_venue_missing_is_not_found() {
    let (app, _pool) = setup_app();

    let request = Request::builder()
        .uri("/venues/999")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], 404);
}

#[tokio::test]
async fn test_update_venue_partial() {
    let (app, pool) = setup_app();

    let venue_id = {
        let conn = pool.get().unwrap();
        create_venue(&conn, &sample_venue("Old Name", "SF")).unwrap()
    };

    let request = Request::builder()
        .uri(format!("/venues/{venue_id}"))
        .method("PATCH")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "New Name"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["venue"]["name"], "New Name");
    assert_eq!(json["venue"]["city"], "SF", "untouched field survives");
}

#[tokio::test]
async fn test_update_missing_venue_is_not_found() {
    let (app, _pool) = setup_app();

    let request = Request::builder()
        .uri("/venues/404")
        .method("PATCH")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "Ghost"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_venue_success_and_missing() {
    let (app, pool) = setup_app();

    let venue_id = {
        let conn = pool.get().unwrap();
        create_venue(&conn, &sample_venue("Doomed", "SF")).unwrap()
    };

    let request = Request::builder()
        .uri(format!("/venues/{venue_id}"))
        .method("DELETE")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["deleted"], venue_id);

    {
        let conn = pool.get().unwrap();
        assert!(matches!(
            get_venue(&conn, venue_id),
            Err(ListingError::VenueNotFound(_))
        ));
    }

    // A second delete is a 404.
    let request = Request::builder()
        .uri(format!("/venues/{venue_id}"))
        .method("DELETE")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_venues() {
    let (app, pool) = setup_app();

    {
        let conn = pool.get().unwrap();
        create_venue(&conn, &sample_venue("The Musical Hop", "SF")).unwrap();
        create_venue(&conn, &sample_venue("Park Square Live", "SF")).unwrap();
    }

    let request = Request::builder()
        .uri("/venues/search")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"search_term": "musical"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["name"], "The Musical Hop");
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method_are_enveloped() {
    let (app, _pool) = setup_app();

    let request = Request::builder()
        .uri("/no-such-route")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], 404);

    // /venues/search only accepts POST.
    let request = Request::builder()
        .uri("/venues/search")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_json(response).await;
    assert_eq!(json["error"], 405);
    assert_eq!(json["message"], "method not allowed");
}
