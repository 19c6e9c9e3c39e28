use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use medley_db::{create_pool, run_trivia_migrations, DbPool, DbRuntimeSettings};
use medley_server::{trivia_app, AppState};
use medley_trivia::{create_question, NewQuestion};
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
        run_trivia_migrations(&conn).unwrap();
    }
    (trivia_app(AppState { pool: pool.clone() }), pool)
}

fn seed_questions(pool: &DbPool, count: usize, category: i64) -> Vec<i64> {
    let conn = pool.get().unwrap();
    (0..count)
        .map(|i| {
            create_question(
                &conn,
                &NewQuestion {
                    question: format!("Question number {i}?"),
                    answer: format!("Answer {i}"),
                    category,
                    difficulty: 2,
                },
            )
            .unwrap()
        })
        .collect()
}

async fn play(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri("/quizzes")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_play_quiz_round() {
    let (app, pool) = setup_app();
    let ids = seed_questions(&pool, 3, 2);

    let body = json!({
        "previous_questions": [],
        "quiz_category": {"id": 2, "type": "Art"}
    });
    let (status, json) = play(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(ids.contains(&json["question"]["id"].as_i64().unwrap()));
}

#[tokio::test]
async fn test_play_quiz_never_repeats_and_exhausts() {
    let (app, pool) = setup_app();
    seed_questions(&pool, 3, 5);

    let mut previous: Vec<i64> = Vec::new();
    for _ in 0..3 {
        let body = json!({
            "previous_questions": previous,
            "quiz_category": {"id": 5, "type": "Entertainment"}
        });
        let (status, json) = play(&app, body).await;
        assert_eq!(status, StatusCode::OK);
        let id = json["question"]["id"]
            .as_i64()
            .expect("pool should not be exhausted yet");
        assert!(!previous.contains(&id), "question repeated");
        previous.push(id);
    }

    let body = json!({
        "previous_questions": previous,
        "quiz_category": {"id": 5, "type": "Entertainment"}
    });
    let (status, json) = play(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["question"].is_null(), "pool should be exhausted");
}

#[tokio::test]
async fn test_play_quiz_category_zero_means_all() {
    let (app, pool) = setup_app();
    seed_questions(&pool, 1, 1);
    seed_questions(&pool, 1, 6);

    let body = json!({
        "previous_questions": [],
        "quiz_category": {"id": 0, "type": "click"}
    });
    let (status, json) = play(&app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["question"].is_object());
}

#[tokio::test]
async fn test_play_quiz_empty_category_unprocessable() {
    let (app, _pool) = setup_app();

    let body = json!({
        "previous_questions": [],
        "quiz_category": {}
    });
    let (status, json) = play(&app, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);

    // Absent category object is equally unprocessable.
    let (status, _) = play(&app, json!({"previous_questions": []})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_play_quiz_unknown_category_is_not_found() {
    let (app, _pool) = setup_app();

    let body = json!({
        "previous_questions": [],
        "quiz_category": {"id": 1000, "type": "Pla"}
    });
    let (status, json) = play(&app, body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}
