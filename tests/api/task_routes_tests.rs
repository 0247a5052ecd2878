//! Success paths for the task routes.

use crate::api::helpers::{app, create, get, id_of, names_of, send, send_raw};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use rstest::rstest;
use serde_json::json;
use tower::ServiceExt;

fn task_body(name: &str) -> serde_json::Value {
    json!({"nome": name, "custo": "150.50", "data_limite": "2026-11-30"})
}

#[rstest]
#[tokio::test]
async fn health_reports_ok(app: Router) {
    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[rstest]
#[tokio::test]
async fn create_returns_the_stored_task(app: Router) {
    let created = create(&app, &task_body("Pintar parede")).await;

    assert_eq!(
        created,
        json!({
            "id": id_of(&created),
            "nome": "Pintar parede",
            "custo": 150.5,
            "data_limite": "2026-11-30",
            "ordem_apresentacao": 1,
        })
    );
}

#[rstest]
#[tokio::test]
async fn list_is_ordered_by_presentation_order(app: Router) {
    create(&app, &json!({"nome": "Depois", "custo": 1, "data_limite": "2026-01-01", "ordem_apresentacao": 9})).await;
    create(&app, &json!({"nome": "Antes", "custo": 1, "data_limite": "2026-01-01", "ordem_apresentacao": 2})).await;

    let (status, list) = get(&app, "/api/tarefas").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names_of(&list), vec!["Antes", "Depois"]);
}

#[rstest]
#[tokio::test]
async fn empty_list_is_an_empty_array(app: Router) {
    let (status, list) = get(&app, "/api/tarefas").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[rstest]
#[tokio::test]
async fn update_ignores_presentation_order(app: Router) {
    let created = create(&app, &task_body("Original")).await;
    let uri = format!("/api/tarefas/{}", id_of(&created));

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        &json!({"nome": "Editada", "custo": 0, "data_limite": "2027-01-31", "ordem_apresentacao": 99}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["nome"], "Editada");
    assert_eq!(updated["custo"], json!(0.0));
    assert_eq!(updated["data_limite"], "2027-01-31");
    assert_eq!(updated["ordem_apresentacao"], 1);
}

#[rstest]
#[tokio::test]
async fn delete_acknowledges_and_removes(app: Router) {
    let created = create(&app, &task_body("Descartavel")).await;

    let (status, body) = send_raw(
        &app,
        Method::DELETE,
        &format!("/api/tarefas/{}", id_of(&created)),
        "",
    )
    .await;
    let (_, list) = get(&app, "/api/tarefas").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(list, json!([]));
}

#[rstest]
#[tokio::test]
async fn move_reports_whether_orders_changed(app: Router) {
    let first = create(&app, &task_body("A")).await;
    let second = create(&app, &task_body("B")).await;

    let (status, swapped) = send(
        &app,
        Method::PATCH,
        &format!("/api/tarefas/{}/mover", id_of(&second)),
        &json!({"direction": "up"}),
    )
    .await;
    let (_, unchanged) = send(
        &app,
        Method::PATCH,
        &format!("/api/tarefas/{}/mover", id_of(&second)),
        &json!({"direction": "up"}),
    )
    .await;
    let (_, list) = get(&app, "/api/tarefas").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(swapped, json!({"success": true, "swapped": true}));
    assert_eq!(unchanged, json!({"success": true, "swapped": false}));
    assert_eq!(names_of(&list), vec!["B", "A"]);
    assert_eq!(list[1]["id"], id_of(&first));
    assert_eq!(list[1]["ordem_apresentacao"], 2);
}

#[rstest]
#[tokio::test]
async fn cross_origin_requests_are_allowed(app: Router) {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/tarefas")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request should build");

    let response = app.oneshot(request).await.expect("router is infallible");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}
