// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /salud
// - POST /analizar (blank query, no matches, full report shape)
// - POST /conclusiones (local summary)

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use sentivote::api::{self, AppState};
use sentivote::classifier::StaticClassifier;
use sentivote::corpus::{CommentRecord, PostRecord};
use sentivote::lexicon::Lexicon;
use sentivote::Analyzer;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn corpus() -> Vec<PostRecord> {
    vec![
        PostRecord {
            id_post: "p1".into(),
            candidato: "Ana Pérez".into(),
            usuario: "votante1".into(),
            fecha: Some("2025-01-10T10:00:00Z".into()),
            texto: "Gran líder transparente".into(),
            comentarios: Vec::new(),
        },
        PostRecord {
            id_post: "p2".into(),
            candidato: "Luis Mora".into(),
            usuario: "votante2".into(),
            fecha: Some("2025-02-03".into()),
            texto: "Debate sobre seguridad".into(),
            comentarios: vec![CommentRecord {
                id_comentario: "c1".into(),
                texto_comentario: "Qué desastre de propuestas".into(),
            }],
        },
    ]
}

/// Same Router the binary uses, with a stubbed classifier.
fn test_router() -> Router {
    let analyzer = Analyzer::new(
        Arc::new(Lexicon::builtin()),
        Arc::new(StaticClassifier::new("NEU", 0.6)),
    );
    api::router(AppState::with_local_conclusions(analyzer, corpus()))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn salud_reports_count_and_date_span() {
    let req = Request::get("/salud").body(Body::empty()).unwrap();
    let (status, v) = send(test_router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["estado"], "activo");
    assert_eq!(v["publicaciones"], 2);
    assert_eq!(v["minDate"], "2025-01-10");
    assert_eq!(v["maxDate"], "2025-02-03");
}

#[tokio::test]
async fn analizar_rejects_blank_query() {
    let (status, v) = send(test_router(), post_json("/analizar", json!({ "query": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v.get("error").is_some(), "missing 'error': {v}");
}

#[tokio::test]
async fn analizar_without_matches_is_explicit() {
    let (status, v) =
        send(test_router(), post_json("/analizar", json!({ "query": "Cuenca" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["sin_resultados"], true);
    assert_eq!(v["total_textos_analizados"], 0);
    assert_eq!(v["publicaciones"], json!([]));
    assert!(v["mensaje"].is_string());
}

#[tokio::test]
async fn analizar_returns_thread_shape() {
    let (status, v) = send(test_router(), post_json("/analizar", json!({ "query": "líder" }))).await;
    assert_eq!(status, StatusCode::OK, "{v}");

    let p = &v["publicaciones"][0];
    assert_eq!(p["id_post"], "p1");
    assert_eq!(p["sentimiento_publicacion"], "POS");
    assert_eq!(p["confianza_publicacion"], 0.75);
    assert_eq!(p["sentimiento_comentarios"], "NEU");
    assert_eq!(p["confianza_comentarios"], 0.5);
    assert_eq!(p["sentimiento_final"], "NEU");
    assert_eq!(p["confianza_final"], 0.6);
    assert_eq!(p["sentiment"], p["sentimiento_final"]);
    assert_eq!(p["comentarios"], json!([]));

    assert_eq!(v["total_textos_analizados"], 1);
    assert_eq!(v["wordcloud"]["general"], "gran líder transparente");
    let buckets = v["wordcloud"]["por_sentimiento"].as_object().expect("buckets");
    for key in ["POS", "NEG", "NEU"] {
        assert!(buckets.contains_key(key), "missing bucket {key}");
    }
    assert!(buckets["POS"].is_null());
    assert!(buckets["NEG"].is_null());
}

#[tokio::test]
async fn analizar_applies_date_range() {
    let payload = json!({ "query": "e", "fecha_inicio": "2025-02-01", "fecha_fin": "2025-02-28" });
    let (status, v) = send(test_router(), post_json("/analizar", payload)).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = v["publicaciones"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id_post"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p2"]);

    let p = &v["publicaciones"][0];
    assert_eq!(p["comentarios"][0]["sentimiento_comentario"], "NEG");
    assert_eq!(p["sentimiento_final"], "NEG");
    assert_eq!(v["total_textos_analizados"], 2);
}

#[tokio::test]
async fn conclusiones_uses_local_summary() {
    let payload = json!({
        "palabras": { "NEG": { "fraude": 3, "crisis": 1 }, "POS": { "futuro": 1 } },
        "conteos": { "NEG": 2, "POS": 1 }
    });
    let (status, v) = send(test_router(), post_json("/conclusiones", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["proveedor"], "local");
    let text = v["conclusion"].as_str().unwrap();
    assert!(text.starts_with("Predomina el sentimiento negativo"), "{text}");
    assert!(text.contains("fraude"));
}
