use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::analyze::conclusion::{ConclusionRequest, DynConclusionClient, LocalSummary};
use crate::analyze::terms::WordCloudData;
use crate::corpus::{date_span, CorpusQuery, PostRecord};
use crate::engine::{AnalysisOutcome, AnalysisReport, Analyzer, ThreadResult};
use crate::sentiment::Polarity;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
    pub corpus: Arc<Vec<PostRecord>>,
    pub conclusion: DynConclusionClient,
}

impl AppState {
    pub fn new(analyzer: Analyzer, corpus: Vec<PostRecord>, conclusion: DynConclusionClient) -> Self {
        Self {
            analyzer,
            corpus: Arc::new(corpus),
            conclusion,
        }
    }

    /// Local summary instead of an LLM provider.
    pub fn with_local_conclusions(analyzer: Analyzer, corpus: Vec<PostRecord>) -> Self {
        Self::new(analyzer, corpus, Arc::new(LocalSummary))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/salud", get(salud))
        .route("/analizar", post(analizar))
        .route("/conclusiones", post(conclusiones))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Confidences leave the service rounded to three decimals.
fn round3(x: f32) -> f64 {
    (f64::from(x) * 1000.0).round() / 1000.0
}

// ------------------------------------------------------------
// GET /salud
// ------------------------------------------------------------

#[derive(Serialize)]
struct SaludResp {
    estado: &'static str,
    publicaciones: usize,
    #[serde(rename = "minDate")]
    min_date: Option<String>,
    #[serde(rename = "maxDate")]
    max_date: Option<String>,
}

async fn salud(State(state): State<AppState>) -> Json<SaludResp> {
    let (min_date, max_date) = date_span(&state.corpus);
    Json(SaludResp {
        estado: "activo",
        publicaciones: state.corpus.len(),
        min_date,
        max_date,
    })
}

// ------------------------------------------------------------
// POST /analizar
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ComentarioOut {
    id_comentario: String,
    texto_comentario: String,
    sentimiento_comentario: Polarity,
    confianza_comentario: f64,
}

#[derive(Debug, Serialize)]
struct PublicacionOut {
    id_post: String,
    texto: String,
    usuario: String,
    candidato: String,
    fecha: Option<String>,
    sentiment: Polarity,
    confidence: f64,
    comentarios: Vec<ComentarioOut>,
    sentimiento_publicacion: Polarity,
    confianza_publicacion: f64,
    sentimiento_comentarios: Polarity,
    confianza_comentarios: f64,
    sentimiento_final: Polarity,
    confianza_final: f64,
}

impl From<ThreadResult> for PublicacionOut {
    fn from(t: ThreadResult) -> Self {
        let agg = t.aggregate;
        Self {
            id_post: t.post_id,
            texto: t.texto,
            usuario: t.usuario,
            candidato: t.candidato,
            fecha: t.fecha,
            sentiment: agg.final_label,
            confidence: round3(agg.final_confidence),
            comentarios: t
                .comments
                .into_iter()
                .map(|c| ComentarioOut {
                    id_comentario: c.id_comentario,
                    texto_comentario: c.texto_comentario,
                    sentimiento_comentario: c.result.label,
                    confianza_comentario: round3(c.result.confidence),
                })
                .collect(),
            sentimiento_publicacion: t.post.label,
            confianza_publicacion: round3(t.post.confidence),
            sentimiento_comentarios: agg.comment_label,
            confianza_comentarios: round3(agg.comment_confidence),
            sentimiento_final: agg.final_label,
            confianza_final: round3(agg.final_confidence),
        }
    }
}

#[derive(Debug, Serialize)]
struct BucketOut {
    texto: String,
    palabras: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
struct WordCloudOut {
    general: String,
    por_sentimiento: BTreeMap<&'static str, Option<BucketOut>>,
}

impl From<WordCloudData> for WordCloudOut {
    fn from(wc: WordCloudData) -> Self {
        let mut buckets = wc.buckets;
        let por_sentimiento = Polarity::ALL
            .iter()
            .map(|p| {
                let out = buckets.remove(p).flatten().map(|b| BucketOut {
                    texto: b.text,
                    palabras: b.terms.into_iter().map(|t| (t.term, t.count)).collect(),
                });
                (p.as_str(), out)
            })
            .collect();
        Self {
            general: wc.general,
            por_sentimiento,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalizarResp {
    publicaciones: Vec<PublicacionOut>,
    wordcloud: WordCloudOut,
    total_textos_analizados: usize,
}

impl From<AnalysisReport> for AnalizarResp {
    fn from(r: AnalysisReport) -> Self {
        Self {
            publicaciones: r.threads.into_iter().map(PublicacionOut::from).collect(),
            wordcloud: r.wordcloud.into(),
            total_textos_analizados: r.total_texts,
        }
    }
}

async fn analizar(State(state): State<AppState>, Json(q): Json<CorpusQuery>) -> Response {
    if q.is_blank() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "La consulta no puede estar vacía" })),
        )
            .into_response();
    }

    match state.analyzer.analyze_query(&state.corpus, &q).await {
        AnalysisOutcome::NoResults => {
            info!("analysis without matching posts");
            Json(json!({
                "sin_resultados": true,
                "mensaje": "No se encontraron publicaciones para la búsqueda",
                "publicaciones": [],
                "total_textos_analizados": 0,
            }))
            .into_response()
        }
        AnalysisOutcome::Report(report) => Json(AnalizarResp::from(report)).into_response(),
    }
}

// ------------------------------------------------------------
// POST /conclusiones
// ------------------------------------------------------------

#[derive(Serialize)]
struct ConclusionResp {
    conclusion: String,
    proveedor: &'static str,
}

async fn conclusiones(
    State(state): State<AppState>,
    Json(req): Json<ConclusionRequest>,
) -> Json<ConclusionResp> {
    let conclusion = state.conclusion.conclude(&req).await;
    Json(ConclusionResp {
        conclusion,
        proveedor: state.conclusion.provider_name(),
    })
}
