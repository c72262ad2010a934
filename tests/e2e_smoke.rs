// tests/e2e_smoke.rs
//
// End-to-end scenarios through the Analyzer with a stubbed classifier.

use std::sync::Arc;

use sentivote::analyze::rules::RuleKind;
use sentivote::classifier::StaticClassifier;
use sentivote::corpus::{CommentRecord, CorpusQuery, PostRecord};
use sentivote::lexicon::Lexicon;
use sentivote::{AnalysisOutcome, Analyzer, Polarity};

const EPS: f32 = 1e-5;

fn analyzer(label: &str, score: f32) -> Analyzer {
    Analyzer::new(
        Arc::new(Lexicon::builtin()),
        Arc::new(StaticClassifier::new(label, score)),
    )
}

fn lone_post(texto: &str) -> PostRecord {
    PostRecord {
        id_post: "p1".into(),
        candidato: "Candidata".into(),
        usuario: "u1".into(),
        fecha: Some("2025-01-10T10:00:00Z".into()),
        texto: texto.into(),
        comentarios: Vec::new(),
    }
}

#[tokio::test]
async fn positive_post_without_comments_ends_neutral() {
    let a = analyzer("NEU", 0.6);
    let AnalysisOutcome::Report(report) = a.analyze_posts(vec![lone_post("Gran líder transparente")]).await
    else {
        panic!("expected a report");
    };

    let t = &report.threads[0];
    assert_eq!(t.post.label, Polarity::Positive);
    assert!((t.post.confidence - 0.75).abs() < EPS, "post conf {}", t.post.confidence);
    assert_eq!(t.post_rule, RuleKind::LexicalDominance);

    assert_eq!(t.aggregate.comment_label, Polarity::Neutral);
    assert!((t.aggregate.comment_confidence - 0.5).abs() < EPS);
    assert_eq!(t.aggregate.final_label, Polarity::Neutral);
    assert!(
        (t.aggregate.final_confidence - 0.6).abs() < EPS,
        "final conf {}",
        t.aggregate.final_confidence
    );
    assert_eq!(report.total_texts, 1);
}

#[tokio::test]
async fn disaster_post_is_negative() {
    let a = analyzer("NEU", 0.6);
    let t = a.analyze_thread(&lone_post("Este candidato es un desastre")).await;
    assert_eq!(t.post.label, Polarity::Negative);
    assert!((t.post.confidence - 0.75).abs() < EPS);
}

#[tokio::test]
async fn obfuscated_insult_in_comment_forces_negative_thread() {
    let a = analyzer("POS", 0.95);
    let mut post = lone_post("Excelente debate");
    post.comentarios.push(CommentRecord {
        id_comentario: "c1".into(),
        texto_comentario: "h3uv0n".into(),
    });
    let t = a.analyze_thread(&post).await;

    assert_eq!(t.comments[0].result.label, Polarity::Negative);
    assert_eq!(t.comments[0].result.confidence, 1.0);
    assert_eq!(t.comments[0].rule, RuleKind::InsultOverride);
    assert_eq!(t.aggregate.final_label, Polarity::Negative);
}

#[tokio::test]
async fn query_without_matches_is_no_results() {
    let a = analyzer("NEU", 0.6);
    let corpus = vec![lone_post("Caravana en Guayaquil")];
    let outcome = a.analyze_query(&corpus, &CorpusQuery::new("Cuenca")).await;
    assert!(matches!(outcome, AnalysisOutcome::NoResults));
}

#[tokio::test]
async fn wordcloud_general_string_joins_cleaned_texts() {
    let a = analyzer("NEU", 0.6);
    let mut post = lone_post("Propuestas de empleo https://t.co/x @alguien");
    post.comentarios.push(CommentRecord {
        id_comentario: "c1".into(),
        texto_comentario: "Salud y educación ya".into(),
    });
    let AnalysisOutcome::Report(report) = a.analyze_posts(vec![post]).await else {
        panic!("expected a report");
    };
    assert_eq!(report.wordcloud.general, "propuestas empleo salud educación");
    assert_eq!(report.wordcloud.buckets.len(), 3);
}
