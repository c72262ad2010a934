// src/corpus.rs
//! Post corpus: loading, date parsing, and the query/date-range filter used
//! by `/analizar`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default, deserialize_with = "de_id")]
    pub id_comentario: String,
    #[serde(default, deserialize_with = "de_text")]
    pub texto_comentario: String,
}

/// One scraped post. Scraper exports carry numeric ids and `null` text cells,
/// so ids are stringified and `null` reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, deserialize_with = "de_id")]
    pub id_post: String,
    #[serde(default, deserialize_with = "de_text")]
    pub candidato: String,
    #[serde(default, deserialize_with = "de_text")]
    pub usuario: String,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub texto: String,
    #[serde(default, deserialize_with = "de_comments")]
    pub comentarios: Vec<CommentRecord>,
}

/// String or number id; `null` is empty. Whole floats (`3.0`) drop the fraction.
fn de_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Option::<RawId>::deserialize(de)? {
        None => String::new(),
        Some(RawId::Text(s)) => s,
        Some(RawId::Int(n)) => n.to_string(),
        Some(RawId::Float(f)) if f.fract() == 0.0 && f.is_finite() => format!("{f:.0}"),
        Some(RawId::Float(f)) => f.to_string(),
    })
}

fn de_text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

fn de_comments<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<CommentRecord>, D::Error> {
    Ok(Option::<Vec<CommentRecord>>::deserialize(de)?.unwrap_or_default())
}

impl PostRecord {
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        self.fecha.as_deref().and_then(parse_post_date)
    }
}

/// Strict loader: a JSON array of posts.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<PostRecord>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading corpus from {}", path.display()))?;
    let posts: Vec<PostRecord> =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(posts)
}

/// Same as [`load_corpus`] but never fails: the service still boots with an
/// empty corpus and `/salud` reports zero posts.
pub fn load_corpus_lenient<P: AsRef<Path>>(path: P) -> Vec<PostRecord> {
    let path = path.as_ref();
    match load_corpus(path) {
        Ok(posts) => {
            tracing::info!(path = %path.display(), posts = posts.len(), "corpus loaded");
            posts
        }
        Err(e) => {
            warn!(path = %path.display(), error = ?e, "corpus unavailable; starting empty");
            Vec::new()
        }
    }
}

/// Accepts RFC 3339 (`2024-01-05T10:00:00Z`), naive ISO datetimes
/// (`2024-01-05T10:00:00`, `2024-01-05 10:00:00`, optional fraction) and plain
/// dates (midnight UTC). Naive values are taken as UTC.
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Range bound from a `YYYY-MM-DD` date: start of day, or 23:59:59 for the end.
pub fn parse_bound(raw: &str, is_end: bool) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    let naive = if is_end {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(Utc.from_utc_datetime(&naive))
}

/// Case-insensitive substring search over the post text and candidate name,
/// optionally restricted to a date range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_fin: Option<String>,
}

impl CorpusQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.fecha_inicio = start.map(str::to_string);
        self.fecha_fin = end.map(str::to_string);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Posts matching the query, in corpus order.
    ///
    /// An unparseable bound is ignored. A post whose own date cannot be parsed
    /// is kept even when a range is given.
    pub fn filter<'a>(&self, posts: &'a [PostRecord]) -> Vec<&'a PostRecord> {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let start = self.fecha_inicio.as_deref().and_then(|d| parse_bound(d, false));
        let end = self.fecha_fin.as_deref().and_then(|d| parse_bound(d, true));

        posts
            .iter()
            .filter(|p| {
                p.texto.to_lowercase().contains(&needle)
                    || p.candidato.to_lowercase().contains(&needle)
            })
            .filter(|p| {
                if start.is_none() && end.is_none() {
                    return true;
                }
                match p.parsed_date() {
                    Some(d) => start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e),
                    None => true,
                }
            })
            .collect()
    }
}

/// Earliest and latest parseable post dates, as `YYYY-MM-DD`.
pub fn date_span(posts: &[PostRecord]) -> (Option<String>, Option<String>) {
    let mut dates = posts.iter().filter_map(PostRecord::parsed_date);
    let Some(first) = dates.next() else {
        return (None, None);
    };
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    (
        Some(min.format("%Y-%m-%d").to_string()),
        Some(max.format("%Y-%m-%d").to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn post(id: &str, candidato: &str, fecha: Option<&str>, texto: &str) -> PostRecord {
        PostRecord {
            id_post: id.into(),
            candidato: candidato.into(),
            usuario: "u".into(),
            fecha: fecha.map(str::to_string),
            texto: texto.into(),
            comentarios: Vec::new(),
        }
    }

    fn sample() -> Vec<PostRecord> {
        vec![
            post("1", "Noboa", Some("2025-01-10T12:00:00Z"), "Debate presidencial hoy"),
            post("2", "González", Some("2025-01-20 08:30:00"), "Propuestas de empleo"),
            post("3", "Noboa", Some("ayer"), "Caravana en Guayaquil"),
            post("4", "Otro", Some("2025-02-01"), "Nada que ver"),
        ]
    }

    #[test]
    fn parses_supported_date_shapes() {
        assert!(parse_post_date("2025-01-10T12:00:00Z").is_some());
        assert!(parse_post_date("2025-01-10T12:00:00.123").is_some());
        assert!(parse_post_date("2025-01-10 12:00:00").is_some());
        assert!(parse_post_date("2025-01-10").is_some());
        assert!(parse_post_date("10/01/2025").is_none());
        assert!(parse_post_date("").is_none());
    }

    #[test]
    fn end_bound_is_inclusive_until_end_of_day() {
        let end = parse_bound("2025-01-10", true).unwrap();
        let late = parse_post_date("2025-01-10T23:59:59Z").unwrap();
        assert!(late <= end);
    }

    #[test]
    fn matches_text_or_candidate_case_insensitively() {
        let posts = sample();
        let ids: Vec<&str> = CorpusQuery::new("NOBOA")
            .filter(&posts)
            .iter()
            .map(|p| p.id_post.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);

        let ids: Vec<&str> = CorpusQuery::new("empleo")
            .filter(&posts)
            .iter()
            .map(|p| p.id_post.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn date_range_keeps_undated_posts() {
        let posts = sample();
        let q = CorpusQuery::new("noboa").with_range(Some("2025-01-11"), Some("2025-01-31"));
        let ids: Vec<&str> = q.filter(&posts).iter().map(|p| p.id_post.as_str()).collect();
        // post 1 is before the range; post 3 has an unparseable date.
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(CorpusQuery::new("   ").filter(&sample()).is_empty());
    }

    #[test]
    fn span_ignores_bad_dates() {
        let (min, max) = date_span(&sample());
        assert_eq!(min.as_deref(), Some("2025-01-10"));
        assert_eq!(max.as_deref(), Some("2025-02-01"));
        assert_eq!(date_span(&[]), (None, None));
    }

    #[test]
    fn loads_from_file_with_missing_fields() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"id_post":"9","texto":"hola","comentarios":[{{"texto_comentario":"ok"}}]}}]"#
        )
        .unwrap();
        let posts = load_corpus(f.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].comentarios[0].texto_comentario, "ok");
        assert!(posts[0].fecha.is_none());
    }

    #[test]
    fn numeric_ids_and_null_text_load() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[
                {{"id_post": 1, "candidato": "Noboa", "usuario": null, "fecha": "2025-01-10",
                  "texto": null,
                  "comentarios": [
                    {{"id_comentario": 1, "texto_comentario": "Buen debate"}},
                    {{"id_comentario": 2.0, "texto_comentario": null}}
                  ]}},
                {{"id_post": "p-2", "texto": "Caravana", "comentarios": null}}
            ]"#
        )
        .unwrap();

        let posts = load_corpus(f.path()).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id_post, "1");
        assert_eq!(posts[0].texto, "");
        assert_eq!(posts[0].usuario, "");
        assert_eq!(posts[0].comentarios[0].id_comentario, "1");
        assert_eq!(posts[0].comentarios[1].id_comentario, "2");
        assert_eq!(posts[0].comentarios[1].texto_comentario, "");
        assert_eq!(posts[1].id_post, "p-2");
        assert!(posts[1].comentarios.is_empty());

        // The lenient loader must not throw the corpus away either.
        assert_eq!(load_corpus_lenient(f.path()).len(), 2);
    }

    #[test]
    fn lenient_loader_survives_garbage() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(load_corpus_lenient(f.path()).is_empty());
    }
}
