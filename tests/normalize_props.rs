// tests/normalize_props.rs
//
// Randomised property checks: normalisation is idempotent and reinforced
// confidences always stay inside [0, 1].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sentivote::analyze::rules::SentimentReinforcer;
use sentivote::lexicon::Lexicon;
use sentivote::text::{normalize, normalize_for_wordcloud};
use sentivote::Polarity;

const PIECES: &[&str] = &[
    "Gran", "líder", "https://t.co/abc", "www.ejemplo.ec", "@usuario", "#Elecciones2025", "¡", "!",
    "¿", "?", "100%", "2025", "no", "es", "bueno", "h3uv0n", "&amp;", "&lt;b&gt;", "ñandú",
    "  ", "\n", "desastre", "claro", "...", "RT", "😀", "a", "de", "mal gobierno",
];

fn random_text(rng: &mut StdRng) -> String {
    let n = rng.random_range(0..14);
    (0..n)
        .map(|_| PIECES[rng.random_range(0..PIECES.len())])
        .collect::<Vec<_>>()
        .join(if rng.random_bool(0.3) { "" } else { " " })
}

#[test]
fn normalize_is_idempotent_on_random_inputs() {
    let mut rng = StdRng::seed_from_u64(0x5e17);
    for _ in 0..500 {
        let t = random_text(&mut rng);
        let once = normalize(&t);
        assert_eq!(normalize(&once), once, "input: {t:?}");
        let wc = normalize_for_wordcloud(&t);
        assert_eq!(normalize_for_wordcloud(&wc), wc, "input: {t:?}");
    }
}

#[test]
fn normalize_edge_inputs() {
    for t in ["", "   ", "https://a.b/c www.x.y", "@uno @dos", "123 456"] {
        assert_eq!(normalize(t), "", "input: {t:?}");
        assert_eq!(normalize(&normalize(t)), normalize(t));
    }
}

#[test]
fn reinforced_confidence_is_always_clamped() {
    let lexicon = Lexicon::builtin();
    let reinforcer = SentimentReinforcer::new(&lexicon);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let t = random_text(&mut rng);
        let label = Polarity::ALL[rng.random_range(0..3)];
        let conf: f32 = rng.random_range(-0.5..1.5);
        let r = reinforcer.reinforce(&t, label, conf);
        assert!((0.0..=1.0).contains(&r.confidence), "{t:?} {label} {conf} -> {r:?}");
    }
}
