// tests/feed_normalize.rs
use btcheck::ingest::feed::{parse_feed, url_identity};
use chrono::Utc;
use std::fs;

#[test]
fn parses_livecoins_fixture() {
    let xml = fs::read_to_string("tests/fixtures/livecoins_rss.xml").expect("fixture");
    let out = parse_feed("Livecoins", &xml).expect("ok");

    // the linkless entry is skipped
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|r| r.source == "Livecoins"));

    let topo = &out[0];
    assert_eq!(topo.title, "Bitcoin dispara e atinge novo topo histórico");
    assert_eq!(topo.url, "https://livecoins.com.br/bitcoin-novo-topo/");
    assert_eq!(topo.id, url_identity("https://livecoins.com.br/bitcoin-novo-topo/"));
    assert_eq!(
        topo.summary,
        "O Bitcoin superou os US$ 100 mil nesta terça-feira."
    );
    // first <img> of the rich content block wins
    assert_eq!(
        topo.image_url.as_deref(),
        Some("https://livecoins.com.br/wp-content/uploads/topo.jpg")
    );
    assert_eq!(topo.published_at.to_rfc3339(), "2025-10-28T17:30:00+00:00");
}

#[test]
fn enclosure_backfills_missing_content_image() {
    let xml = fs::read_to_string("tests/fixtures/livecoins_rss.xml").expect("fixture");
    let out = parse_feed("Livecoins", &xml).expect("ok");
    let broken = out
        .iter()
        .find(|r| r.url.contains("btc-data-quebrada"))
        .expect("entry present");
    assert_eq!(
        broken.image_url.as_deref(),
        Some("https://livecoins.com.br/wp-content/uploads/thumb.png")
    );
}

#[test]
fn malformed_pub_date_degrades_to_now() {
    let xml = fs::read_to_string("tests/fixtures/livecoins_rss.xml").expect("fixture");
    let before = Utc::now();
    let out = parse_feed("Livecoins", &xml).expect("ok");
    let after = Utc::now();
    let broken = out
        .iter()
        .find(|r| r.url.contains("btc-data-quebrada"))
        .expect("entry present");
    assert!(broken.published_at >= before && broken.published_at <= after);
}

#[test]
fn parses_cointelegraph_atom_fixture() {
    let xml = fs::read_to_string("tests/fixtures/cointelegraph_atom.xml").expect("fixture");
    let out = parse_feed("Cointelegraph Brasil", &xml).expect("ok");
    assert_eq!(out.len(), 2);

    let etf = &out[0];
    assert_eq!(etf.title, "Bitcoin: ETFs registram entrada recorde");
    assert_eq!(etf.url, "https://br.cointelegraph.com/news/etf-recorde");
    assert_eq!(
        etf.summary,
        "Fundos de Bitcoin registram entrada recorde em um dia."
    );
    assert_eq!(etf.image_url.as_deref(), Some("https://cdn.ct.test/etf.png"));
    // published wins over updated; -03:00 normalized to UTC
    assert_eq!(etf.published_at.to_rfc3339(), "2025-10-28T19:45:00+00:00");

    // entry without rel="alternate" still resolves its link, updated is the
    // date fallback
    let other = &out[1];
    assert_eq!(other.url, "https://br.cointelegraph.com/news/mercados");
    assert_eq!(other.published_at.to_rfc3339(), "2025-10-28T15:00:00+00:00");
}

#[test]
fn garbage_document_is_an_error() {
    assert!(parse_feed("X", "this is not xml at all").is_err());
    assert!(parse_feed("X", "<html><body>nope</body></html>").is_err());
}
