// src/ingest/sources.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::FeedSource;

const ENV_PATH: &str = "NEWS_SOURCES_PATH";

/// Built-in feed list, used when no sources file is configured.
pub fn default_sources() -> Vec<FeedSource> {
    [
        ("Livecoins", "https://livecoins.com.br/feed/"),
        ("Cointelegraph Brasil", "https://br.cointelegraph.com/rss"),
        ("Portal do Bitcoin", "https://portaldobitcoin.uol.com.br/feed/"),
        ("Bitcoinist", "https://bitcoinist.com/feed/"),
    ]
    .into_iter()
    .map(|(name, url)| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

/// Load the feed list from an explicit path. Supports TOML or JSON.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load the feed list using env var + fallbacks:
/// 1) $NEWS_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in defaults
pub fn load_sources_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to a non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_sources())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let try_toml = hint_ext == "toml" || s.contains("sources");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<FeedSource>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: Vec<FeedSource> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim fields, drop incomplete entries, keep first occurrence per feed url.
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim().to_string();
        let url = it.url.trim().to_string();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        if seen.insert(url.clone()) {
            out.push(FeedSource { name, url });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_and_json_formats_parse() {
        let toml = r#"
            [[sources]]
            name = " Livecoins "
            url = "https://livecoins.com.br/feed/"

            [[sources]]
            name = "Dup"
            url = "https://livecoins.com.br/feed/"
        "#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Livecoins");

        let json = r#"[{"name": "Bitcoinist", "url": " https://bitcoinist.com/feed/ "},
                       {"name": "", "url": "https://x.test/feed"}]"#;
        let out = parse_json(json).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://bitcoinist.com/feed/");
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_builtins() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);

        // No files in temp CWD: built-in list
        let v = load_sources_default().unwrap();
        assert_eq!(v, default_sources());

        // Env path wins
        let p_json = tmp.path().join("sources.json");
        fs::write(&p_json, r#"[{"name": "X", "url": "https://x.test/feed"}]"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let v2 = load_sources_default().unwrap();
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].name, "X");
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
