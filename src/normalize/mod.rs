use crate::models::{Movie, RawMovie};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use uuid::Uuid;

/// Inline SVG shown when a record has no poster at all.
pub const PLACEHOLDER_POSTER: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='300' height='450'%3E%3Crect width='300' height='450' fill='%23111827'/%3E%3Ctext x='50%25' y='50%25' dominant-baseline='middle' text-anchor='middle' fill='%23ffffff' font-family='Arial' font-size='16'%3ENo Image%3C/text%3E%3C/svg%3E";

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_\.(jpg|jpeg|png|webp)$").unwrap());

/// Maps a raw dataset entry into the canonical `Movie` shape. Total: every
/// missing or malformed field degrades to its documented default, never an
/// error.
pub fn normalize(raw: RawMovie) -> Movie {
    let year = raw
        .year
        .as_ref()
        .and_then(coerce_number)
        .map(|n| n as i32)
        .filter(|y| *y > 0);
    // `Number(x) || null` in the source treats 0 as absent; same here.
    let rating = raw
        .rating
        .as_ref()
        .and_then(coerce_number)
        .filter(|r| *r != 0.0);

    let poster = raw
        .poster
        .or(raw.image)
        .filter(|p| !p.trim().is_empty())
        .map(|p| upgrade_image_url(&p))
        .unwrap_or_else(|| PLACEHOLDER_POSTER.to_string());

    Movie {
        id: record_id(raw.index.as_ref()),
        title: non_empty(raw.title, "Untitled"),
        year,
        rating,
        genre: genre_list(raw.genre.as_ref()),
        runtime: non_empty(raw.runtime, "Unknown runtime"),
        plot: non_empty(raw.plot, "No plot summary available."),
        director: non_empty(raw.director, "Unknown director"),
        writer: non_empty(raw.writer, "Unknown writer"),
        cast: name_list(raw.cast.as_ref()),
        awards: non_empty(raw.awards, "No awards data"),
        released: non_empty(raw.released, "Unreleased"),
        poster,
        streaming: raw.streaming.unwrap_or_default(),
    }
}

/// Rewrites Amazon CDN poster URLs to the highest-quality variant:
/// quality raised to QL100, the dimension token raised to 2000px on its
/// original axis (UX width / UY height), crop parameters dropped, file
/// extension preserved.
///
/// Input:  `...@._V1_QL75_UY900_CR5,0,90,133_.jpg`
/// Output: `...@._V1_QL100_UY2000_.jpg`
///
/// Anything that does not look like such a URL is returned unchanged.
pub fn upgrade_image_url(url: &str) -> String {
    if !url.contains("m.media-amazon.com") {
        return url.to_string();
    }

    const VERSION_TAG: &str = "@._V1_";
    let Some(tag_start) = url.rfind(VERSION_TAG) else {
        return url.to_string();
    };
    let base = &url[..tag_start + VERSION_TAG.len()];
    let params = &url[tag_start + VERSION_TAG.len()..];

    let dimension = if params.contains("UX") {
        "UX2000"
    } else {
        "UY2000"
    };
    let extension = EXTENSION_RE
        .find(url)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "_.jpg".to_string());

    format!("{base}QL100_{dimension}{extension}")
}

fn record_id(index: Option<&Value>) -> String {
    match index {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn non_empty(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Genre arrives as a comma-separated string in most dumps, occasionally as
/// a ready-made list.
fn genre_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => trimmed_strings(items),
        _ => Vec::new(),
    }
}

fn name_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => trimmed_strings(items),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn trimmed_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_gets_all_defaults() {
        let movie = normalize(RawMovie::default());
        assert_eq!(movie.title, "Untitled");
        assert_eq!(movie.year, None);
        assert_eq!(movie.rating, None);
        assert!(movie.genre.is_empty());
        assert!(movie.cast.is_empty());
        assert_eq!(movie.runtime, "Unknown runtime");
        assert_eq!(movie.released, "Unreleased");
        assert_eq!(movie.poster, PLACEHOLDER_POSTER);
        // Generated id must still be usable as a key.
        assert!(!movie.id.is_empty());
    }

    #[test]
    fn numeric_fields_tolerate_string_encodings() {
        let raw: RawMovie = serde_json::from_value(json!({
            "index": 42,
            "year": "1987",
            "rating": "8.4",
        }))
        .unwrap();
        let movie = normalize(raw);
        assert_eq!(movie.id, "42");
        assert_eq!(movie.year, Some(1987));
        assert_eq!(movie.rating, Some(8.4));
    }

    #[test]
    fn zero_and_garbage_ratings_normalize_to_absent() {
        for rating in [json!(0), json!("not a number"), json!(null)] {
            let raw: RawMovie = serde_json::from_value(json!({ "rating": rating })).unwrap();
            assert_eq!(normalize(raw).rating, None);
        }
    }

    #[test]
    fn negative_year_is_treated_as_unknown() {
        let raw: RawMovie = serde_json::from_value(json!({ "year": -3 })).unwrap();
        assert_eq!(normalize(raw).year, None);
    }

    #[test]
    fn genre_string_is_split_and_trimmed() {
        let raw: RawMovie =
            serde_json::from_value(json!({ "genre": "Drama, Action , ,Comedy" })).unwrap();
        assert_eq!(normalize(raw).genre, vec!["Drama", "Action", "Comedy"]);
    }

    #[test]
    fn cast_list_drops_blank_entries() {
        let raw: RawMovie =
            serde_json::from_value(json!({ "cast": ["Rajinikanth", "  ", "Sridevi "] })).unwrap();
        assert_eq!(normalize(raw).cast, vec!["Rajinikanth", "Sridevi"]);
    }

    #[test]
    fn image_field_is_a_poster_fallback() {
        let raw: RawMovie =
            serde_json::from_value(json!({ "image": "https://example.com/p.jpg" })).unwrap();
        assert_eq!(normalize(raw).poster, "https://example.com/p.jpg");
    }

    #[test]
    fn amazon_poster_is_upgraded() {
        let url = "https://m.media-amazon.com/images/M/abc123@._V1_QL75_UY900_CR5,0,90,133_.jpg";
        assert_eq!(
            upgrade_image_url(url),
            "https://m.media-amazon.com/images/M/abc123@._V1_QL100_UY2000_.jpg"
        );
    }

    #[test]
    fn width_based_posters_keep_their_axis() {
        let url = "https://m.media-amazon.com/images/M/abc@._V1_QL75_UX600_.png";
        assert_eq!(
            upgrade_image_url(url),
            "https://m.media-amazon.com/images/M/abc@._V1_QL100_UX2000_.png"
        );
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        let url = "https://m.media-amazon.com/images/M/abc@._V1_QL75_UY900";
        assert_eq!(
            upgrade_image_url(url),
            "https://m.media-amazon.com/images/M/abc@._V1_QL100_UY2000_.jpg"
        );
    }

    #[test]
    fn non_amazon_urls_pass_through() {
        let url = "https://images.example.org/poster.png";
        assert_eq!(upgrade_image_url(url), url);
        let no_tag = "https://m.media-amazon.com/images/M/plain.jpg";
        assert_eq!(upgrade_image_url(no_tag), no_tag);
    }
}
