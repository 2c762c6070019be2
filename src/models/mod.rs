use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Raw catalog entry as it appears in the dataset dump. Every field is
/// optional and the numeric-ish ones tolerate number-or-string encodings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMovie {
    pub index: Option<Value>,
    pub title: Option<String>,
    pub year: Option<Value>,
    pub rating: Option<Value>,
    /// Comma-separated string in most dumps, sometimes already a list.
    pub genre: Option<Value>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub cast: Option<Value>,
    pub awards: Option<String>,
    pub released: Option<String>,
    pub poster: Option<String>,
    pub image: Option<String>,
    pub streaming: Option<String>,
}

/// Normalized catalog record. Immutable once built; missing source fields
/// are filled with the defaults documented in `normalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub genre: Vec<String>,
    pub runtime: String,
    pub plot: String,
    pub director: String,
    pub writer: String,
    pub cast: Vec<String>,
    pub awards: String,
    pub released: String,
    pub poster: String,
    pub streaming: String,
}

impl Movie {
    /// Concatenated searchable text: title, plot, director, writer, genres
    /// and cast joined with spaces, lowercased.
    pub fn search_haystack(&self) -> String {
        [
            self.title.as_str(),
            self.plot.as_str(),
            self.director.as_str(),
            self.writer.as_str(),
            &self.genre.join(" "),
            &self.cast.join(" "),
        ]
        .join(" ")
        .to_lowercase()
    }

    pub fn year_label(&self) -> String {
        self.year.map_or_else(|| "N/A".to_string(), |y| y.to_string())
    }

    pub fn rating_label(&self) -> String {
        self.rating
            .map_or_else(|| "NR".to_string(), |r| format!("{:.1}", r))
    }

    pub fn watch_url(&self) -> String {
        youtube_search_url(&format!("{} full movie", self.title))
    }

    pub fn trailer_url(&self) -> String {
        youtube_search_url(&format!("{} trailer", self.title))
    }

    /// One-line share blurb: title, year and the first 100 characters of
    /// the plot.
    pub fn share_text(&self) -> String {
        let truncated: String = self.plot.chars().take(100).collect();
        let ellipsis = if self.plot.chars().count() > 100 {
            "…"
        } else {
            ""
        };
        match self.year {
            Some(year) => format!("{} ({}) · {}{}", self.title, year, truncated, ellipsis),
            None => format!("{} · {}{}", self.title, truncated, ellipsis),
        }
    }
}

fn youtube_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(query)
    )
}

/// A favorited record: a copy of the movie at the moment it was saved plus
/// the save timestamp. Later edits to the collection never reach this copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Popularity,
    Rating,
    Runtime,
    Year,
    Released,
    Title,
    /// Unrecognized key: no comparison is performed and the input order is
    /// preserved.
    Unsorted,
}

impl SortKey {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "popularity" => SortKey::Popularity,
            "rating" => SortKey::Rating,
            "runtime" => SortKey::Runtime,
            "year" => SortKey::Year,
            "released" => SortKey::Released,
            "title" => SortKey::Title,
            _ => SortKey::Unsorted,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Popularity => "popularity",
            SortKey::Rating => "rating",
            SortKey::Runtime => "runtime",
            SortKey::Year => "year",
            SortKey::Released => "released",
            SortKey::Title => "title",
            SortKey::Unsorted => "unsorted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    /// The direction is a multiplier on the base ascending comparison.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Pagination style: numbered windows or a cumulative "load more" window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Windowed,
    LoadMore,
}

impl PageMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "windowed" | "pages" => Some(PageMode::Windowed),
            "loadmore" | "load-more" | "cumulative" => Some(PageMode::LoadMore),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str) -> Movie {
        Movie {
            id: "1".to_string(),
            title: title.to_string(),
            year: Some(1975),
            rating: Some(8.2),
            genre: vec!["Drama".to_string(), "Action".to_string()],
            runtime: "175 min".to_string(),
            plot: "A sprawling family saga.".to_string(),
            director: "Someone".to_string(),
            writer: "Someone Else".to_string(),
            cast: vec!["Lead Actor".to_string()],
            awards: "None yet".to_string(),
            released: "1975-08-15".to_string(),
            poster: String::new(),
            streaming: String::new(),
        }
    }

    #[test]
    fn haystack_contains_every_scanned_field() {
        let haystack = movie("Sholay").search_haystack();
        for needle in ["sholay", "family saga", "someone else", "drama", "lead actor"] {
            assert!(haystack.contains(needle), "missing {needle:?}");
        }
    }

    #[test]
    fn watch_url_is_percent_encoded() {
        let url = movie("Muthu & Co").watch_url();
        assert_eq!(
            url,
            "https://www.youtube.com/results?search_query=Muthu%20%26%20Co%20full%20movie"
        );
    }

    #[test]
    fn unknown_sort_key_parses_as_unsorted() {
        assert_eq!(SortKey::parse("box-office"), SortKey::Unsorted);
        assert_eq!(SortKey::parse(" Year "), SortKey::Year);
    }

    #[test]
    fn direction_multiplier_reverses_ordering() {
        assert_eq!(
            SortDirection::Descending.apply(Ordering::Less),
            Ordering::Greater
        );
        assert_eq!(
            SortDirection::Ascending.apply(Ordering::Less),
            Ordering::Less
        );
    }

    #[test]
    fn share_text_truncates_long_plots() {
        let mut long = movie("Epic");
        long.plot = "x".repeat(150);
        let text = long.share_text();
        assert!(text.starts_with("Epic (1975) · "));
        assert!(text.ends_with('…'));
    }

    #[test]
    fn favorite_round_trips_with_flattened_movie() {
        let favorite = Favorite {
            movie: movie("Sholay"),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_value(&favorite).unwrap();
        assert_eq!(json["title"], "Sholay");
        assert!(json.get("savedAt").is_some());
        let back: Favorite = serde_json::from_value(json).unwrap();
        assert_eq!(back.movie.title, "Sholay");
    }
}
