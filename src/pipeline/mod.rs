use crate::models::{Movie, PageMode, SortDirection, SortKey};
use chrono::NaiveDate;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// One pipeline invocation: free-text query, sort order and page position.
/// The caller owns this state and resets `page` to 1 whenever the query or
/// sort changes.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub query: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
    pub mode: PageMode,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_key: SortKey::Year,
            direction: SortDirection::Descending,
            page: 1,
            page_size: 36,
            mode: PageMode::Windowed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageResult {
    pub items: Vec<Movie>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

impl PageResult {
    /// True while the filtered set extends past the visible window.
    pub fn has_more(&self) -> bool {
        self.items.len() < self.total_count
    }
}

/// Filter, sort and paginate the collection. Total for every input: an
/// empty collection yields an empty slice with `total_pages == 1`, and an
/// unrecognized sort key leaves the input order untouched.
pub fn run(collection: &[Movie], request: &PageRequest) -> PageResult {
    let query = request.query.trim().to_lowercase();
    let mut filtered: Vec<&Movie> = collection
        .iter()
        .filter(|movie| query.is_empty() || movie.search_haystack().contains(&query))
        .collect();

    if request.sort_key != SortKey::Unsorted {
        // sort_by is stable, so equal keys keep their collection order.
        filtered.sort_by(|a, b| compare(a, b, request.sort_key, request.direction));
    }

    paginate(&filtered, request)
}

fn compare(a: &Movie, b: &Movie, key: SortKey, direction: SortDirection) -> Ordering {
    match key {
        // Missing years sort after every present year, independent of
        // direction.
        SortKey::Year => match (a.year, b.year) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => direction.apply(left.cmp(&right)),
        },
        SortKey::Popularity => {
            direction.apply(popularity_score(a).total_cmp(&popularity_score(b)))
        }
        SortKey::Rating => {
            direction.apply(a.rating.unwrap_or(0.0).total_cmp(&b.rating.unwrap_or(0.0)))
        }
        SortKey::Runtime => {
            direction.apply(parse_runtime(&a.runtime).cmp(&parse_runtime(&b.runtime)))
        }
        SortKey::Released => direction.apply(
            parse_release_date(&a.released).cmp(&parse_release_date(&b.released)),
        ),
        SortKey::Title => direction.apply(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
        SortKey::Unsorted => Ordering::Equal,
    }
}

/// Rating stands in for popularity; records without one fall back to
/// year/100 so newer unrated titles still outrank ancient unrated ones.
fn popularity_score(movie: &Movie) -> f64 {
    movie
        .rating
        .unwrap_or_else(|| movie.year.map(|y| f64::from(y) / 100.0).unwrap_or(0.0))
}

fn paginate(filtered: &[&Movie], request: &PageRequest) -> PageResult {
    let page_size = request.page_size.max(1);
    let total_count = filtered.len();
    let total_pages = total_count.div_ceil(page_size).max(1);
    let current_page = request.page.clamp(1, total_pages);

    let (start, end) = match request.mode {
        PageMode::Windowed => {
            let start = (current_page - 1) * page_size;
            (start, (start + page_size).min(total_count))
        }
        PageMode::LoadMore => (0, (current_page * page_size).min(total_count)),
    };

    PageResult {
        items: filtered[start..end].iter().map(|m| (*m).clone()).collect(),
        current_page,
        total_pages,
        total_count,
    }
}

static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:min(?:utes?)?|m\b)").unwrap());
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*h").unwrap());

/// Extracts minutes from free text like "120 min", "2h 30min" or "1 hour
/// 45 minutes". Hour and minute components combine; anything unparsable is
/// 0.
pub fn parse_runtime(runtime: &str) -> i64 {
    let minutes = MINUTES_RE
        .captures(runtime)
        .and_then(|c| c[1].parse::<i64>().ok())
        .unwrap_or(0);
    let hours = HOURS_RE
        .captures(runtime)
        .and_then(|c| c[1].parse::<i64>().ok())
        .unwrap_or(0);
    hours * 60 + minutes
}

const DATE_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parses free-text release dates ("31 Oct 1931", "2020-01-15", "1972")
/// into epoch milliseconds; unparsable input is 0 and therefore sorts as
/// earliest.
pub fn parse_release_date(released: &str) -> i64 {
    let trimmed = released.trim();
    if trimmed.is_empty() {
        return 0;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date_millis(date);
        }
    }
    if let Ok(year) = trimmed.parse::<i32>() {
        if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
            return date_millis(date);
        }
    }
    0
}

fn date_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}
