use crate::models::Movie;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;

/// A cluster of records sharing a derived key (genre, cast member, year).
#[derive(Debug, Clone)]
pub struct Group<K> {
    pub key: K,
    pub movies: Vec<Movie>,
}

/// Clusters by genre, ranked by descending member count then ascending
/// name.
pub fn by_genre(collection: &[Movie]) -> Vec<Group<String>> {
    cluster_by_names(collection, |movie| &movie.genre)
}

/// Clusters by cast member, same ranking rule as every grouping view.
pub fn by_cast(collection: &[Movie]) -> Vec<Group<String>> {
    cluster_by_names(collection, |movie| &movie.cast)
}

/// Clusters by release year, optionally restricted to an inclusive range.
/// Records without a year are left out entirely.
pub fn by_year(collection: &[Movie], min: Option<i32>, max: Option<i32>) -> Vec<Group<i32>> {
    let mut clusters: HashMap<i32, Vec<Movie>> = HashMap::new();
    for movie in collection {
        let Some(year) = movie.year else { continue };
        if min.is_some_and(|m| year < m) || max.is_some_and(|m| year > m) {
            continue;
        }
        clusters.entry(year).or_default().push(movie.clone());
    }
    finish(clusters)
}

/// Case-insensitive substring filter over group names.
pub fn filter_by_name<K: Display>(groups: Vec<Group<K>>, query: &str) -> Vec<Group<K>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.key.to_string().to_lowercase().contains(&query))
        .collect()
}

/// Finds one group by exact (case-insensitive) name.
pub fn find<K: Display>(groups: &[Group<K>], name: &str) -> Option<Group<K>>
where
    K: Clone,
{
    let wanted = name.trim().to_lowercase();
    groups
        .iter()
        .find(|g| g.key.to_string().to_lowercase() == wanted)
        .cloned()
}

fn cluster_by_names<'a, F>(collection: &'a [Movie], names: F) -> Vec<Group<String>>
where
    F: Fn(&'a Movie) -> &'a Vec<String>,
{
    let mut clusters: HashMap<String, Vec<Movie>> = HashMap::new();
    for movie in collection {
        for name in names(movie) {
            clusters
                .entry(name.clone())
                .or_default()
                .push(movie.clone());
        }
    }
    finish(clusters)
}

fn finish<K: Ord>(clusters: HashMap<K, Vec<Movie>>) -> Vec<Group<K>> {
    let mut groups: Vec<Group<K>> = clusters
        .into_iter()
        .map(|(key, mut movies)| {
            movies.sort_by(member_order);
            Group { key, movies }
        })
        .collect();
    // Shared ranking contract: biggest cluster first, names break ties.
    groups.sort_by(|a, b| {
        b.movies
            .len()
            .cmp(&a.movies.len())
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}

/// Within a cluster: rating descending (unrated last), then year
/// descending (unknown last), then title.
fn member_order(a: &Movie, b: &Movie) -> Ordering {
    let rating = match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let year = match (a.year, b.year) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    rating
        .then(year)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}
