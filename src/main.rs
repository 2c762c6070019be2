mod catalog;
mod config;
mod debounce;
mod groups;
mod http;
mod models;
mod normalize;
mod pipeline;
mod store;

use anyhow::Result;
use catalog::{CatalogClient, DatasetSource};
use clap::{Parser, Subcommand};
use config::Configuration;
use debounce::Debouncer;
use http::HttpClient;
use models::{Favorite, Movie, SortDirection, SortKey};
use pipeline::{PageRequest, PageResult};
use store::{FavoriteSortKey, Store, Theme};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Dataset URL or file path (overrides the configuration file)
    #[arg(short, long)]
    dataset: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Browse the catalog interactively with live search
    Browse,
    /// Run one search and print the resulting page
    Search {
        query: Option<String>,
        #[arg(long, default_value = "year")]
        sort: String,
        #[arg(long, default_value = "desc")]
        direction: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Manage saved favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List genre clusters, or the movies in one genre
    Genres {
        name: Option<String>,
        /// Filter cluster names
        #[arg(long)]
        query: Option<String>,
    },
    /// List cast clusters, or the movies featuring one person
    Cast {
        name: Option<String>,
        /// Filter cluster names
        #[arg(long)]
        query: Option<String>,
    },
    /// List release-year clusters, or the movies from one year
    Years {
        year: Option<i32>,
        #[arg(long)]
        min: Option<i32>,
        #[arg(long)]
        max: Option<i32>,
    },
    /// Show everything about one record
    Details { id: String },
    /// Show or change the persisted theme preference
    Theme { mode: Option<String> },
}

#[derive(Subcommand)]
enum FavoritesAction {
    List {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "added")]
        sort: String,
        #[arg(long, default_value = "desc")]
        direction: String,
    },
    Add {
        id: String,
    },
    Remove {
        id: String,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    info!("Starting catalogarr v0.1.0");

    let config = Configuration::load_or_default(&cli.config)?;
    let mut store = Store::open(&config.storage_path())?;

    match &cli.command {
        Command::Browse => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            browse(&collection, &mut store, &config).await?;
        }
        Command::Search {
            query,
            sort,
            direction,
            page,
            page_size,
        } => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            let request = PageRequest {
                query: query.clone().unwrap_or_default(),
                sort_key: parse_sort_key(sort),
                direction: parse_direction(direction),
                page: *page,
                page_size: page_size.unwrap_or_else(|| config.page_size()),
                mode: config.pagination_mode(),
            };
            let result = pipeline::run(&collection, &request);
            render_page(&result, &request, &store);
        }
        Command::Favorites { action } => match action {
            FavoritesAction::List {
                query,
                sort,
                direction,
            } => {
                let favorites = store::filter_favorites(
                    &store.favorites(),
                    query.as_deref().unwrap_or(""),
                );
                let favorites = store::sort_favorites(
                    favorites,
                    FavoriteSortKey::parse(sort),
                    parse_direction(direction),
                );
                render_favorites(&favorites);
            }
            FavoritesAction::Add { id } => {
                let Some(collection) = load_collection(&cli, &config).await else {
                    return Ok(());
                };
                match collection.iter().find(|m| m.id == *id) {
                    Some(movie) => {
                        store.add(movie)?;
                        println!("Added to favorites: {}", movie.title);
                    }
                    None => println!("No record with id {id}"),
                }
            }
            FavoritesAction::Remove { id } => {
                store.remove(id)?;
                println!("Removed from favorites: {id}");
            }
            FavoritesAction::Clear => {
                store.clear()?;
                println!("Cleared favorites");
            }
        },
        Command::Genres { name, query } => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            let clusters = groups::by_genre(&collection);
            render_clusters("genre", clusters, name.as_deref(), query.as_deref(), &store);
        }
        Command::Cast { name, query } => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            let clusters = groups::by_cast(&collection);
            render_clusters("cast", clusters, name.as_deref(), query.as_deref(), &store);
        }
        Command::Years { year, min, max } => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            let clusters = groups::by_year(&collection, *min, *max);
            match year {
                Some(year) => match groups::find(&clusters, &year.to_string()) {
                    Some(cluster) => {
                        println!("{} · {} movies", cluster.key, cluster.movies.len());
                        for movie in &cluster.movies {
                            render_movie_row(movie, &store);
                        }
                    }
                    None => println!("No movies from {year}"),
                },
                None => {
                    for cluster in &clusters {
                        println!("{} ({} movies)", cluster.key, cluster.movies.len());
                    }
                }
            }
        }
        Command::Details { id } => {
            let Some(collection) = load_collection(&cli, &config).await else {
                return Ok(());
            };
            match collection.iter().find(|m| m.id == *id) {
                Some(movie) => render_details(movie, &store),
                None => println!("No record with id {id}"),
            }
        }
        Command::Theme { mode } => {
            let default = config.default_theme();
            match mode.as_deref() {
                None => println!("Theme: {}", store.theme().unwrap_or(default).label()),
                Some("toggle") => {
                    let next = store.toggle_theme(default)?;
                    println!("Theme: {}", next.label());
                }
                Some(value) => match Theme::parse(value) {
                    Some(theme) => {
                        store.set_theme(theme)?;
                        println!("Theme: {}", theme.label());
                    }
                    None => println!("Unknown theme {value:?} (expected dark, light or toggle)"),
                },
            }
        }
    }

    Ok(())
}

/// One-shot dataset load. A failure is rendered as the empty state and
/// ends the command; there is no retry loop.
async fn load_collection(cli: &Cli, config: &Configuration) -> Option<Vec<Movie>> {
    let source = match DatasetSource::resolve(cli.dataset.as_deref(), config) {
        Ok(source) => source,
        Err(e) => {
            error!("{e}");
            println!("No catalog available: {e}");
            return None;
        }
    };
    let client = CatalogClient::new(HttpClient::new(), source);
    match client.load().await {
        Ok(collection) => Some(collection),
        Err(e) => {
            error!("Catalog load failed: {e}");
            println!("No catalog available: {e}");
            None
        }
    }
}

fn parse_sort_key(value: &str) -> SortKey {
    let key = SortKey::parse(value);
    if key == SortKey::Unsorted && value.trim().to_ascii_lowercase() != "unsorted" {
        warn!("Unknown sort key {value:?}, leaving collection order unchanged");
    }
    key
}

fn parse_direction(value: &str) -> SortDirection {
    SortDirection::parse(value).unwrap_or_else(|| {
        warn!("Unknown sort direction {value:?}, defaulting to descending");
        SortDirection::Descending
    })
}

/// Interactive loop: plain text updates the query through the debouncer,
/// `:commands` apply immediately. Query and sort changes reset to page 1.
async fn browse(collection: &[Movie], store: &mut Store, config: &Configuration) -> Result<()> {
    let mut request = PageRequest {
        page_size: config.page_size(),
        mode: config.pagination_mode(),
        ..PageRequest::default()
    };
    let mut debouncer = Debouncer::new(config.debounce_delay());

    println!(
        "{} titles across {} genres. Type to search; :sort <key>, :dir [asc|desc], :next/:prev/:page N/:more, :fav <id>, :unfav <id>, :favs, :quit",
        collection.len(),
        catalog::distinct_genres(collection).len()
    );
    run_and_render(collection, &mut request, store);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if let Some(command) = input.strip_prefix(':') {
                    if !apply_command(command, &mut request, collection, store)? {
                        break;
                    }
                } else {
                    debouncer.push(input.to_string());
                }
            }
            query = debouncer.settled() => {
                request.query = query;
                request.page = 1;
                run_and_render(collection, &mut request, store);
            }
        }
    }

    Ok(())
}

/// Runs the pipeline and writes the clamped page back so `:next` past the
/// end does not drift.
fn run_and_render(collection: &[Movie], request: &mut PageRequest, store: &Store) {
    let result = pipeline::run(collection, request);
    request.page = result.current_page;
    render_page(&result, request, store);
}

/// Returns false when the loop should exit.
fn apply_command(
    command: &str,
    request: &mut PageRequest,
    collection: &[Movie],
    store: &mut Store,
) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or("");
    let argument = parts.next().unwrap_or("");

    match verb {
        "quit" | "q" => return Ok(false),
        "sort" => {
            request.sort_key = parse_sort_key(argument);
            request.page = 1;
        }
        "dir" => {
            request.direction = match SortDirection::parse(argument) {
                Some(direction) => direction,
                None => request.direction.flipped(),
            };
            request.page = 1;
        }
        "page" => match argument.parse::<usize>() {
            Ok(page) => request.page = page,
            Err(_) => {
                println!("Usage: :page <number>");
                return Ok(true);
            }
        },
        "next" | "more" => request.page += 1,
        "prev" => request.page = request.page.saturating_sub(1).max(1),
        "fav" => {
            match collection.iter().find(|m| m.id == argument) {
                Some(movie) => {
                    store.add(movie)?;
                    println!("Added to favorites: {}", movie.title);
                }
                None => println!("No record with id {argument}"),
            }
            return Ok(true);
        }
        "unfav" => {
            store.remove(argument)?;
            println!("Removed from favorites: {argument}");
            return Ok(true);
        }
        "favs" => {
            render_favorites(&store.favorites());
            return Ok(true);
        }
        _ => {
            println!("Unknown command :{verb}");
            return Ok(true);
        }
    }

    run_and_render(collection, request, store);
    Ok(true)
}

fn render_page(result: &PageResult, request: &PageRequest, store: &Store) {
    if result.items.is_empty() {
        println!("No matches.");
    }
    for movie in &result.items {
        render_movie_row(movie, store);
    }
    println!(
        "Page {} of {} · {} titles · sort: {} {}{}",
        result.current_page,
        result.total_pages,
        result.total_count,
        request.sort_key.label(),
        request.direction.label(),
        if result.has_more() { " · more available" } else { "" }
    );
}

fn render_movie_row(movie: &Movie, store: &Store) {
    let marker = if store.is_favorite(&movie.id) { "♥" } else { " " };
    println!(
        "{} {:<40} {:>4}  ★ {:>4}  #{}",
        marker,
        movie.title,
        movie.year_label(),
        movie.rating_label(),
        movie.id
    );
}

fn render_favorites(favorites: &[Favorite]) {
    if favorites.is_empty() {
        println!("No favorites yet.");
        return;
    }
    for favorite in favorites {
        println!(
            "♥ {:<40} {:>4}  ★ {:>4}  saved {}  #{}",
            favorite.movie.title,
            favorite.movie.year_label(),
            favorite.movie.rating_label(),
            favorite.saved_at.format("%Y-%m-%d"),
            favorite.movie.id
        );
    }
}

fn render_clusters(
    kind: &str,
    clusters: Vec<groups::Group<String>>,
    name: Option<&str>,
    query: Option<&str>,
    store: &Store,
) {
    match name {
        Some(name) => match groups::find(&clusters, name) {
            Some(cluster) => {
                println!("{} · {} movies", cluster.key, cluster.movies.len());
                for movie in &cluster.movies {
                    render_movie_row(movie, store);
                }
            }
            None => println!("No {kind} named {name:?}"),
        },
        None => {
            let clusters = groups::filter_by_name(clusters, query.unwrap_or(""));
            if clusters.is_empty() {
                println!("No {kind} clusters.");
            }
            for cluster in &clusters {
                println!("{} ({} movies)", cluster.key, cluster.movies.len());
            }
        }
    }
}

fn render_details(movie: &Movie, store: &Store) {
    println!("{} ({})", movie.title, movie.year_label());
    println!("Rating:    {}", movie.rating_label());
    println!("Genre:     {}", movie.genre.join(" · "));
    println!("Runtime:   {}", movie.runtime);
    println!("Released:  {}", movie.released);
    println!("Director:  {}", movie.director);
    println!("Writer:    {}", movie.writer);
    println!("Cast:      {}", movie.cast.join(", "));
    println!("Awards:    {}", movie.awards);
    println!("Plot:      {}", movie.plot);
    if !movie.streaming.is_empty() {
        println!("Streaming: {}", movie.streaming);
    }
    println!("Poster:    {}", movie.poster);
    println!("Watch:     {}", movie.watch_url());
    println!("Trailer:   {}", movie.trailer_url());
    println!("Share:     {}", movie.share_text());
    println!(
        "Favorite:  {}",
        if store.is_favorite(&movie.id) { "yes" } else { "no" }
    );
}
