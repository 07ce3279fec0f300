use clap::{Args, Parser, Subcommand};

use reelscout::filters::{FilterState, SortBy};

/// Browse the TMDB movie catalog from the terminal
#[derive(Parser)]
#[command(name = "reelscout")]
#[command(about = "Discover movies, inspect details and keep a favorites list", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the catalog by genre, year and sort order
    Discover {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Free-text title search, narrowed and sorted locally
    Search {
        /// Query to search for
        query: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the catalog's movie genres
    Genres,
    /// Show one movie with its top cast and trailer
    Movie {
        id: i64,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Args, Default)]
pub struct FilterArgs {
    /// Genre id (see `genres`)
    #[arg(short, long)]
    pub genre: Option<i64>,
    /// Release year
    #[arg(short, long)]
    pub year: Option<i32>,
    /// Sort key, e.g. popularity.desc or vote_average.desc
    #[arg(short, long)]
    pub sort: Option<String>,
    /// Page number
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
}

impl FilterArgs {
    pub fn to_state(&self, query: &str) -> FilterState {
        FilterState {
            query: query.to_string(),
            genre_id: self.genre,
            year: self.year,
            sort_by: self.sort.as_deref().map(SortBy::parse).unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// Add the movie if it is not a favorite, remove it otherwise
    Toggle { id: i64 },
    /// Remove a favorite
    Remove { id: i64 },
    /// List favorites in the order they were added
    List,
    /// Remove every favorite
    Clear,
}
