mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands, FavoritesAction, FilterArgs};
use reelscout::config::Config;
use reelscout::images::{poster_url, year_of, PosterSize};
use reelscout::ReelScout;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;
    let scout = ReelScout::connect(&config).await?;

    match cli.command {
        Commands::Discover { filters } => list(&scout, "", &filters).await?,
        Commands::Search { query, filters } => list(&scout, &query, &filters).await?,
        Commands::Genres => {
            scout.discovery().wait_for_genres().await;
            let genres = scout.discovery().genres();
            if genres.is_empty() {
                bail!("no genres available");
            }
            for g in genres {
                println!("{:>6}  {}", g.id, g.name);
            }
        }
        Commands::Movie { id } => show_movie(&scout, id).await?,
        Commands::Favorites { action } => match action {
            FavoritesAction::Toggle { id } => {
                if scout.toggle_favorite_id(id).await? {
                    println!("Added {id} to favorites");
                } else {
                    println!("Removed {id} from favorites");
                }
            }
            FavoritesAction::Remove { id } => {
                if !scout.remove_favorite(id).await? {
                    println!("{id} is not a favorite");
                }
            }
            FavoritesAction::List => {
                if !scout.favorites_view_allowed() {
                    println!("No favorites yet");
                } else {
                    for f in scout.favorites() {
                        let rating = f.vote_average.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".into());
                        println!("{:>8}  {:<4} {}", f.id, rating, f.title);
                    }
                }
            }
            FavoritesAction::Clear => {
                scout.clear_favorites().await?;
                println!("Favorites cleared");
            }
        },
    }

    scout.close().await
}

fn init_tracing() {
    let filter = std::env::var("REELSCOUT_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn list(scout: &ReelScout, query: &str, args: &FilterArgs) -> Result<()> {
    let engine = scout.discovery();
    engine.filters().replace(args.to_state(query));
    engine.fetch_page(args.page).await;

    let page = engine.page();
    if let Some(err) = page.error {
        bail!(err);
    }
    for m in &page.items {
        let year = year_of(m.release_date.as_deref()).map(|y| y.to_string()).unwrap_or_default();
        let mark = if scout.is_favorite(m.id) { "*" } else { " " };
        println!("{mark}{:>8}  {:.1}  {:<4}  {}", m.id, m.rating(), year, m.title);
    }
    println!("page {} of {}", page.page, page.total_pages);
    Ok(())
}

async fn show_movie(scout: &ReelScout, id: i64) -> Result<()> {
    let loader = scout.detail();
    loader.load(id).await;
    let snap = loader.snapshot();
    if let Some(err) = snap.error {
        bail!(err);
    }
    let Some(d) = snap.record else { bail!("movie {id} not found") };

    match year_of(d.release_date.as_deref()) {
        Some(y) => println!("{} ({y})", d.title),
        None => println!("{}", d.title),
    }
    if let Some(t) = &d.tagline {
        println!("{t}");
    }
    let genres: Vec<&str> = d.genres.iter().map(|g| g.name.as_str()).collect();
    println!("{}", genres.join(", "));
    if let Some(r) = d.runtime {
        println!("{r} min");
    }
    if let Some(v) = d.vote_average {
        println!("rating {v:.1}");
    }
    println!();
    println!("{}", d.overview);
    println!();
    for c in d.credits.cast.iter().take(5) {
        match &c.character {
            Some(ch) if !ch.is_empty() => println!("  {} as {ch}", c.name),
            _ => println!("  {}", c.name),
        }
    }
    if let Some(key) = snap.trailer_key {
        println!("trailer: https://www.youtube.com/watch?v={key}");
    }
    println!("poster:  {}", poster_url(d.poster_path.as_deref(), PosterSize::W500));
    if scout.is_favorite(id) {
        println!("in favorites");
    }
    Ok(())
}
