//! lunchlog - find a lunch spot nearby and keep a week of what you ate
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/lunchlog/lunchlog.db (~/.local/share/lunchlog/lunchlog.db)
//! - Logs: $XDG_STATE_HOME/lunchlog/lunchlog.log.YYYY-MM-DD (~/.local/state/lunchlog/)
//! - Config: $XDG_CONFIG_HOME/lunchlog/config.toml (~/.config/lunchlog/config.toml)

mod history_view;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lunchlog_core::analytics::{HistoryReport, WINDOW_DAYS};
use lunchlog_core::config::SourceKind;
use lunchlog_core::format::{format_day, format_distance, format_rating_stars, format_time};
use lunchlog_core::{
    create_source, parse_timestamp, Config, Location, LunchSource, Restaurant, CATEGORIES,
};

#[derive(Parser)]
#[command(name = "lunchlog")]
#[command(about = "Pick a lunch spot nearby and see what you ate this week")]
#[command(version)]
struct Args {
    /// Data source (overrides `[source] kind` in config.toml)
    #[arg(long, global = true)]
    source: Option<SourceKind>,

    /// Latitude of your position (defaults to `[location]` in config.toml)
    #[arg(long, global = true, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of your position
    #[arg(long, global = true, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,

    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show configuration and data source status
    Status,

    /// List the food categories
    Categories,

    /// List restaurants near you, nearest first
    Nearby {
        /// Only this category (e.g. 한식)
        #[arg(short, long)]
        category: Option<String>,

        /// Search radius in metres
        #[arg(short, long)]
        radius: Option<f64>,

        /// Maximum number of restaurants to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Search restaurants by name, description or category
    Search { query: String },

    /// Show menu, reviews and details of a restaurant
    Show { id: i64 },

    /// Suggest where to eat, favouring categories you have not had this week
    Pick,

    /// Record that you ate at a restaurant
    Select { restaurant_id: i64 },

    /// Show the last 7 days of lunches with a category breakdown
    History {
        /// End of the window (RFC 3339); defaults to the current time
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write the category pie chart as SVG to this path
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Delete a history record
    Forget { history_id: i64 },

    /// Rate a restaurant from 0 to 5
    Rate {
        restaurant_id: i64,

        rating: f64,

        #[arg(short, long)]
        comment: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_now(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

/// The opened source plus the position commands run at
struct Session {
    source: Box<dyn LunchSource>,
    at: Location,
    remote: bool,
}

impl Session {
    /// Run a source call, with a spinner while a remote request is in flight
    fn fetch<T>(
        &self,
        message: &str,
        f: impl FnOnce(&dyn LunchSource) -> lunchlog_core::Result<T>,
    ) -> lunchlog_core::Result<T> {
        if !self.remote {
            return f(self.source.as_ref());
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        let result = f(self.source.as_ref());
        pb.finish_and_clear();
        result
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(kind) = args.source {
        config.source.kind = kind;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    // Initialize logging
    let _log_guard =
        lunchlog_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(source = config.source.kind.as_str(), "lunchlog starting");

    let at = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Location::new(lat, lng),
        _ => config.location.location(),
    };

    let source = create_source(&config).context("failed to open data source")?;
    let session = Session {
        source,
        at,
        remote: config.source.kind == SourceKind::Remote,
    };

    match args.command {
        Command::Status => cmd_status(&session, &config),
        Command::Categories => cmd_categories(&session),
        Command::Nearby {
            category,
            radius,
            limit,
        } => cmd_nearby(&session, category.as_deref(), radius, limit),
        Command::Search { query } => cmd_search(&session, &query),
        Command::Show { id } => cmd_show(&session, id),
        Command::Pick => cmd_pick(&session),
        Command::Select { restaurant_id } => cmd_select(&session, restaurant_id),
        Command::History { now, format, svg } => {
            cmd_history(&session, now.unwrap_or_else(Utc::now), format, svg)
        }
        Command::Forget { history_id } => cmd_forget(&session, history_id),
        Command::Rate {
            restaurant_id,
            rating,
            comment,
        } => cmd_rate(&session, restaurant_id, rating, comment.as_deref()),
    }
}

fn cmd_status(session: &Session, config: &Config) -> Result<()> {
    println!("lunchlog");
    println!("========");
    println!();
    println!("Source:          {}", session.source.name());
    if config.source.kind == SourceKind::Remote {
        println!("API base URL:    {}", config.api.base_url());
    }
    if config.source.kind == SourceKind::Local {
        println!("Database:        {}", Config::database_path().display());
    }
    println!("Config:          {}", Config::config_path().display());
    println!("Log:             {}", lunchlog_core::logging::log_file_path().display());
    println!("Location:        {}", session.at);

    let history = session
        .fetch("Loading history...", |s| s.history())
        .context("failed to load history")?;
    let report = HistoryReport::build(&history, Utc::now());
    println!();
    println!("Lunches logged:  {}", history.len());
    println!("Last {} days:     {}", WINDOW_DAYS, report.records.len());
    if let Some(top) = report.top_category() {
        println!("Most eaten:      {} ({}%)", top.category, top.percentage);
    }
    Ok(())
}

fn cmd_categories(session: &Session) -> Result<()> {
    let restaurants = session
        .fetch("Loading restaurants...", |s| s.restaurants(session.at, None))
        .context("failed to load restaurants")?;

    for category in CATEGORIES {
        let count = restaurants
            .iter()
            .filter(|r| r.category == category.name)
            .count();
        println!(
            "{} {:<6} {}  {} nearby",
            category.icon, category.name, category.color, count
        );
    }
    Ok(())
}

fn print_restaurants(restaurants: &[Restaurant]) {
    if restaurants.is_empty() {
        println!("No restaurants found.");
        return;
    }
    for r in restaurants {
        println!(
            "#{:<3} {} {:.1}  {:>6}  {} ({})",
            r.id,
            format_rating_stars(r.rating),
            r.rating,
            format_distance(r.distance),
            r.name,
            r.category
        );
    }
}

fn cmd_nearby(
    session: &Session,
    category: Option<&str>,
    radius: Option<f64>,
    limit: usize,
) -> Result<()> {
    let restaurants = match radius {
        Some(radius) => {
            let mut found = session
                .fetch("Searching nearby...", |s| s.nearby(session.at, radius))
                .context("failed to search nearby restaurants")?;
            if let Some(category) = category {
                found.retain(|r| r.category == category);
            }
            found
        }
        None => session
            .fetch("Loading restaurants...", |s| {
                s.restaurants(session.at, category)
            })
            .context("failed to load restaurants")?,
    };

    let shown: Vec<Restaurant> = restaurants.into_iter().take(limit).collect();
    print_restaurants(&shown);
    Ok(())
}

fn cmd_search(session: &Session, query: &str) -> Result<()> {
    let restaurants = session
        .fetch("Searching...", |s| s.search(query))
        .with_context(|| format!("search for '{}' failed", query))?;
    print_restaurants(&restaurants);
    Ok(())
}

fn cmd_show(session: &Session, id: i64) -> Result<()> {
    let detail = session
        .fetch("Loading restaurant...", |s| s.restaurant_detail(id))
        .with_context(|| format!("failed to load restaurant {}", id))?;
    let r = &detail.restaurant;

    println!("{} ({})", r.name, r.category);
    println!("{}", format_rating_stars(r.rating));
    if !r.description.is_empty() {
        println!("{}", r.description);
    }
    println!();
    println!("Address:   {}", r.address);
    if let Some(road) = &r.road_address {
        println!("Road:      {}", road);
    }
    println!("Phone:     {}", detail.phone());
    println!("Hours:     {}", detail.opening_hours);
    println!("Price:     {}", detail.price_range);
    if let Some(url) = &r.url {
        println!("Link:      {}", url);
    }

    if !detail.menu.is_empty() {
        println!();
        println!("Menu");
        for item in &detail.menu {
            println!("  {:<16} {:>7}원", item.name, item.price);
        }
    }

    if !detail.reviews.is_empty() {
        println!();
        match detail.average_review_rating() {
            Some(avg) => println!("Reviews ({:.1} avg)", avg),
            None => println!("Reviews"),
        }
        for review in &detail.reviews {
            println!(
                "  {} {}  {}: {}",
                format_rating_stars(review.rating),
                review.date,
                review.user_name,
                review.comment
            );
        }
    }

    let history = session
        .fetch("Loading history...", |s| s.history())
        .context("failed to load history")?;
    if let Some(last) = history
        .iter()
        .filter(|h| h.restaurant_id == id)
        .max_by_key(|h| h.selected_at)
    {
        let now = Utc::now();
        println!();
        println!(
            "Last eaten here {} at {}",
            format_day(last.selected_at, now),
            format_time(last.selected_at)
        );
    }
    Ok(())
}

fn cmd_pick(session: &Session) -> Result<()> {
    let recs = session
        .fetch("Asking for recommendations...", |s| s.recommend(session.at))
        .context("failed to get recommendations")?;
    let restaurants = session
        .fetch("Loading restaurants...", |s| s.restaurants(session.at, None))
        .context("failed to load restaurants")?;

    if recs.recommendations.is_empty() {
        println!("Nothing to recommend within reach of {}.", recs.user_location);
        return Ok(());
    }

    println!(
        "Picked from {} restaurant(s) near {}:",
        recs.total_count, recs.user_location
    );
    for (i, rec) in recs.recommendations.iter().enumerate() {
        match restaurants.iter().find(|r| r.id == rec.id) {
            Some(r) => println!("{}. #{} {} ({}): {}", i + 1, r.id, r.name, r.category, rec.reason),
            None => println!("{}. #{}: {}", i + 1, rec.id, rec.reason),
        }
    }
    Ok(())
}

fn cmd_select(session: &Session, restaurant_id: i64) -> Result<()> {
    let id = session
        .fetch("Saving...", |s| s.record_selection(restaurant_id))
        .with_context(|| format!("failed to record restaurant {}", restaurant_id))?;
    println!("Saved lunch #{} (restaurant {})", id, restaurant_id);
    if session.source.name() == "fixture" {
        println!("Note: the fixture source keeps history in memory only.");
    }
    Ok(())
}

fn cmd_history(
    session: &Session,
    now: DateTime<Utc>,
    format: OutputFormat,
    svg: Option<PathBuf>,
) -> Result<()> {
    let history = session
        .fetch("Loading history...", |s| s.history())
        .context("failed to load history")?;
    let report = HistoryReport::build(&history, now);

    match format {
        OutputFormat::Text => history_view::print_report(&report),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to encode report")?
            );
        }
    }

    if let Some(path) = svg {
        history_view::write_svg(&report, &path)?;
        if format == OutputFormat::Text {
            println!();
            println!("Pie chart written to {}", path.display());
        }
    }
    Ok(())
}

fn cmd_forget(session: &Session, history_id: i64) -> Result<()> {
    session
        .fetch("Deleting...", |s| s.delete_history(history_id))
        .with_context(|| format!("failed to delete history record {}", history_id))?;
    println!("Deleted history record #{}", history_id);
    Ok(())
}

fn cmd_rate(
    session: &Session,
    restaurant_id: i64,
    rating: f64,
    comment: Option<&str>,
) -> Result<()> {
    session
        .fetch("Saving rating...", |s| {
            s.update_preference(restaurant_id, rating, comment)
        })
        .with_context(|| format!("failed to rate restaurant {}", restaurant_id))?;
    println!(
        "Rated restaurant {} {} ({:.1})",
        restaurant_id,
        format_rating_stars(rating),
        rating
    );
    Ok(())
}
