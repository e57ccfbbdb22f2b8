//! CLI entry point for the restaurant check-in log.
//!
//! Provides subcommands for recording and deleting visits, browsing them, and
//! printing the aggregate statistics.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restaurant_daka::{
    config::DakaConfig,
    output::{
        export_csv, print_pretty, render_lookup, render_ranking, render_records, render_summary,
        summary_json,
    },
    photos::PhotoLibrary,
    records::{NewVisit, parse_score, today},
    stats::{
        DEFAULT_TOP_LIMIT, DateRange, RecordFilter, Summary, average_score, ranked_top,
        type_distribution,
    },
    store::{CsvRecordStore, ListOrder, ListQuery, RecordStore},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "daka")]
#[command(about = "Log restaurant visits and review their statistics", long_about = None)]
struct Cli {
    /// JSON config file (falls back to DAKA_CONFIG)
    #[arg(long, global = true, env = "DAKA_CONFIG")]
    config: Option<PathBuf>,

    /// Record file, overriding config and DAKA_DATA_FILE
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Photo directory, overriding config and DAKA_IMAGE_DIR
    #[arg(long, global = true)]
    image_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a restaurant visit
    Add {
        /// Restaurant name
        name: String,

        /// Cuisine type, e.g. 火锅
        #[arg(short = 't', long = "type")]
        category: String,

        /// Score between 0 and 10
        #[arg(short, long)]
        score: String,

        /// Visit date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Free-text comment
        #[arg(short, long, default_value = "")]
        comment: String,

        /// Photo to copy into the image directory
        #[arg(short, long)]
        photo: Option<PathBuf>,
    },
    /// Delete a visit by id, or every visit to a restaurant by name
    Delete {
        #[arg(value_name = "ID_OR_NAME")]
        identifier: String,
    },
    /// List visits, newest first
    List {
        /// Only names containing this keyword
        #[arg(long)]
        search: Option<String>,

        /// Only this cuisine type
        #[arg(short = 't', long = "type")]
        category: Option<String>,

        /// Only this exact restaurant
        #[arg(long)]
        restaurant: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Order by score instead of date
        #[arg(long)]
        sort_by_score: bool,

        /// With --sort-by-score, lowest first
        #[arg(long, requires = "sort_by_score")]
        ascending: bool,
    },
    /// Show one visit in full
    Show { id: u64 },
    /// Print the statistics report
    Stats {
        #[command(flatten)]
        range: RangeArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Best-rated restaurants
    Top {
        #[arg(short, long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,

        #[arg(short = 't', long = "type")]
        category: Option<String>,
    },
    /// Average score, optionally filtered
    Average {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short = 't', long = "type")]
        category: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },
    /// Visit counts and average score per cuisine type
    Types {
        /// Only list the distinct type names
        #[arg(long)]
        names: bool,
    },
    /// Export all visits to a CSV file
    Export {
        path: PathBuf,

        /// Gzip-compress the export
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Start date (YYYY-MM-DD), inclusive; needs --to
    #[arg(long)]
    from: Option<String>,

    /// End date (YYYY-MM-DD), inclusive; needs --from
    #[arg(long)]
    to: Option<String>,
}

impl RangeArgs {
    fn date_range(&self) -> Option<DateRange> {
        let range = DateRange::from_bounds(self.from.as_deref(), self.to.as_deref());
        if range.is_none() && (self.from.is_some() || self.to.is_some()) {
            warn!("Date range needs both --from and --to, ignoring");
        }
        range
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/daka.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("daka.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = DakaConfig::resolve(cli.config.as_deref()).context("loading config")?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }
    if let Some(image_dir) = cli.image_dir {
        config.image_dir = image_dir;
    }

    let mut store = CsvRecordStore::open(&config.data_file)
        .with_context(|| format!("opening {}", config.data_file.display()))?;
    let photos = PhotoLibrary::new(&config.image_dir);
    debug!(path = %store.path().display(), count = store.len(), "Record store opened");

    match cli.command {
        Commands::Add {
            name,
            category,
            score,
            date,
            comment,
            photo,
        } => {
            let date = date.unwrap_or_else(today);
            let visit = NewVisit::new(&name, &category, &date, parse_score(&score)?)
                .with_comment(&comment);
            add_visit(&mut store, &photos, visit, photo.as_deref())?;
        }
        Commands::Delete { identifier } => {
            delete_visits(&mut store, &photos, &identifier)?;
        }
        Commands::List {
            search,
            category,
            restaurant,
            range,
            sort_by_score,
            ascending,
        } => {
            let order = match (sort_by_score, ascending) {
                (false, _) => ListOrder::DateDescending,
                (true, false) => ListOrder::ScoreDescending,
                (true, true) => ListOrder::ScoreAscending,
            };
            let query = ListQuery {
                search,
                category,
                restaurant,
                date_range: range.date_range(),
                order,
            };
            let records = store.list(&query);

            print!("{}", render_records(&records)?);
            info!(count = records.len(), "Records listed");
        }
        Commands::Show { id } => {
            let record = store.get(id);
            if record.is_none() {
                warn!(id, "No such record");
            }
            print!("{}", render_lookup(id, record.as_ref())?);
        }
        Commands::Stats { range, json } => {
            let summary = Summary::from_records(&store.all(), range.date_range().as_ref());
            print_pretty(&summary);
            if json {
                println!("{}", summary_json(&summary)?);
            } else if summary.is_empty() {
                println!("没有记录可供统计");
            } else {
                print!("{}", render_summary(&summary)?);
            }
        }
        Commands::Top { limit, category } => {
            let rows = ranked_top(&store.all(), limit, category.as_deref());
            print!("{}", render_ranking(&rows)?);
        }
        Commands::Average {
            name,
            category,
            range,
        } => {
            let filter = RecordFilter {
                name,
                category,
                date_range: range.date_range(),
            };
            println!("{:.1}", average_score(&store.all(), &filter));
        }
        Commands::Types { names: true } => {
            for category in store.categories() {
                println!("{category}");
            }
        }
        Commands::Types { names: false } => {
            for share in type_distribution(&store.all()) {
                println!(
                    "{}\t{}\t{:.1}%\t{:.1}",
                    share.category, share.count, share.percentage, share.average
                );
            }
        }
        Commands::Export { path, gzip } => {
            export_csv(&path, &store.all(), gzip)?;
        }
    }

    Ok(())
}

/// Copies the optional photo, then stores the visit. A copied photo is
/// removed again if the visit is rejected.
#[tracing::instrument(skip(store, photos, visit), fields(name = %visit.name))]
fn add_visit(
    store: &mut CsvRecordStore,
    photos: &PhotoLibrary,
    mut visit: NewVisit,
    photo: Option<&Path>,
) -> Result<()> {
    let stored_photo = match photo {
        Some(source) => {
            let now = chrono::Local::now().naive_local();
            let stored = photos
                .attach(source, visit.name.trim(), now)
                .with_context(|| format!("saving photo {}", source.display()))?;
            visit = visit.with_image(&stored.to_string_lossy());
            Some(stored)
        }
        None => None,
    };

    match store.insert(visit) {
        Ok(record) => {
            println!("记录添加成功！ (ID: {})", record.id);
            Ok(())
        }
        Err(e) => {
            if let Some(path) = stored_photo {
                photos.discard(&path)?;
            }
            Err(e).context("adding record")
        }
    }
}

/// Deletes matching visits and the photos attached to them.
#[tracing::instrument(skip(store, photos))]
fn delete_visits(
    store: &mut CsvRecordStore,
    photos: &PhotoLibrary,
    identifier: &str,
) -> Result<()> {
    let removed = store.delete(identifier)?;
    if removed.is_empty() {
        warn!("No matching record");
        println!("删除记录失败: 未找到 {identifier}");
        return Ok(());
    }

    for record in &removed {
        if let Some(path) = record.image_path.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = photos.discard(Path::new(path)) {
                warn!(error = %e, path, "Failed to remove photo");
            }
        }
    }

    println!("记录删除成功！ ({} 条)", removed.len());
    Ok(())
}
