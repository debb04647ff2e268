//! notammap CLI
//!
//! Load a country's NOTAM dataset, filter it and print or render the result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use notammap::{
    error::{AppError, Result},
    models::{Config, FilterOptions, Taxonomy},
    pipeline::{self, LoadOutcome, MapView, NotamDataLayer},
    render::{GeoJsonOverlay, MarkerRenderer},
    services::{ClusterLabel, SubjectDecoder, format},
    storage::{self, DatasetSource, Preferences},
};

/// notammap - NOTAM filter and map renderer
#[derive(Parser, Debug)]
#[command(
    name = "notammap",
    version,
    about = "Filter, cluster and render NOTAM datasets"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available countries
    Countries,

    /// Print the filtered records of a country
    Show(FilterArgs),

    /// Print the clusters of a country's filtered records
    Clusters(FilterArgs),

    /// Render the filtered records of a country as GeoJSON
    Render {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a subject code, e.g. QOBCE
    Decode {
        /// Code, optionally followed by free text
        #[arg(required = true)]
        code: Vec<String>,
    },

    /// Validate configuration, lookup tables and optionally a dataset
    Validate {
        country: Option<String>,
    },
}

/// Country and filter selection shared by the data commands.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Country name (default: last selected country)
    country: Option<String>,

    /// Subject-code prefixes to enable, e.g. OB,MR (default: saved filter)
    #[arg(long, value_delimiter = ',')]
    codes: Option<Vec<String>>,

    /// Additionally enable every prefix of a named category
    #[arg(long)]
    category: Vec<String>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Shared state for commands that work on one country.
struct Session {
    config: Config,
    decoder: SubjectDecoder,
    source: Box<dyn DatasetSource>,
    preferences: Preferences,
}

impl Session {
    async fn open(config: Config) -> Result<Self> {
        let taxonomy = Taxonomy::load_or_default(config.taxonomy.path.as_deref());
        let source = storage::from_config(&config.source)?;
        let preferences = Preferences::load(&config.preferences.path).await?;

        Ok(Self {
            config,
            decoder: SubjectDecoder::new(Arc::new(taxonomy)),
            source,
            preferences,
        })
    }

    /// Explicit codes, else the saved filter, else everything; plus named categories.
    fn filter_options(&self, args: &FilterArgs) -> Result<FilterOptions> {
        let taxonomy = self.decoder.taxonomy();
        let mut options = match (&args.codes, &self.preferences.filter) {
            (Some(codes), _) => FilterOptions::with_codes(codes.iter().cloned())?,
            (None, Some(saved)) => saved.clone(),
            (None, None) => taxonomy.default_filter_options()?,
        };

        for name in &args.category {
            let category = taxonomy
                .categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| AppError::filter(format!("unknown category '{name}'")))?;
            options.set_codes(&category.prefixes()?, true);
        }
        Ok(options)
    }

    fn country(&self, country: Option<String>) -> Result<String> {
        country
            .or_else(|| self.preferences.country.clone())
            .ok_or_else(|| AppError::config("No country given and none selected before"))
    }

    /// Load and filter a country, remembering it as the selected one.
    async fn load(&mut self, args: FilterArgs) -> Result<NotamDataLayer> {
        let mut layer = NotamDataLayer::new(self.filter_options(&args)?);
        let country = self.country(args.country)?;

        match layer.select_country(self.source.as_ref(), &country).await? {
            LoadOutcome::Loaded { records, geometry } => {
                log::info!(
                    "{}: {}/{} records displayed, {}/{} coordinates lists",
                    country,
                    layer.displayed().notams.len(),
                    records,
                    layer.displayed().coordinates_lists.len(),
                    geometry
                );
            }
            LoadOutcome::Rejected { warning } => {
                return Err(AppError::source(&country, warning));
            }
        }

        if self.preferences.country.as_deref() != Some(country.as_str()) {
            self.preferences.country = Some(country);
            self.preferences.save(&self.config.preferences.path).await?;
        }
        Ok(layer)
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);
    log::debug!("Using configuration {}", cli.config.display());

    match cli.command {
        Command::Countries => {
            let session = Session::open(config).await?;
            for country in session.source.countries().await? {
                println!("{country}");
            }
        }

        Command::Show(filter) => {
            let mut session = Session::open(config).await?;
            let layer = session.load(filter).await?;

            for detailed in &layer.displayed().notams {
                println!("{}\n", format::describe(&detailed.notam, &session.decoder));
            }
        }

        Command::Clusters(filter) => {
            let mut session = Session::open(config).await?;
            let layer = session.load(filter).await?;

            for cluster in pipeline::group(&layer.displayed().notams) {
                println!(
                    "{}  [{}]  {}",
                    format::coordinates(cluster.latitude, cluster.longitude),
                    cluster.size(),
                    ClusterLabel::build(&cluster.records, &session.decoder)
                );
            }
        }

        Command::Render { filter, output } => {
            let mut session = Session::open(config).await?;
            let layer = session.load(filter).await?;

            let renderer = MarkerRenderer::new(session.config.render.clone());
            let mut view = MapView::new(GeoJsonOverlay::new(renderer), session.decoder.clone())
                .with_position(session.preferences.position);
            view.show(layer.displayed());

            let json = serde_json::to_string_pretty(&view.overlay().to_feature_collection())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("GeoJSON saved to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Command::Decode { code } => {
            let session = Session::open(config).await?;
            println!("{}", session.decoder.decode(&code.join(" ")));
        }

        Command::Validate { country } => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let session = Session::open(config).await?;
            session.decoder.taxonomy().validate()?;
            log::info!(
                "✓ Lookup tables OK ({} subjects, {} conditions)",
                session.decoder.taxonomy().first.len(),
                session.decoder.taxonomy().second.len()
            );

            if let Some(country) = country {
                let dataset = session.source.dataset(&country).await?;
                dataset.ensure_supported()?;
                let report = dataset.validate();

                log::info!(
                    "{}: {} records, {} coordinates lists",
                    country,
                    report.record_count,
                    report.geometry_count
                );
                if !report.malformed_codes.is_empty() {
                    log::warn!("Malformed subject codes: {:?}", report.malformed_codes);
                }
                if !report.missing_position.is_empty() {
                    log::warn!(
                        "{} records without position are placed at 0/0",
                        report.missing_position.len()
                    );
                }
                if report.dangling_references > 0 {
                    log::warn!("{} dangling geometry references", report.dangling_references);
                }
                if report.orphaned_geometry > 0 {
                    log::warn!("{} unreferenced coordinates lists", report.orphaned_geometry);
                }
                if !report.is_valid() {
                    return Err(AppError::validation(format!(
                        "duplicate record ids: {:?}",
                        report.duplicate_ids
                    )));
                }
                log::info!("✓ Dataset OK");
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
