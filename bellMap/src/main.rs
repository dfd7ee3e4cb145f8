use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use bellmap::analysis::reporting::{print_nearest, print_stats_summary, print_view};
use bellmap::analysis::stats::DatasetStats;
use bellmap::cli::cli::{Args, Command};
use bellmap::cli::session::Session;
use bellmap::config::app_config::AppConfig;
use bellmap::core::proximity_index::CategoryFilter;
use bellmap::core::query_facade::{QueryFacade, SearchOutcome};
use bellmap::data::bells_loader;
use bellmap::data::gazetteer::Gazetteer;
use bellmap::data::poi::Coordinate;
use bellmap::services::geolocation::{FixedLocation, LocationProvider, NoLocation};
use bellmap::services::place_search::PlaceSearch;
use bellmap::utils::batch::{batch_nearest, read_query_points};
use bellmap::utils::csv_export::{rows_for, timestamped_path, write_csv};
use bellmap::utils::logging::{self, FileIOType, OperationCategory};
use bellmap::Bell;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging());

    let config = load_config(&args)?;
    let bells = load_dataset(&config)?;
    let facade = QueryFacade::from_config(bells, &config);

    run(&args, &config, facade)?;

    logging::print_timing_report();
    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let _timing = logging::start_timing("load_config",
        OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

    let mut config = match args.config() {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(dataset) = args.dataset() {
        config.dataset_path = dataset.to_path_buf();
    }
    if let Some(gazetteer) = args.gazetteer() {
        config.gazetteer_path = Some(gazetteer.to_path_buf());
    }
    if let Some(index) = args.index() {
        config.index = index;
    }
    if let Some(cell) = args.grid_cell_deg() {
        config.grid_cell_deg = cell;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_dataset(config: &AppConfig) -> Result<Vec<Bell>> {
    let _timing = logging::start_timing("load_dataset",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    bells_loader::load_bells(&config.dataset_path)
        .with_context(|| format!("failed to load bell dataset {}", config.dataset_path.display()))
}

fn load_gazetteer(config: &AppConfig) -> Result<Option<Gazetteer>> {
    match &config.gazetteer_path {
        Some(path) => Gazetteer::load(path)
            .map(Some)
            .with_context(|| format!("failed to load gazetteer {}", path.display())),
        None => Ok(None),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: &Args, config: &AppConfig, mut facade: QueryFacade) -> Result<()> {
    match args.command() {
        Command::Stats => {
            let stats = DatasetStats::collect(facade.index().bells());
            if args.json() {
                print_json(&stats)?;
            } else {
                print_stats_summary(&stats);
            }
        }
        Command::Nearest { lat, lng } => {
            let nearest = facade.nearest_to(*lat, *lng);
            if args.json() {
                print_json(&nearest)?;
            } else {
                print_nearest(nearest.as_ref());
            }
        }
        Command::Within { lat, lng, radius, category, verbose } => {
            facade.set_radius(radius.unwrap_or(config.initial_radius_km))?;
            facade.set_filter(category.parse::<CategoryFilter>().unwrap_or_default());
            let view = facade.pan_to(*lat, *lng)?;
            if args.json() {
                print_json(&view)?;
            } else {
                print_view(&view, *verbose);
            }
        }
        Command::Search { query } => {
            let Some(gazetteer) = load_gazetteer(config)? else {
                bail!("place search needs a gazetteer (--gazetteer or gazetteer_path in the config)");
            };
            match facade.search(&gazetteer, &query.join(" ")) {
                Ok(SearchOutcome::Found { place, view }) => {
                    if args.json() {
                        print_json(&json!({ "place": place, "view": view }))?;
                    } else {
                        println!("Found {} ({:?})", place.name, place.kind);
                        print_view(&view, true);
                    }
                }
                Ok(SearchOutcome::Ignored) => {}
                Err(e) => println!("{}", e),
            }
        }
        Command::Export { lat, lng, radius, category, output_dir } => {
            facade.set_radius(radius.unwrap_or(config.initial_radius_km))?;
            facade.set_filter(category.parse::<CategoryFilter>().unwrap_or_default());
            let view = facade.pan_to(*lat, *lng)?;

            let rows = rows_for(view.visible.iter().copied(), Some(&view.center));
            let path = timestamped_path(output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;
            write_csv(&path, &rows).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} bells to {}", rows.len(), path.display());
        }
        Command::Batch { points, output, progress } => {
            let points = read_query_points(points)
                .with_context(|| format!("failed to read query points {}", points.display()))?;
            let results = batch_nearest(facade.index(), &points, *progress);

            match output {
                Some(path) => {
                    write_csv(path, &results)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Batch results written");
                }
                None if args.json() => print_json(&results)?,
                None => {
                    let mut writer = csv::Writer::from_writer(io::stdout());
                    for result in &results {
                        writer.serialize(result)?;
                    }
                    writer.flush()?;
                }
            }
        }
        Command::Session { script, location } => {
            let device: Box<dyn LocationProvider> = match location.as_deref() {
                Some([lat, lng]) => Box::new(FixedLocation(Coordinate::new(*lat, *lng))),
                _ => Box::new(NoLocation),
            };
            let gazetteer = load_gazetteer(config)?;
            let places = gazetteer.as_ref().map(|g| g as &dyn PlaceSearch);

            let mut session = Session::new(facade, device.as_ref(), places, args.json());
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match script {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("failed to open session script {}", path.display()))?;
                    session.run(BufReader::new(file), &mut out)?;
                }
                None => session.run(io::stdin().lock(), &mut out)?,
            }
        }
    }
    Ok(())
}
