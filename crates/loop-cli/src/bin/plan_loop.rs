use anyhow::{bail, Result};
use clap::Parser;
use loop_cli::render_outcome;
use loop_core::{
    plan_shape, random_bearing, Coordinate, FitterConfig, RoutePreference, RouteFitter, Sides,
    TravelProfile,
};
use loop_services::ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
use loop_services::ors::DEFAULT_ORS_BASE_URL;
use loop_services::{OllamaPlanner, OrsClient};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a closed walking loop", long_about = None)]
struct Args {
    /// Start latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Start longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Target loop distance in km
    #[arg(long)]
    distance_km: Option<f64>,

    /// Polygon sides (3, 4 or 5)
    #[arg(long)]
    sides: Option<u8>,

    /// Initial bearing in degrees; random when omitted
    #[arg(long)]
    bearing: Option<f64>,

    /// foot-hiking or foot-walking
    #[arg(long, default_value = "foot-hiking")]
    profile: TravelProfile,

    #[arg(long, default_value = "shortest")]
    preference: RoutePreference,

    /// Ask the planner model for the shape instead of using --sides/--bearing
    #[arg(long)]
    prompt: Option<String>,

    /// OpenRouteService API key
    #[arg(long, env = "ORS_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "ORS_BASE_URL", default_value = DEFAULT_ORS_BASE_URL)]
    ors_url: String,

    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    ollama_model: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 20)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("loop_core=info".parse()?))
        .init();

    let args = Args::parse();
    let origin = Coordinate::new(args.lon, args.lat);
    let timeout = Duration::from_secs(args.timeout.max(1));
    let fallback_bearing = args
        .bearing
        .unwrap_or_else(|| random_bearing(&mut rand::rng()));

    let (sides, bearing, distance_km) = match args.prompt.as_deref() {
        Some(prompt) => {
            println!("Asking {} for a shape...", args.ollama_model);
            let planner = OllamaPlanner::new(args.ollama_url, args.ollama_model, timeout)?;
            let suggestion = plan_shape(&planner, prompt, fallback_bearing).await;
            println!("Plan: {}", suggestion.description);
            (
                suggestion.sides,
                args.bearing.unwrap_or(suggestion.bearing_deg),
                args.distance_km.or(suggestion.distance_km),
            )
        }
        None => (
            args.sides.map(Sides::try_from).transpose()?.unwrap_or_default(),
            fallback_bearing,
            args.distance_km,
        ),
    };

    let Some(distance_km) = distance_km else {
        bail!("--distance-km is required unless the planner suggests a distance");
    };

    let client = OrsClient::new(args.ors_url, args.api_key, timeout)?;
    let fitter = RouteFitter::new(
        client,
        FitterConfig {
            request_timeout: timeout,
            profile: args.profile,
            preference: args.preference,
            ..FitterConfig::default()
        },
    );

    println!(
        "Fitting a {:.1} km loop with {} sides from {:.5}, {:.5}...",
        distance_km,
        sides.count(),
        args.lat,
        args.lon
    );
    let outcome = fitter.fit_shape(origin, distance_km, sides, bearing).await;
    print!("{}", render_outcome(&outcome));

    if !outcome.is_fitted() {
        std::process::exit(1);
    }
    Ok(())
}
