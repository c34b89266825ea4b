//! reliefctl - sample viewport elevations and export terrain meshes

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use relief_map::google::{GoogleElevationClient, GoogleElevationConfig};
use relief_map::location::{self, Location, PRESETS};
use relief_map::{
    BoundingBox, ElevationMatrix, ElevationProvider, GeoCoord, HeightmapOptions,
    ProceduralElevationProvider, RunOutcome, SamplerConfig, SamplingSession, TerrainMesh,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

const DEFAULT_PRESET: &str = "san-francisco";

#[derive(Parser)]
#[command(name = "reliefctl")]
#[command(about = "Sample viewport elevations and export terrain meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which part of the map to sample
#[derive(Args, Debug, Clone)]
struct AreaArgs {
    /// Named location (see `reliefctl presets`)
    #[arg(long, conflicts_with_all = ["url", "center", "bounds"])]
    preset: Option<String>,

    /// Map share URL containing `@lat,lng,zoomz`
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["center", "bounds"])]
    url: Option<String>,

    /// Map center as `lat,lng`
    #[arg(long, allow_hyphen_values = true, requires = "zoom", conflicts_with = "bounds")]
    center: Option<String>,

    /// Zoom level used with --center
    #[arg(long)]
    zoom: Option<f64>,

    /// Explicit bounds as `south,west,north,east`
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<String>,

    /// Viewport width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "800")]
    height: u32,
}

/// Overrides for the sampler configuration
#[derive(Args, Debug, Clone)]
struct SamplingArgs {
    /// Distance between samples in kilometers
    #[arg(long)]
    spacing: Option<f64>,

    /// Maximum samples per elevation request
    #[arg(long)]
    max_batch: Option<usize>,

    /// Pause after each request in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,
}

/// Overrides for mesh generation
#[derive(Args, Debug, Clone)]
struct MeshArgs {
    /// Vertical exaggeration
    #[arg(long)]
    scale: Option<f64>,

    /// Keep elevations below sea level
    #[arg(long)]
    include_ocean_floor: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in locations
    Presets,

    /// Show how many rows and requests a viewport needs
    Plan {
        #[command(flatten)]
        area: AreaArgs,

        #[command(flatten)]
        sampling: SamplingArgs,
    },

    /// Sample a viewport and write the elevation matrix as JSON
    Sample {
        #[command(flatten)]
        area: AreaArgs,

        #[command(flatten)]
        sampling: SamplingArgs,

        #[command(flatten)]
        mesh_options: MeshArgs,

        /// Output file path (.json)
        #[arg(short, long)]
        output: PathBuf,

        /// Also write a terrain mesh (.obj)
        #[arg(long)]
        mesh: Option<PathBuf>,

        /// Use procedural terrain instead of the elevation service
        #[arg(long)]
        offline: bool,

        /// Seed for procedural terrain
        #[arg(long, default_value = "0")]
        seed: u32,
    },

    /// Turn a sampled elevation file into a terrain mesh
    Mesh {
        /// Elevation file written by `sample`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (.obj)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        mesh_options: MeshArgs,
    },
}

/// Elevation file written by `sample` and read by `mesh`
#[derive(Debug, Serialize, Deserialize)]
struct TerrainFile {
    bounds: BoundingBox,
    spacing_km: f64,
    elevations: ElevationMatrix,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Presets => presets_command(),
        Commands::Plan { area, sampling } => plan_command(&config, &area, &sampling),
        Commands::Sample {
            area,
            sampling,
            mesh_options,
            output,
            mesh,
            offline,
            seed,
        } => {
            sample_command(
                &config,
                &area,
                &sampling,
                &mesh_options,
                &output,
                mesh.as_deref(),
                offline,
                seed,
            )
            .await
        }
        Commands::Mesh {
            input,
            output,
            mesh_options,
        } => mesh_command(&config, &input, &output, &mesh_options),
    }
}

fn presets_command() -> Result<()> {
    for (name, location) in PRESETS {
        println!(
            "{:<14} {:>11.6} {:>12.6}  zoom {}",
            name, location.center.lat, location.center.lng, location.zoom
        );
    }
    Ok(())
}

fn plan_command(config: &AppConfig, area: &AreaArgs, sampling: &SamplingArgs) -> Result<()> {
    let bbox = resolve_area(area)?;
    let sampler_config = sampler_config(config, sampling, false);
    let sampler = relief_map::GridSampler::new(sampler_config.clone())?;
    let plan = sampler.plan(&bbox);

    print_bounds(&bbox);
    println!("Spacing:          {} km", sampler_config.spacing_km);
    println!("Rows:             {}", plan.rows);
    println!("Samples per row:  {}", plan.samples_per_row);
    println!("Requests per row: {}", plan.lookups_per_row);
    println!("Total requests:   {}", plan.total_lookups);
    println!("Total samples:    {}", plan.total_samples);
    println!(
        "Estimated time:   {}",
        format_duration(plan.estimated_duration)
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn sample_command(
    config: &AppConfig,
    area: &AreaArgs,
    sampling: &SamplingArgs,
    mesh_options: &MeshArgs,
    output: &Path,
    mesh_output: Option<&Path>,
    offline: bool,
    seed: u32,
) -> Result<()> {
    let bbox = resolve_area(area)?;
    let sampler_config = sampler_config(config, sampling, offline);
    let spacing_km = sampler_config.spacing_km;

    let provider = build_provider(config, offline, seed)?;
    tracing::info!(provider = provider.name(), "Using elevation provider");

    let session = SamplingSession::new(provider, sampler_config)?;
    let plan = session.plan(&bbox);
    print_bounds(&bbox);
    println!(
        "Sampling {} rows x {} samples in {} requests (about {})",
        plan.rows,
        plan.samples_per_row,
        plan.total_lookups,
        format_duration(plan.estimated_duration)
    );

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")?.progress_chars("=>-"),
    );
    progress.set_message("Downloading elevation data");

    let outcome = session
        .run(&bbox, |fraction| progress.set_position(fraction.round() as u64))
        .await;

    let elevations = match outcome {
        Ok(RunOutcome::Completed(matrix)) => {
            progress.finish_with_message("✓ Elevation data complete");
            matrix
        }
        Ok(RunOutcome::Superseded) => {
            progress.abandon_with_message("Superseded");
            anyhow::bail!("Sampling run was superseded by a newer one");
        }
        Err(e) => {
            progress.abandon_with_message("✗ Sampling failed");
            return Err(e).context("Failed to sample elevation data");
        }
    };

    if let Some((min, max)) = elevations.min_max() {
        println!(
            "Sampled {}x{} grid, elevation {:.0} m to {:.0} m",
            elevations.width(),
            elevations.height(),
            min,
            max
        );
    }

    let terrain = TerrainFile {
        bounds: bbox,
        spacing_km,
        elevations,
    };
    write_terrain_file(output, &terrain)?;
    println!("Elevation data: {}", output.display());

    if let Some(mesh_path) = mesh_output {
        let options = heightmap_options(config, mesh_options);
        write_mesh(&terrain, &options, mesh_path)?;
    }

    Ok(())
}

fn mesh_command(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    mesh_options: &MeshArgs,
) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let terrain: TerrainFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let options = heightmap_options(config, mesh_options);
    write_mesh(&terrain, &options, output)
}

fn write_mesh(terrain: &TerrainFile, options: &HeightmapOptions, path: &Path) -> Result<()> {
    let mesh = TerrainMesh::build(&terrain.elevations, terrain.spacing_km, options)?;

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    mesh.write_obj(&mut writer)?;
    writer.flush()?;

    println!(
        "Mesh: {} ({} vertices, {} triangles, {:.0} x {:.0} m, camera distance {:.0} m)",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.width_m,
        mesh.height_m,
        mesh.camera_distance()
    );
    Ok(())
}

fn write_terrain_file(path: &Path, terrain: &TerrainFile) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, terrain)?;
    writer.flush()?;
    Ok(())
}

fn resolve_area(area: &AreaArgs) -> Result<BoundingBox> {
    if let Some(bounds) = &area.bounds {
        return Ok(BoundingBox::parse(bounds)?);
    }

    let location = if let Some(url) = &area.url {
        location::parse_map_url(url)?
    } else if let Some(center) = &area.center {
        let zoom = area.zoom.context("--center requires --zoom")?;
        Location {
            center: parse_center(center)?,
            zoom,
        }
    } else {
        location::preset(area.preset.as_deref().unwrap_or(DEFAULT_PRESET))?
    };

    Ok(location.viewport(area.width, area.height).bounds())
}

fn parse_center(text: &str) -> Result<GeoCoord> {
    let (lat, lng) = text
        .split_once(',')
        .with_context(|| format!("Center must be `lat,lng`, got `{text}`"))?;
    let center = GeoCoord::new(
        lat.trim().parse().context("Invalid center latitude")?,
        lng.trim().parse().context("Invalid center longitude")?,
    );
    anyhow::ensure!(center.is_valid(), "Center out of range: {text}");
    Ok(center)
}

fn sampler_config(config: &AppConfig, args: &SamplingArgs, offline: bool) -> SamplerConfig {
    let mut sampler = config.sampler.clone();
    if let Some(spacing) = args.spacing {
        sampler.spacing_km = spacing;
    }
    if let Some(max_batch) = args.max_batch {
        sampler.max_batch_samples = max_batch;
    }
    match args.pacing_ms {
        Some(ms) => sampler.pacing = Duration::from_millis(ms),
        // Local terrain has no rate limit
        None if offline => sampler.pacing = Duration::ZERO,
        None => {}
    }
    sampler
}

fn heightmap_options(config: &AppConfig, args: &MeshArgs) -> HeightmapOptions {
    let mut options = config.heightmap;
    if let Some(scale) = args.scale {
        options.scale = scale;
    }
    if args.include_ocean_floor {
        options.include_below_sea_level = true;
    }
    options
}

fn build_provider(
    config: &AppConfig,
    offline: bool,
    seed: u32,
) -> Result<Arc<dyn ElevationProvider>> {
    if offline {
        return Ok(Arc::new(ProceduralElevationProvider::new(seed)));
    }

    let mut google = GoogleElevationConfig::default().with_endpoint(config.endpoint.clone());
    if let Some(key) = &config.api_key {
        google = google.with_api_key(key.clone());
    }
    let client = GoogleElevationClient::new(google)
        .context("Set GOOGLE_MAPS_API_KEY (or use --offline for procedural terrain)")?;
    Ok(Arc::new(client))
}

fn print_bounds(bbox: &BoundingBox) {
    println!(
        "Bounds: S{:.5} W{:.5} N{:.5} E{:.5} ({:.1} x {:.1} km)",
        bbox.south_west.lat,
        bbox.south_west.lng,
        bbox.north_east.lat,
        bbox.north_east.lng,
        bbox.width_km(),
        bbox.height_km()
    );
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> AreaArgs {
        AreaArgs {
            preset: None,
            url: None,
            center: None,
            zoom: None,
            bounds: None,
            width: 1280,
            height: 800,
        }
    }

    #[test]
    fn test_resolve_area_default_preset() {
        let bbox = resolve_area(&area()).unwrap();
        let sf = location::preset(DEFAULT_PRESET).unwrap();
        assert!(bbox.south_west.lat < sf.center.lat && sf.center.lat < bbox.north_east.lat);
    }

    #[test]
    fn test_resolve_area_bounds_win() {
        let args = AreaArgs {
            bounds: Some("0,0,1,0.1".to_string()),
            ..area()
        };
        let bbox = resolve_area(&args).unwrap();
        assert_eq!(bbox.north_east, GeoCoord::new(1.0, 0.1));
    }

    #[test]
    fn test_resolve_area_center() {
        let args = AreaArgs {
            center: Some("-33.86, 151.2".to_string()),
            zoom: Some(11.0),
            ..area()
        };
        let bbox = resolve_area(&args).unwrap();
        assert!((bbox.center().lng - 151.2).abs() < 1e-9);

        assert!(parse_center("91,0").is_err());
        assert!(parse_center("12.5").is_err());
    }

    #[test]
    fn test_offline_pacing_defaults_to_zero() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let args = SamplingArgs {
            spacing: Some(1.0),
            max_batch: None,
            pacing_ms: None,
        };

        let offline = sampler_config(&config, &args, true);
        assert_eq!(offline.pacing, Duration::ZERO);
        assert_eq!(offline.spacing_km, 1.0);

        let online = sampler_config(&config, &args, false);
        assert_eq!(online.pacing, Duration::from_secs(1));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(223)), "3m 43s");
        assert_eq!(format_duration(Duration::from_secs(7322)), "2h 02m");
    }

    #[test]
    fn test_cli_parses_sample() {
        let cli = Cli::try_parse_from([
            "reliefctl",
            "sample",
            "--preset",
            "tahoe",
            "--offline",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Sample { offline: true, .. }));
    }
}
