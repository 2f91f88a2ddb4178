use anyhow::{bail, Result};
use clap::Parser;
use log::error;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use trackmap::frame::Resolution;
use trackmap::geometry::{BoundingBox, Rgba};
use trackmap::map_renderer::MapRenderer;
use trackmap::pipeline::{compose, ComposeOptions, OverlaySpec};

#[derive(Parser)]
#[command(
    name = "trackmap",
    about = "Plot GPX tracks and GeoJSON overlays to a raster image"
)]
struct Cli {
    /// Directory containing .gpx track files
    track_dir: PathBuf,

    /// Output image path
    #[arg(long, default_value = "output.png")]
    output: PathBuf,

    /// Output resolution in pixels (ignored when --autoscale is given)
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [512, 512])]
    resolution: Vec<u32>,

    /// Target height in pixels; the width is derived from the bounding
    /// box's latitude-corrected aspect ratio. Requires --bbox.
    #[arg(long, value_name = "HEIGHT")]
    autoscale: Option<u32>,

    /// Visible coordinate window
    #[arg(long, num_args = 4, allow_negative_numbers = true,
          value_names = ["MIN_LON", "MAX_LON", "MIN_LAT", "MAX_LAT"])]
    bbox: Option<Vec<f64>>,

    /// Drop tracks with any segment faster than this (km/h)
    #[arg(long, value_name = "KMH")]
    max_speed: Option<f64>,

    /// Overlay specification PATH[,FILL[,LINE]]; may be repeated.
    /// Earlier overlays are drawn underneath later ones.
    #[arg(long, value_name = "SPEC")]
    overlay: Vec<String>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Colors are parsed up front so a bad color string aborts the run
    // before any file I/O.
    let overlays = cli
        .overlay
        .iter()
        .map(|spec| parse_overlay_spec(spec))
        .collect::<Result<Vec<_>>>()?;

    let bbox = cli.bbox.as_ref().map(|v| BoundingBox {
        min_lon: v[0],
        max_lon: v[1],
        min_lat: v[2],
        max_lat: v[3],
    });

    let resolution = match cli.autoscale {
        Some(target_height) => Resolution::Autoscale { target_height },
        None => Resolution::Explicit {
            width: cli.resolution[0],
            height: cli.resolution[1],
        },
    };

    let options = ComposeOptions {
        track_dir: cli.track_dir.clone(),
        overlays,
        bbox,
        resolution,
        max_speed_kmh: cli.max_speed,
    };
    let mut renderer = MapRenderer::new(cli.output.clone());
    compose(&options, &mut renderer)
}

fn parse_overlay_spec(spec: &str) -> Result<OverlaySpec> {
    // bounded to the three documented fields; anything after the second
    // comma belongs to the line color and fails its color parse
    let parts: Vec<&str> = spec.splitn(3, ',').collect();
    if parts[0].is_empty() {
        bail!("invalid overlay spec {spec:?}, expected PATH[,FILL[,LINE]]");
    }
    Ok(OverlaySpec {
        path: PathBuf::from(parts[0]),
        fill: parts.get(1).map(|s| Rgba::parse(s)).transpose()?,
        line: parts.get(2).map(|s| Rgba::parse(s)).transpose()?,
    })
}
