use std::{
    future::Future,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use clap::{Parser, Subcommand};
use itertools::Itertools;
use lapsync::{
    Channel, EngineConfig, LapMetadata, LapStatus, LapStore, LapSyncError, LoadCoordinator,
    PlaybackController, ReferenceLap, align_window,
    loader::FileTelemetrySource,
    playback::{compute_window, window::MAX_ZOOM, window::MIN_ZOOM},
    writer,
};
use log::{info, warn};
use tokio::task::LocalSet;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load laps and show what was found in each of them
    Inspect {
        #[arg(short, long, required = true)]
        lap: Vec<PathBuf>,
    },
    /// Align every lap against the first one for a window of the lap
    Compare {
        #[arg(short, long, required = true)]
        lap: Vec<PathBuf>,

        #[arg(short, long, default_value_t = 0.)]
        position: f64,

        #[arg(short, long, default_value_t = MIN_ZOOM)]
        zoom: u8,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Play a lap back and report the visible window every second
    Play {
        #[arg(short, long)]
        lap: PathBuf,

        /// Lap duration in seconds, plays the lap in real time when set
        #[arg(short = 't', long)]
        lap_time: Option<f64>,

        #[arg(short, long)]
        speed: Option<f64>,

        #[arg(short, long)]
        zoom: Option<u8>,

        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

fn run_local<F: Future>(future: F) -> Result<F::Output, LapSyncError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| LapSyncError::RuntimeError { source: e })?;
    Ok(LocalSet::new().block_on(&runtime, future))
}

fn lap_id(path: &Path, index: usize, taken: &[LapMetadata]) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("lap-{}", index));
    if taken.iter().any(|lap| lap.id == stem) {
        format!("{}#{}", stem, index)
    } else {
        stem
    }
}

async fn load_laps(
    paths: &[PathBuf],
    lap_time: Option<f64>,
    config: &EngineConfig,
) -> Result<(LapStore, Vec<LapMetadata>), LapSyncError> {
    let mut source = FileTelemetrySource::new();
    let mut laps: Vec<LapMetadata> = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        if !path.exists() {
            return Err(LapSyncError::InvalidTelemetryFile {
                path: format!("{:?}", path),
            });
        }
        let id = lap_id(path, index, &laps);
        source.insert(id.clone(), path);
        let mut lap = LapMetadata::new(id);
        lap.lap_time_s = lap_time;
        laps.push(lap);
    }

    let mut coordinator = LoadCoordinator::new(config);
    coordinator
        .load_laps(&laps, Rc::new(source), |completion| {
            info!(
                "[{}/{}] {} finished",
                completion.progress.loaded, completion.progress.total, completion.lap_id
            );
        })
        .await;
    Ok((coordinator.into_store(), laps))
}

fn inspect(paths: &[PathBuf], config: &EngineConfig) -> Result<(), LapSyncError> {
    let (store, laps) = run_local(load_laps(paths, None, config))??;
    for lap in &laps {
        match store.status(&lap.id) {
            Some(LapStatus::Loaded) => {
                let Some(data) = store.get(&lap.id) else {
                    continue;
                };
                println!("{}: {} samples", lap.id, data.total_points());
                for series in data.all_series() {
                    println!(
                        "  {:<20} min {:>10.3}  max {:>10.3}",
                        series.key(),
                        series.min_val,
                        series.max_val
                    );
                }
                if let Some(map) = data.track_map() {
                    println!(
                        "  track map: {} points, lat {:.5}..{:.5}, lon {:.5}..{:.5}",
                        map.len(),
                        map.bounds.min_lat,
                        map.bounds.max_lat,
                        map.bounds.min_lon,
                        map.bounds.max_lon
                    );
                }
            }
            Some(LapStatus::NoData) => println!("{}: no telemetry data", lap.id),
            Some(LapStatus::Failed(e)) => println!("{}: failed ({})", lap.id, e),
            status => println!("{}: {:?}", lap.id, status),
        }
    }
    let progress = store.progress();
    println!("{}/{} laps finished", progress.loaded, progress.total);
    Ok(())
}

fn compare(
    paths: &[PathBuf],
    position: f64,
    zoom: u8,
    output: Option<&Path>,
    config: &EngineConfig,
) -> Result<(), LapSyncError> {
    if !position.is_finite() || position < 0. {
        return Err(LapSyncError::InvalidUserInput {
            field: "position".to_string(),
            reason: "must be a sample index of the reference lap".to_string(),
        });
    }
    let (store, laps) = run_local(load_laps(paths, None, config))??;
    let Some((reference_id, reference)) = laps
        .iter()
        .find_map(|lap| store.get(&lap.id).map(|data| (lap.id.as_str(), data)))
    else {
        return Err(LapSyncError::NoTelemetryData {
            lap_id: laps.iter().map(|lap| lap.id.as_str()).join(", "),
        });
    };

    let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    let Some(window) = compute_window(
        reference.total_points(),
        position,
        zoom,
        config.min_visible_points,
    ) else {
        return Err(LapSyncError::NoTelemetryData {
            lap_id: reference_id.to_string(),
        });
    };
    let frames = align_window(reference_id, reference, &window, store.loaded_laps());

    println!(
        "Reference {} samples {}..={} (zoom {})",
        reference_id, window.start_idx, window.end_idx, zoom
    );
    for frame in &frames {
        let values = frame
            .laps
            .iter()
            .map(|value| {
                format!(
                    "{} spd {:.1} thr {:.2} brk {:.2}",
                    value.lap_id,
                    Channel::Speed.value(&value.sample),
                    Channel::Throttle.value(&value.sample),
                    Channel::Brake.value(&value.sample)
                )
            })
            .join(" | ");
        println!("{:>7.3}%  {}", frame.lap_dist_pct, values);
    }

    if let Some(output) = output {
        writer::write_frames(output, &frames)?;
    }
    Ok(())
}

struct PlayOptions {
    lap_time: Option<f64>,
    speed: Option<f64>,
    zoom: Option<u8>,
    seconds: u64,
}

fn play(path: &Path, options: PlayOptions, config: &EngineConfig) -> Result<(), LapSyncError> {
    let paths = [path.to_path_buf()];
    run_local(async {
        let (store, laps) = load_laps(&paths, options.lap_time, config).await?;
        let lap_id = laps
            .first()
            .map(|lap| lap.id.clone())
            .unwrap_or_default();
        let Some(lap) = store.get(&lap_id) else {
            return Err(LapSyncError::NoTelemetryData { lap_id });
        };

        let mut controller = PlaybackController::new(config);
        controller.set_reference(Some(ReferenceLap::from_lap(lap, options.lap_time)));
        if let Some(speed) = options.speed {
            controller.set_speed(speed);
        }
        if let Some(zoom) = options.zoom {
            controller.set_zoom(zoom);
        }
        controller.start_playback();

        for second in 1..=options.seconds {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let state = controller.state();
            let window = controller.visible_window();
            let lap_dist_pct = lap
                .samples()
                .get(state.position.floor() as usize)
                .map(|s| s.lap_dist_pct)
                .unwrap_or_default();
            match window {
                Some(window) => println!(
                    "{:>3}s position {:>9.2} ({:>6.2}%) window {}..={}",
                    second, state.position, lap_dist_pct, window.start_idx, window.end_idx
                ),
                None => println!("{:>3}s position {:>9.2}", second, state.position),
            }
        }
        controller.stop_playback();
        Ok(())
    })?
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, LapSyncError> {
    match path {
        Some(path) => EngineConfig::from_path(path),
        None => Ok(EngineConfig::from_local_file().unwrap_or_else(|| {
            let config = EngineConfig::default();
            if let Err(e) = config.save() {
                warn!("Could not save default config: {}", e);
            }
            config
        })),
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let config = load_config(cli.config.as_deref()).expect("Could not load config file");
    match &cli.command {
        Commands::Inspect { lap } => {
            inspect(lap, &config).expect("Error while inspecting telemetry");
        }
        Commands::Compare {
            lap,
            position,
            zoom,
            output,
        } => {
            compare(lap, *position, *zoom, output.as_deref(), &config)
                .expect("Error while comparing laps");
        }
        Commands::Play {
            lap,
            lap_time,
            speed,
            zoom,
            seconds,
        } => {
            let options = PlayOptions {
                lap_time: *lap_time,
                speed: *speed,
                zoom: *zoom,
                seconds: *seconds,
            };
            play(lap, options, &config).expect("Error while playing lap");
        }
    };
}
