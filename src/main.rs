// SPDX-License-Identifier: MPL-2.0
use notchlc_player::config::{self, Config};
use notchlc_player::error::{Error, Result};
use notchlc_player::infrastructure::FfmpegBackend;
use notchlc_player::media::{self, frame_export, ExportFormat};
use notchlc_player::video_player::{
    format_duration_label, HeadlessSink, OpenOutcome, PlaybackEvent, VideoPlayer,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  notchlc-player play <FILE> [--loop] [--seconds N] [--snapshot OUT]
  notchlc-player probe <FILE>
  notchlc-player check <FILE>";

struct PlayArgs {
    path: PathBuf,
    loop_playback: bool,
    seconds: Option<f64>,
    snapshot: Option<PathBuf>,
}

fn main() -> ExitCode {
    let config = config::load().unwrap_or_default();
    init_tracing(&config);

    let mut args = pico_args::Arguments::from_env();
    let command = args.subcommand().ok().flatten();

    let result = match command.as_deref() {
        Some("play") => parse_play(&mut args).and_then(|play| run_play(&config, play)),
        Some("probe") => free_path(args).and_then(|path| run_probe(&path)),
        Some("check") => free_path(args).and_then(|path| run_check(&path)),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new(config::defaults::DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_play(args: &mut pico_args::Arguments) -> Result<PlayArgs> {
    let loop_playback = args.contains("--loop");
    let seconds: Option<f64> = args
        .opt_value_from_str("--seconds")
        .map_err(|e| Error::Config(e.to_string()))?;
    let snapshot: Option<PathBuf> = args
        .opt_value_from_os_str("--snapshot", |s| Ok::<_, String>(PathBuf::from(s)))
        .map_err(|e| Error::Config(e.to_string()))?;
    let path = args
        .free_from_os_str(|s| Ok::<_, String>(PathBuf::from(s)))
        .map_err(|e| Error::Config(e.to_string()))?;

    if let Some(secs) = seconds {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(Error::Config(format!("--seconds must be positive, got {secs}")));
        }
    }

    Ok(PlayArgs {
        path,
        loop_playback,
        seconds,
        snapshot,
    })
}

fn free_path(args: pico_args::Arguments) -> Result<PathBuf> {
    args.finish()
        .into_iter()
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config(format!("missing <FILE>\n{USAGE}")))
}

fn run_probe(path: &Path) -> Result<ExitCode> {
    media::init_ffmpeg()?;
    let probe = media::probe(path)?;
    println!("{probe}");
    Ok(ExitCode::SUCCESS)
}

fn run_check(path: &Path) -> Result<ExitCode> {
    media::init_ffmpeg()?;
    if media::accepts(path)? {
        println!("{}: playable", path.display());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}: not a NotchLC video", path.display());
        Ok(ExitCode::from(1))
    }
}

fn run_play(config: &Config, play: PlayArgs) -> Result<ExitCode> {
    media::init_ffmpeg()?;

    let mut options = config.player_options();
    options.loop_playback |= play.loop_playback;

    let (sink, monitor) = HeadlessSink::new(play.snapshot.is_some());
    let mut player = VideoPlayer::spawn(FfmpegBackend::new(), sink, options)?;
    let mut events = player.take_events().ok_or(Error::WorkerUnavailable)?;

    match player.open_and_play(&play.path)? {
        OpenOutcome::Rejected { display_name } => {
            eprintln!("{display_name}: not a NotchLC video");
            return Ok(ExitCode::from(1));
        }
        OpenOutcome::Playing(info) => {
            println!(
                "playing {} ({}x{}, {})",
                info.path.display(),
                info.stream.width,
                info.stream.height,
                format_duration_label(info.duration)
            );
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let limit = play.seconds.map(Duration::from_secs_f64);
    let watched = runtime.block_on(async {
        let watch = async {
            while let Some(event) = events.recv().await {
                match event {
                    PlaybackEvent::DurationMeasured { seconds } => {
                        tracing::info!(seconds, "duration measured");
                    }
                    PlaybackEvent::Looped => tracing::info!("looped"),
                    PlaybackEvent::Ended | PlaybackEvent::Stopped => return Ok(()),
                    PlaybackEvent::Error(err) => return Err(err),
                    PlaybackEvent::Opened(_) | PlaybackEvent::Rejected { .. } => {}
                }
            }
            Ok(())
        };
        match limit {
            Some(limit) => tokio::time::timeout(limit, watch).await.unwrap_or(Ok(())),
            None => watch.await,
        }
    });

    let position = player.properties().position;
    if let Some(out) = play.snapshot {
        let out = resolve_snapshot_path(config, &play.path, out, position);
        match monitor.last_frame() {
            Some(frame) => {
                frame_export::save_frame(&frame, &out, None)?;
                println!("snapshot saved to {}", out.display());
            }
            None => eprintln!("no frame was presented, snapshot skipped"),
        }
    }

    player.stop()?;
    println!(
        "presented {} frames, stopped at {}",
        monitor.presented(),
        format_duration_label(position.into())
    );
    watched?;
    Ok(ExitCode::SUCCESS)
}

/// A directory gets a generated file name; a relative file goes under the
/// configured snapshot directory.
fn resolve_snapshot_path(config: &Config, video: &Path, out: PathBuf, position: f64) -> PathBuf {
    if out.is_dir() {
        let name = frame_export::generate_default_filename(video, position, ExportFormat::Png);
        return out.join(name);
    }
    match &config.snapshot_dir {
        Some(dir) if out.is_relative() => dir.join(out),
        _ => out,
    }
}
