use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::clock::ManualClock;
use crate::config::{OverlayConfig, Theme};
use crate::memory::SysinfoMemoryProbe;
use crate::panel::{PanelLayout, RenderMode, LOGICAL_WIDTH};
use crate::perf_profiling;
use crate::stats::Stats;
use crate::surface::{PixelSurfaceFactory, Surface};

/// Gap between panels in the rendered strip, in logical units.
const STRIP_GAP: u32 = 4;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the overlay with a simulated render loop and write PNG frames
    Render {
        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// Number of simulated ticks
        #[arg(long, default_value_t = 600)]
        ticks: usize,

        /// Target frames per second of the simulated loop
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Write a frame every N ticks
        #[arg(long, default_value_t = 10)]
        every: usize,

        /// Device pixel ratio (overrides the config file)
        #[arg(long)]
        pixel_ratio: Option<f32>,

        /// Render mode for every panel: soft or hardcore (overrides the config file)
        #[arg(long)]
        mode: Option<RenderMode>,

        /// Use the dark theme
        #[arg(long)]
        dark: bool,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log overlay timings and periodic panel snapshots
        #[arg(long)]
        profile: bool,
    },
    /// Print the default configuration as JSON
    DefaultConfig,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            out,
            ticks,
            fps,
            every,
            pixel_ratio,
            mode,
            dark,
            config,
            profile,
        } => {
            if profile {
                perf_profiling::reset_tick_counter();
                perf_profiling::set_profiling_enabled(true);
            }
            let mut config = match config {
                Some(path) => OverlayConfig::load(&path)
                    .with_context(|| format!("Failed to load config {:?}", path))?,
                None => OverlayConfig::default(),
            };
            if let Some(ratio) = pixel_ratio {
                config.pixel_ratio = ratio;
            }
            if let Some(mode) = mode {
                config.mode = mode;
                for panel in &mut config.panels {
                    panel.mode = None;
                }
            }
            if dark {
                config.theme = Theme::Dark;
            }
            render_simulation(&config, &out, ticks, fps, every.max(1))?;
        }
        Commands::DefaultConfig => {
            println!("{}", OverlayConfig::default().to_json_pretty()?);
        }
    }
    Ok(())
}

/// Work time of simulated tick `i`, in ms: a slow wobble plus a periodic spike.
fn simulated_work_ms(i: usize, frame_ms: f64) -> f64 {
    let wobble = 0.4 + 0.3 * (i as f64 * 0.07).sin().abs();
    let spike = if i % 97 == 0 { 1.5 } else { 0.0 };
    frame_ms * (wobble + spike)
}

fn render_simulation(
    config: &OverlayConfig,
    out_dir: &Path,
    ticks: usize,
    fps: f64,
    every: usize,
) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 {
        anyhow::bail!("fps must be positive, got {}", fps);
    }
    std::fs::create_dir_all(out_dir)?;

    let clock = ManualClock::new(0.0);
    let mut stats = Stats::new(
        PixelSurfaceFactory,
        clock.clone(),
        SysinfoMemoryProbe::new(),
        config,
    )?;

    let frame_ms = 1000.0 / fps;
    let mut now = 0.0;
    let mut written = 0usize;

    println!(
        "Simulating {} ticks at {} fps ({} panels) into {:?}...",
        ticks,
        fps,
        stats.panel_count(),
        out_dir
    );

    for i in 0..ticks {
        clock.set(now);
        stats.begin();

        let work = simulated_work_ms(i, frame_ms);
        clock.set(now + work);
        stats.end();
        now += frame_ms.max(work);

        if (i + 1) % every == 0 {
            let path = out_dir.join(format!("frame_{:05}.png", written));
            compose_strip(&stats, config).save(&path)?;
            written += 1;
        }

        if i % 60 == 0 {
            print!(".");
            use std::io::Write;
            std::io::stdout().flush()?;
        }
    }
    println!("\nDone. Wrote {} frames.", written);
    Ok(())
}

/// Lay every panel out left to right on the container background.
fn compose_strip(stats: &Stats<PixelSurfaceFactory>, config: &OverlayConfig) -> RgbaImage {
    let ratio = PanelLayout::new(stats.pixel_ratio()).pixel_ratio;
    let panels = stats.panels();
    let (panel_w, panel_h) = panels
        .first()
        .map(|p| {
            let p = p.borrow();
            (p.surface().width(), p.surface().height())
        })
        .unwrap_or((LOGICAL_WIDTH * ratio, 0));
    let gap = STRIP_GAP * ratio;
    let count = panels.len() as u32;
    let width = (count * panel_w + count.saturating_sub(1) * gap).max(1);

    let backdrop = stats
        .background()
        .with_alpha(config.container.opacity())
        .to_array();
    let mut strip = RgbaImage::from_pixel(width, panel_h.max(1), image::Rgba(backdrop));
    for (i, panel) in panels.iter().enumerate() {
        let x = i as u32 * (panel_w + gap);
        image::imageops::overlay(&mut strip, panel.borrow().surface().image(), x as i64, 0);
    }
    strip
}
