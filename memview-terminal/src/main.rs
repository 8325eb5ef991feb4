/// memview - terminal viewer for `.mem` assemblies
///
/// Controls:
///   - Middle drag: Orbit
///   - Ctrl + left drag: Pan
///   - Wheel: Zoom
///   - Left click: Select a component
///   - Q/ESC: Quit
use clap::{Args, Parser, Subcommand};
use memview_core::{mem, Assembly, Footprint, Placement, ViewerConfig};
use memview_terminal::TerminalApp;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memview", version, about = "View .mem assemblies in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Append logs to this file; logging is off without one.
    #[arg(long, global = true, env = "MEMVIEW_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive viewer, showing a cube when no file is given.
    View {
        file: Option<PathBuf>,
        #[command(flatten)]
        options: ViewOptions,
    },
    /// Print counts, bounds and the solved placement of a file.
    Info {
        file: PathBuf,
        #[arg(long, env = "MEMVIEW_FOOTPRINT", default_value = "16x12", value_parser = parse_footprint)]
        footprint: Footprint,
    },
    /// Write the default cube assembly to a file.
    Sample { out: PathBuf },
}

#[derive(Args)]
struct ViewOptions {
    /// Milliseconds without input before frames stop.
    #[arg(long, env = "MEMVIEW_IDLE_TIMEOUT_MS", default_value_t = 1000)]
    idle_timeout_ms: u64,

    /// Target frames per second while active.
    #[arg(long, env = "MEMVIEW_FPS", default_value_t = 30)]
    fps: u32,

    /// Area the assembly is fitted into, as WIDTHxHEIGHT.
    #[arg(long, env = "MEMVIEW_FOOTPRINT", default_value = "16x12", value_parser = parse_footprint)]
    footprint: Footprint,
}

impl ViewOptions {
    fn config(&self) -> ViewerConfig {
        ViewerConfig {
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            footprint: self.footprint,
            frame_rate: self.fps,
            ..ViewerConfig::default()
        }
    }
}

fn parse_footprint(raw: &str) -> Result<Footprint, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad footprint size '{v}': {e}"))
    };
    let footprint = Footprint::new(parse(width)?, parse(height)?);
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if valid(footprint.width) && valid(footprint.height) {
        Ok(footprint)
    } else {
        Err(format!("footprint sizes must be positive and finite, got '{raw}'"))
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("MEMVIEW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_info(path: &Path, footprint: Footprint) -> Result<(), Box<dyn Error>> {
    let assembly = mem::load(path)?;
    println!("file:       {}", path.display());
    println!("parts:      {}", assembly.parts().len());
    println!("components: {}", assembly.components().len());
    if let Some(bounds) = assembly.bounds() {
        let (min, max) = (bounds.min, bounds.max);
        println!(
            "bounds:     ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let placement = Placement::solve(&assembly, footprint)?;
    println!("thickness:  {:?}", placement.thickness);
    println!("span:       {:.3} x {:.3}", placement.span.0, placement.span.1);
    println!("scale:      {:.4}", placement.scale);
    println!("placement:{}", placement.matrix);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Command::View { file, options } => {
            let mut app = TerminalApp::new(options.config(), file);
            app.run()?;
        }
        Command::Info { file, footprint } => print_info(&file, footprint)?,
        Command::Sample { out } => {
            mem::save(&out, &Assembly::default_cube())?;
            println!("wrote {}", out.display());
        }
    }
    Ok(())
}
