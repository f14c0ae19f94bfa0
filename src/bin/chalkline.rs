use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chalkline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the scene as of one step as a PNG.
    Frame(FrameArgs),
    /// Play a script in real time, writing a PNG per step.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input step script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Step index to scrub to (0-based).
    #[arg(long)]
    step: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input step script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for per-step PNGs.
    #[arg(long = "out-dir")]
    out_dir: PathBuf,

    /// Dwell-time multiplier (0.1 plays ten times faster).
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct StyleArgs {
    /// TTF/OTF font for labels and captions; omit for a textless render.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Disable the background grid.
    #[arg(long)]
    no_grid: bool,

    /// Draw connections dashed instead of solid with arrowheads.
    #[arg(long)]
    dashed: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn read_script(path: &Path) -> anyhow::Result<chalkline::ScriptDoc> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: chalkline::ScriptDoc =
        serde_json::from_reader(r).with_context(|| "parse script JSON")?;
    Ok(doc)
}

fn make_settings(style: &StyleArgs) -> anyhow::Result<chalkline::RenderSettings> {
    let font_bytes = match &style.font {
        Some(p) => Some(
            std::fs::read(p).with_context(|| format!("read font '{}'", p.display()))?,
        ),
        None => None,
    };

    Ok(chalkline::RenderSettings {
        grid_spacing_px: if style.no_grid { None } else { Some(50.0) },
        connection_style: if style.dashed {
            chalkline::ConnectionStyle::Dashed
        } else {
            chalkline::ConnectionStyle::Arrow
        },
        font_bytes,
        ..chalkline::RenderSettings::default()
    })
}

fn write_png(frame: &chalkline::FrameRGBA, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = read_script(&args.in_path)?;
    let steps = doc.steps_or_fallback();

    let settings = make_settings(&args.style)?;
    let mut renderer = chalkline::CpuRenderer::new(settings)?;

    use chalkline::Renderer as _;
    let model = chalkline::model_at(&steps, args.step);
    let frame = renderer.render(&model, &steps, args.step.min(steps.len() - 1))?;
    write_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let doc = read_script(&args.in_path)?;
    let mut steps = doc.steps_or_fallback();

    if args.rate.is_finite() && args.rate > 0.0 && args.rate != 1.0 {
        for step in &mut steps {
            let secs = step.dwell().as_secs_f64() * args.rate;
            step.duration = Some(secs.max(f64::MIN_POSITIVE));
        }
    }

    let settings = make_settings(&args.style)?;
    let mut renderer = chalkline::CpuRenderer::new(settings)?;

    use chalkline::Renderer as _;
    let out_dir = args.out_dir.clone();
    let total = steps.len();
    let mut failure: Option<anyhow::Error> = None;

    let mut player = chalkline::Player::new();
    player.run_blocking(steps.clone(), |model, index| {
        if failure.is_some() {
            return;
        }
        let out = out_dir.join(format!("step_{index:03}.png"));
        let result = renderer
            .render(model, &steps, index)
            .map_err(anyhow::Error::from)
            .and_then(|frame| write_png(&frame, &out));
        match result {
            Ok(()) => eprintln!("step {}/{} wrote {}", index + 1, total, out.display()),
            Err(e) => failure = Some(e),
        }
    })?;

    if let Some(e) = failure {
        return Err(e);
    }

    eprintln!("playback complete ({total} steps)");
    Ok(())
}
