use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use motion_gen::{
    export::RepeatCount,
    pipeline::{self, RenderOutcome},
    GeminiGenerator, Settings,
};
use motion_preview::{PreviewView, PLACEHOLDER_SCENE};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generates a Motion Canvas scene and a preview routine from a description")]
    Generate {
        #[arg(help = "Description of the animation", required = true, num_args = 1..)]
        prompt: Vec<String>,

        #[arg(help = "Output directory.", short, long, default_value = "motion_out")]
        out: PathBuf,

        #[arg(help = "Also render the preview to this .gif or .png file.", long)]
        render: Option<PathBuf>,

        #[arg(help = "GIF loop count, 0 plays once. Loops forever if omitted.", long)]
        repeat: Option<u16>,
    },

    #[command(about = "Renders a preview routine headlessly")]
    Render {
        #[arg(help = "Preview routine (.lua) or generated content.json")]
        input: PathBuf,

        #[arg(help = "Output .gif or .png file.", short, long)]
        output: PathBuf,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,

        #[arg(long)]
        fps: Option<u32>,

        #[arg(long)]
        seconds: Option<f64>,

        #[arg(help = "GIF loop count, 0 plays once. Loops forever if omitted.", long)]
        repeat: Option<u16>,
    },

    #[command(about = "Shows generated artifacts")]
    Show {
        #[arg(default_value = "motion_out")]
        dir: PathBuf,
    },

    #[command(about = "Shows the settings file location")]
    Config {
        #[arg(help = "Write a settings file with the current values.", long, default_value_t = false)]
        init: bool,
    },
}

fn init_logging() -> Option<LoggerHandle> {
    let Some(log_dir) = Settings::log_dir() else {
        eprintln!("Failed to create log file");
        return None;
    };
    let logger = match Logger::try_with_env_or_str("info") {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Invalid log specification: {err}");
            return None;
        }
    };
    match logger
        .log_to_file(FileSpec::default().directory(&log_dir).basename("motion_gen").suffix("log").suppress_timestamp())
        .rotate(Criterion::Size(64 * 1024), Naming::Numbers, Cleanup::KeepLogFiles(3))
        .duplicate_to_stderr(Duplicate::Warn)
        .start()
    {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to start logger: {err}");
            None
        }
    }
}

fn print_outcome(outcome: &RenderOutcome) {
    println!("{}", outcome.status_line);
    if let PreviewView::Error { .. } = &outcome.view {
        println!("{}", pipeline::describe_view(&outcome.view));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = init_logging();
    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Generate { prompt, out, render, repeat } => {
            let generator = GeminiGenerator::from_settings(&settings.generator)?;
            let content = pipeline::generate(&generator, &prompt.join(" "), &out).await?;

            println!("{}", content.explanation);
            println!();
            println!(
                "Generation complete. Time: {}  ({})",
                chrono::Local::now().format("%H:%M:%S"),
                out.display()
            );

            if let Some(path) = render {
                let outcome = pipeline::render(content.preview_source(), &settings.render, settings.preview.clone())?;
                pipeline::save_render(&outcome, &path, settings.render.fps, RepeatCount::from_loops(repeat))?;
                print_outcome(&outcome);
            }
        }

        Commands::Render {
            input,
            output,
            width,
            height,
            fps,
            seconds,
            repeat,
        } => {
            let mut render = settings.render.clone();
            render.width = width.unwrap_or(render.width);
            render.height = height.unwrap_or(render.height);
            render.fps = fps.unwrap_or(render.fps);
            render.seconds = seconds.unwrap_or(render.seconds);

            let source = pipeline::load_preview_source(&input)?;
            let outcome = pipeline::render(source, &render, settings.preview.clone())?;
            if !outcome.frames.is_empty() {
                pipeline::save_render(&outcome, &output, render.fps, RepeatCount::from_loops(repeat)).with_context(|| format!("writing {}", output.display()))?;
            }
            print_outcome(&outcome);
        }

        Commands::Show { dir } => match pipeline::load_artifacts(&dir)? {
            Some(content) => {
                println!("// {}\n{}\n", pipeline::SCENE_FILE, content.scene_or_placeholder());
                println!("-- {}\n{}\n", pipeline::PREVIEW_FILE, content.preview_code);
                println!("{}", content.explanation);
            }
            None => println!("{PLACEHOLDER_SCENE}"),
        },

        Commands::Config { init } => {
            let Some(path) = Settings::config_file() else {
                anyhow::bail!("Can't determine the configuration directory");
            };
            if init {
                let mut stored = settings.clone();
                // only the stored key is written back
                stored.generator.api_key = Settings::load_from(&path).generator.api_key;
                stored.store_to(&path).with_context(|| format!("writing {}", path.display()))?;
            }
            println!("{}", path.display());
        }
    }
    Ok(())
}
