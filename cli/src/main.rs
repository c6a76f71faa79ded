use clap::{Args, Parser, Subcommand, ValueEnum};
use puzzlegift::{
    render_snapshot_svg, AppConfig, AppCore, DirectoryAssets, PlaceholderAssets, StageAssets,
    StageLoad, StageRuntime,
};
use puzzlegift_core::{grid_label, SessionSettings, StageCatalog};
use puzzlegift_image_pipeline::{ImagePipeline, PipelineConfig, IMAGE_MAX_DIMENSION_DEFAULT};
use std::path::PathBuf;
use std::rc::Rc;
use tokio::task::LocalSet;

mod bot;

#[derive(Parser)]
#[command(name = "puzzlegift-cli", version, about = "Inspect, render and play puzzlegift stages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the stage catalog with the effective grid sizes.
    Stages {
        #[command(flatten)]
        stage: StageArgs,
    },
    /// Load one stage and print its first frame.
    Render {
        #[command(flatten)]
        stage: StageArgs,
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(long, value_enum, default_value_t = RenderFormat::Svg)]
        format: RenderFormat,
        #[arg(long)]
        hint: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Headless player that solves stages through pointer input.
    Bot {
        #[command(subcommand)]
        command: bot::BotCommand,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RenderFormat {
    Svg,
    Json,
}

#[derive(Args, Clone, Debug)]
pub(crate) struct StageArgs {
    /// TOML stage catalog; the built-in five stages when omitted.
    #[arg(long, env = "PUZZLEGIFT_STAGES")]
    stages: Option<PathBuf>,
    /// Directory holding the stage images; placeholder fills when omitted.
    #[arg(long, env = "PUZZLEGIFT_IMAGES")]
    images: Option<PathBuf>,
    #[arg(long, default_value_t = IMAGE_MAX_DIMENSION_DEFAULT)]
    max_image_dim: u32,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 800.0)]
    height: f32,
    /// Decimal or 0x-prefixed hex.
    #[arg(long)]
    seed: Option<String>,
    /// Seconds per stage.
    #[arg(long)]
    time: Option<u32>,
    /// Multiplier applied to every stage's rows and columns.
    #[arg(long)]
    grid: Option<f32>,
}

impl StageArgs {
    fn settings(&self) -> SessionSettings {
        let mut settings = SessionSettings::default();
        if let Some(time) = self.time {
            settings.set_time_per_stage(time);
        }
        if let Some(grid) = self.grid {
            settings.set_grid_multiplier(grid);
        }
        settings
    }

    fn catalog(&self) -> Result<StageCatalog, Box<dyn std::error::Error>> {
        match self.stages.as_deref() {
            Some(path) => Ok(StageCatalog::from_path(path)?),
            None => Ok(StageCatalog::default()),
        }
    }

    pub(crate) fn config(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let seed = match self.seed.as_deref() {
            Some(raw) => parse_seed_arg(raw)?,
            None => rand::random(),
        };
        log::debug!("session seed {seed:#x}");
        Ok(AppConfig {
            catalog: self.catalog()?,
            settings: self.settings(),
            width: self.width,
            height: self.height,
            seed,
            ..AppConfig::default()
        })
    }

    pub(crate) fn assets(&self, embed: bool) -> Rc<dyn StageAssets> {
        match self.images.as_ref() {
            Some(root) => {
                let pipeline = ImagePipeline::new(PipelineConfig {
                    max_dim: Some(self.max_image_dim),
                    ..PipelineConfig::default()
                });
                let assets = DirectoryAssets::new(root, pipeline);
                if embed {
                    Rc::new(assets)
                } else {
                    Rc::new(assets.without_embedding())
                }
            }
            None => Rc::new(PlaceholderAssets),
        }
    }

    pub(crate) fn runtime(&self, embed: bool) -> Result<Rc<StageRuntime>, Box<dyn std::error::Error>> {
        let core = AppCore::new(self.config()?);
        Ok(StageRuntime::new(core, self.assets(embed)))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stages { stage } => {
            let catalog = stage.catalog()?;
            let settings = stage.settings();
            println!(
                "{} stages, {}s per stage, grid x{}",
                catalog.len(),
                settings.time_per_stage(),
                settings.grid_multiplier()
            );
            for (index, entry) in catalog.stages.iter().enumerate() {
                let (rows, cols) = entry.grid_size(&settings);
                println!(
                    "  {}. {} [{:?}] {}{}",
                    index + 1,
                    entry.title,
                    entry.kind,
                    grid_label(rows, cols),
                    entry
                        .image
                        .as_deref()
                        .map(|image| format!(" {image}"))
                        .unwrap_or_default()
                );
            }
        }
        Commands::Render {
            stage,
            index,
            format,
            hint,
            out,
        } => {
            let runtime = stage.runtime(format == RenderFormat::Svg)?;
            let rendered = LocalSet::new()
                .run_until(render_stage(&runtime, index, format, hint))
                .await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    eprintln!("wrote {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Bot { command } => {
            LocalSet::new().run_until(bot::run(command)).await?;
        }
    }

    Ok(())
}

async fn render_stage(
    runtime: &StageRuntime,
    index: usize,
    format: RenderFormat,
    hint: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    if let StageLoad::Finished = runtime.load_stage(index).await {
        runtime.shutdown();
        return Err(format!("stage {} is past the end of the catalog", index + 1).into());
    }
    runtime.core().set_hint(hint);
    let snapshot = runtime.core().snapshot();
    runtime.shutdown();
    match format {
        RenderFormat::Svg => Ok(render_snapshot_svg(&snapshot)),
        RenderFormat::Json => {
            let session = snapshot.session.ok_or("stage did not produce a puzzle")?;
            Ok(serde_json::to_string_pretty(&session)?)
        }
    }
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}
