use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use satsuei::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Compiles node-graph workflow templates into per-shot generation jobs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional pipeline configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved graph of a template
    Normalize {
        template: PathBuf,
        /// Shot duration in seconds, applied to the temporal node
        #[arg(short, long)]
        duration: Option<f64>,
    },
    /// Compile every shot of a shot list into a job
    Compile {
        template: PathBuf,
        shots: PathBuf,
        /// Directory for `shot_NNN.json` files; jobs go to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show how camera tags map onto modifier slots
    Cameras {
        /// One tag, or several separated by `,` `;` `|` or `+`
        tags: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Normalize { template, duration } => run_normalize(config, &template, duration),
        Command::Compile {
            template,
            shots,
            out,
        } => run_compile(config, &template, &shots, out.as_deref()),
        Command::Cameras { tags } => run_cameras(&config, &tags),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading pipeline config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn build_compiler(config: PipelineConfig, template_path: &Path) -> Result<Compiler> {
    let template = WorkflowTemplate::from_file(template_path)
        .with_context(|| format!("loading template {}", template_path.display()))?;
    Ok(Compiler::builder(template, config).build()?)
}

fn run_normalize(config: PipelineConfig, template_path: &Path, duration: Option<f64>) -> Result<()> {
    let compiler = build_compiler(config, template_path)?;
    let normalized = compiler.resolved_graph(duration);
    println!("{}", serde_json::to_string_pretty(&normalized.graph)?);
    report_signals("normalize", &normalized.diagnostics);
    Ok(())
}

fn run_compile(
    config: PipelineConfig,
    template_path: &Path,
    shots_path: &Path,
    out: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let compiler = build_compiler(config, template_path)?;
    let shots = ShotParameters::list_from_file(shots_path)
        .with_context(|| format!("loading shots {}", shots_path.display()))?;

    if let Some(dir) = out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut failed = 0usize;
    for (position, result) in compiler.compile_batch(&shots).into_iter().enumerate() {
        let number = shots[position].index.map_or(position + 1, |i| i as usize);
        let compiled = match result {
            Ok(compiled) => compiled,
            Err(e) => {
                eprintln!("shot {number:03}: {e}");
                failed += 1;
                continue;
            }
        };

        let json = compiled.job.to_json_pretty()?;
        match out {
            Some(dir) => {
                let path = dir.join(format!("shot_{number:03}.json"));
                fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            }
            None => println!("{json}"),
        }
        report_signals(&format!("shot {number:03}"), &compiled.diagnostics);
    }

    eprintln!(
        "Compiled {} of {} shots in {:.2?}",
        shots.len() - failed,
        shots.len(),
        start.elapsed()
    );
    if failed > 0 {
        anyhow::bail!("{failed} shot(s) failed to compile");
    }
    Ok(())
}

fn run_cameras(config: &PipelineConfig, tags: &str) -> Result<()> {
    config.validate()?;
    let resolver = CameraEffectResolver::new(&config.camera_catalog, &config.slot_pool)
        .with_default_strengths(config.default_strength_low, config.default_strength_high);

    let tags = CameraTags::from(tags).normalize();
    let mut diagnostics = Diagnostics::new();
    let resolution = resolver.resolve(&tags, &mut diagnostics);

    for write in &resolution.writes {
        println!(
            "slot {} [{}] {} -> node {}: {} @ {}",
            write.slot_index, write.tag, write.role, write.node_id, write.module, write.strength
        );
    }
    println!("prompt addendum: {:?}", resolution.prompt_addendum);
    report_signals("cameras", &diagnostics);
    Ok(())
}

fn report_signals(scope: &str, diagnostics: &Diagnostics) {
    for signal in diagnostics.iter() {
        eprintln!("{scope}: {signal}");
    }
}
