#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use i18n_gen_core::config::{
    parse_languages, resolve_credentials, AppConfig, CallPolicy, Env, Language, OutputConfig,
    Region, StdEnv, DEFAULT_EXTENSION, DEFAULT_INPUT_PATH, DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_DIR,
    DEFAULT_REGION,
};
use i18n_gen_core::pipeline::{Pipeline, PipelineConfig};
use i18n_gen_core::translate::AwsTranslator;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "i18n-gen")]
#[command(about = "Translate a key/English CSV and generate one JavaScript module per language")]
struct Args {
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Comma-separated module names; all languages when omitted
    #[arg(long)]
    languages: Option<String>,

    /// Attempts per translation request; 1 disables retries
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    #[arg(long)]
    request_timeout_secs: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        input = %cfg.input.display(),
        output_dir = %cfg.output.dir.display(),
        region = %cfg.region.as_str(),
        languages = cfg.languages.len(),
        "config loaded"
    );

    let translator = AwsTranslator::new(&cfg.credentials, &cfg.region);
    let pipeline = Pipeline {
        translate: translator,
        config: PipelineConfig::from_app(&cfg),
    };

    let summary = pipeline.run().await.context("generation failed")?;
    tracing::info!(
        records = summary.records,
        modules = summary.modules.len(),
        "done"
    );

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let credentials = resolve_credentials(env)?;
    let languages = match args.languages.as_deref() {
        Some(list) => parse_languages(list)?,
        None => Language::ALL.to_vec(),
    };
    let region = Region::new(args.region)?;
    let output = OutputConfig::new(args.output_dir, args.extension)?;
    let policy = CallPolicy::new(
        args.max_attempts,
        args.request_timeout_secs.map(Duration::from_secs),
    )?;

    Ok(AppConfig {
        input: args.input,
        output,
        languages,
        region,
        credentials,
        policy,
    })
}
