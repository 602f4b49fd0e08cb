mod config;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use steamwrap_aggregator::{ReportAggregator, SteamWebApi};
use steamwrap_core::Period;
use steamwrap_render::{encode_png, report_file_name, to_data_url, FontBook, HttpFetcher, ImageLoader, ReportRenderer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "steamwrap")]
#[command(about = "Render a shareable summary image of recent Steam activity", long_about = None)]
struct Cli {
    /// 64-bit Steam id (digits only)
    steam_id: String,

    /// 2weeks, weekly or monthly
    #[arg(short, long, default_value = "2weeks")]
    period: Period,

    /// Output PNG path; defaults to the player's name
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the image as a data URL instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Print the report as JSON as well
    #[arg(long)]
    json: bool,

    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steamwrap=info,steamwrap_aggregator=info,steamwrap_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?
        .with_env();
    let api_key = config.api_key()?;

    let client = reqwest::Client::new();
    let api = SteamWebApi::new(client.clone(), api_key).with_base_url(config.api_base_url.as_str());
    let aggregator = ReportAggregator::new(api).with_achievement_count(config.achievement_count);

    tracing::info!(steam_id = %cli.steam_id, period = %cli.period, "Building report");
    let report = aggregator
        .fetch_report(&cli.steam_id, cli.period)
        .await
        .context("failed to build report")?;
    tracing::info!(
        games = report.games.len(),
        total_hours = report.total_hours,
        total_achievements = report.total_achievements,
        "Report ready"
    );

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{}", json);
    }

    let fonts = FontBook::system(config.render.font_family.as_deref(), config.render.font_path.as_deref());
    let renderer = ReportRenderer::new(config.render.clone(), &fonts);
    let images = ImageLoader::new(HttpFetcher::new(client)).with_relay_base(config.relay_base_url.as_str());

    let pixmap = renderer.render(&report, &images).await.context("failed to render report")?;
    let png = encode_png(&pixmap).context("failed to encode PNG")?;

    if cli.data_url {
        println!("{}", to_data_url(&png));
        return Ok(());
    }

    let out_path = cli.output.unwrap_or_else(|| PathBuf::from(report_file_name(&report)));
    fs::write(&out_path, &png).with_context(|| format!("failed to write: {}", out_path.display()))?;
    tracing::info!(path = %out_path.display(), bytes = png.len(), "Report image written");

    Ok(())
}
