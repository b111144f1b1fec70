//! Print the tag options for a metric, loading as many pages as requested.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use metric_tag_select::client::HttpTagFetcher;
use metric_tag_select::config::TagSelectConfig;
use metric_tag_select::logging::init_logging;
use metric_tag_select::MetricTagSelect;

#[derive(Parser, Debug)]
#[command(name = "metric-tag-select", version, about = "List tag options for a metric")]
struct Cli {
    /// Metric name, e.g. "system.cpu.utilization - Gauge"
    #[arg(short, long)]
    metric: String,

    /// Tag attribute the caller is selecting for
    #[arg(short, long, default_value = "")]
    attribute: String,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Pages to load, simulating scroll-to-bottom between them
    #[arg(short, long, default_value_t = 1)]
    pages: u32,

    /// Print the widget props as JSON instead of one option per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TagSelectConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TagSelectConfig::default(),
    };
    if let Some(url) = cli.api_url {
        config.api_url = url;
        config.validate().context("invalid --api-url")?;
    }
    init_logging(&config).context("initializing logging")?;

    let fetcher = HttpTagFetcher::new(&config).context("building HTTP client")?;
    let mut select = MetricTagSelect::new(
        cli.metric,
        cli.attribute,
        "",
        |value: &str| tracing::info!(value, "selected"),
        config,
    );

    for index in 0..cli.pages {
        if index > 0 {
            select.on_menu_scroll_to_bottom();
        }
        select.refresh(&fetcher).await;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&select.props())?);
    } else {
        for option in select.options() {
            println!("{}", option.label);
        }
    }
    tracing::info!(
        metric = select.metric_name(),
        pages = select.pages_loaded(),
        options = select.options().len(),
        "done"
    );
    Ok(())
}
