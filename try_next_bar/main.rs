use anyhow::Result;
use clap::Parser;
use nextbar::run_pipeline;
use try_next_bar::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("NEXT BAR - Direction Classifier and Long/Flat Backtest\n");

    // Load configuration; a positional data file overrides the TOML one
    let cli = Config::parse();
    let config = match &cli.config_file {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            if cli.data_file.is_some() {
                config.data_file = cli.data_file.clone();
            }
            config
        }
        None => cli,
    };
    config.validate()?;

    // Load market data
    println!("Loading market data...");
    let prices = load_prices(config.data_file())?;
    println!("Price bars: {}", prices.len());

    println!("Training {} classifier...", config.classifier);
    let report = run_pipeline(&prices, &config.pipeline_config())?;

    print_summary(&config, &report);

    let written = write_reports(&config.output_path, &report)?;
    println!();
    for path in written {
        println!("Results written to {}", path.display());
    }

    Ok(())
}
