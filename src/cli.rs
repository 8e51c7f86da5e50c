//! CLI commands for f1-forecast.
//!
//! Runs the web server, or queries the stats API and the prediction models
//! directly from the terminal.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::ai::predictor::driver_analysis_error;
use crate::ai::{ModelFactory, RacePredictor};
use crate::config::AppConfig;
use crate::ergast::ErgastClient;
use crate::storage::{CredentialProvider, StaticCredentials};

#[derive(Parser)]
#[command(name = "f1-forecast")]
#[command(version, about = "F1 Forecast: Formula 1 stats and AI race predictions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Predict a race described by a JSON file
    Predict {
        /// Path to race data JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print career statistics for a driver id (e.g. "hamilton")
    DriverStats {
        #[arg(value_name = "DRIVER_ID")]
        driver_id: String,
    },

    /// Print driver standings
    Standings {
        /// Season year; defaults to the current season
        #[arg(short, long)]
        season: Option<i32>,
    },

    /// Ask the model for a driver performance analysis
    AnalyzeDriver {
        /// Driver name as it should appear in the prompt
        #[arg(value_name = "NAME")]
        name: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Predictor built from the keys in the `credentials` config section.
fn configured_predictor(config: &AppConfig) -> anyhow::Result<RacePredictor> {
    let provider = StaticCredentials::from(&config.credentials);
    let Some(credentials) = provider.credentials()? else {
        bail!("No API keys configured; set F1FORECAST_CREDENTIALS__GEMINI_API_KEY");
    };
    let predictor = ModelFactory::new(config)?
        .predictor(&credentials)
        .context("Gemini API key is required")?;
    Ok(predictor)
}

/// Run a race prediction for the race JSON in `input`.
pub async fn run_predict(input: PathBuf) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let predictor = configured_predictor(&config)?;

    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let race_data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    eprintln!(
        "Predicting race: {}",
        race_data
            .get("raceName")
            .and_then(Value::as_str)
            .unwrap_or("unnamed race")
    );
    if predictor.has_secondary() {
        eprintln!("Secondary insights enabled");
    }

    let forecast = predictor.generate_race_predictions(&race_data).await;
    if let Some(reason) = forecast.fallback_reason() {
        eprintln!("Model unavailable ({}), showing fallback predictions", reason);
    }
    print_json(&forecast.into_payload())
}

pub async fn run_driver_stats(driver_id: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let client = ErgastClient::new(&config.ergast)?;

    match client.driver_career_stats(&driver_id).await {
        Some(stats) => print_json(&stats),
        None => bail!("Could not load career stats for '{}'", driver_id),
    }
}

pub async fn run_standings(season: Option<i32>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let client = ErgastClient::new(&config.ergast)?;

    let standings = client.driver_standings(season).await;
    if standings.is_empty() {
        bail!("No standings available");
    }

    println!("{:>4}  {:<28} {:<20} {:>7} {:>5}", "Pos", "Driver", "Team", "Points", "Wins");
    for standing in &standings {
        let team = standing
            .constructors
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("-");
        println!(
            "{:>4}  {:<28} {:<20} {:>7} {:>5}",
            standing.display_position(),
            standing.driver.full_name(),
            team,
            standing.points,
            standing.wins
        );
    }
    Ok(())
}

pub async fn run_analyze_driver(name: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let predictor = configured_predictor(&config)?;

    match predictor.analyze_driver_performance(&name).await {
        Ok(analysis) => print_json(&analysis),
        Err(e) => bail!(driver_analysis_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["f1-forecast", "serve", "--port", "8080"]);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: Some(8080)
            }
        ));

        let cli = Cli::parse_from(["f1-forecast", "standings", "--season", "2023"]);
        assert!(matches!(cli.command, Commands::Standings { season: Some(2023) }));

        let cli = Cli::parse_from(["f1-forecast", "driver-stats", "alonso"]);
        assert!(matches!(
            cli.command,
            Commands::DriverStats { ref driver_id } if driver_id == "alonso"
        ));

        let cli = Cli::parse_from(["f1-forecast", "analyze-driver", "Lando Norris"]);
        assert!(matches!(
            cli.command,
            Commands::AnalyzeDriver { ref name } if name == "Lando Norris"
        ));
    }

    #[test]
    fn test_configured_predictor_requires_primary_key() {
        let mut config = AppConfig::default();
        assert!(configured_predictor(&config).is_err());

        config.credentials.groq_api_key = Some("gsk_only".into());
        assert!(configured_predictor(&config).is_err());

        config.credentials.gemini_api_key = Some("AIza-test".into());
        let predictor = configured_predictor(&config).unwrap();
        assert!(predictor.has_secondary());
    }
}
