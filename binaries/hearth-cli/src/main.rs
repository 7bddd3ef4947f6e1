//! Hearth CLI
//!
//! Submit house features to a price prediction endpoint and print what the
//! result display shows.
//!
//! ## Usage
//!
//! ```bash
//! hearth predict --area 180 --bedrooms 3 --bathrooms 2 --country "Saudi Arabia" --city Riyadh
//! hearth --endpoint http://10.0.0.5:5000/predict health
//! hearth config
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hearth_config::HearthConfig;
use hearth_core::{DisplayStyle, FormInput, NumberLocale, ResubmitPolicy};
use hearth_predict::PredictClient;
use hearth_session::Submitter;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "House price estimates from a prediction endpoint")]
#[command(version)]
struct Cli {
    /// Configuration file [default: <config dir>/hearth/config.yaml]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prediction endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Overlapping submissions: last-writer-wins or cancel-on-resubmit
    #[arg(long, value_name = "POLICY")]
    resubmit: Option<ResubmitPolicy>,

    /// Number grouping locale (en-US, de-DE, fr-FR, en-IN)
    #[arg(long)]
    locale: Option<NumberLocale>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit the form and print each display update
    Predict {
        /// Living area
        #[arg(long, allow_hyphen_values = true)]
        area: String,

        /// Number of bedrooms
        #[arg(long, allow_hyphen_values = true)]
        bedrooms: String,

        /// Number of bathrooms
        #[arg(long, allow_hyphen_values = true)]
        bathrooms: String,

        #[arg(long)]
        country: String,

        #[arg(long)]
        city: String,

        /// Submit the same form this many times without waiting in between
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        repeat: u32,
    },

    /// Check the prediction service health endpoint
    Health,

    /// Print the effective configuration
    Config,
}

impl Cli {
    fn load_config(&self) -> Result<HearthConfig> {
        self.load_config_with(|key| std::env::var(key).ok())
    }

    /// File, then environment from `lookup`, then flags; validated once at the end.
    fn load_config_with<F>(&self, lookup: F) -> Result<HearthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = HearthConfig::layered_with(self.config.as_deref(), lookup)?;

        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if let Some(policy) = self.resubmit {
            config.resubmit = policy;
        }
        if let Some(locale) = self.locale {
            config.display.locale = locale;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hearth=info,hearth_predict=info,hearth_session=warn,hearth_config=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config().context("failed to load configuration")?;

    match cli.command {
        Commands::Predict {
            area,
            bedrooms,
            bathrooms,
            country,
            city,
            repeat,
        } => {
            let form = FormInput::new(area, bedrooms, bathrooms, country, city);
            predict(&config, &form, repeat).await
        }
        Commands::Health => health(&config).await,
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn predict(config: &HearthConfig, form: &FormInput, repeat: u32) -> Result<()> {
    let client = PredictClient::from_config(config)?;
    let submitter = Submitter::new(Arc::new(client), config.resubmit);
    tracing::info!(endpoint = %config.endpoint, policy = %submitter.policy(), "submitting");

    run_submissions(submitter, form, repeat, config.display.clone(), std::io::stdout()).await?;
    Ok(())
}

/// Submit `repeat` times and write one line per display transition to `out`.
async fn run_submissions<W>(
    submitter: Submitter,
    form: &FormInput,
    repeat: u32,
    style: DisplayStyle,
    mut out: W,
) -> Result<W>
where
    W: Write + Send + 'static,
{
    let mut transitions = submitter.transitions();

    let printer = tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(update) => writeln!(out, "{}", update.text(&style))?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "display output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        out.flush()?;
        Ok::<_, std::io::Error>(out)
    });

    let submissions: Vec<_> = (0..repeat).map(|_| submitter.submit(form)).collect();
    for submission in submissions {
        submission.settled().await;
    }

    // The feed closes once the submitter and its tasks are gone.
    drop(submitter);
    Ok(printer.await??)
}

async fn health(config: &HearthConfig) -> Result<()> {
    let client = PredictClient::from_config(config)?;
    let url = config.health_url()?;
    let health = client
        .health()
        .await
        .with_context(|| format!("health check against {} failed", url))?;

    println!("status:       {}", health.status);
    println!("model loaded: {}", health.model_loaded);
    println!(
        "version:      {}",
        health.version.as_deref().unwrap_or("unknown")
    );

    if !health.is_healthy() {
        anyhow::bail!("prediction service is not healthy");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_core::{PredictionOutcome, PredictionRequest};
    use hearth_predict::Predictor;

    struct Instant;

    #[async_trait]
    impl Predictor for Instant {
        async fn predict(&self, _: &PredictionRequest) -> hearth_core::Result<PredictionOutcome> {
            Ok(PredictionOutcome::Estimate { price: 1234567.0 })
        }
    }

    fn bad_env_endpoint(key: &str) -> Option<String> {
        (key == hearth_config::ENV_ENDPOINT).then(|| "not a url".to_string())
    }

    #[test]
    fn test_endpoint_flag_overrides_bad_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs: 7").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from([
            "hearth",
            "--config",
            path,
            "--endpoint",
            "http://127.0.0.1:5000/predict",
            "config",
        ]);
        let config = cli.load_config_with(bad_env_endpoint).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:5000/predict");
        assert_eq!(config.timeout_secs, Some(7));

        let cli = Cli::parse_from(["hearth", "--config", path, "config"]);
        assert!(cli.load_config_with(bad_env_endpoint).is_err());
    }

    #[tokio::test]
    async fn test_repeat_prints_every_transition() {
        let submitter = Submitter::new(Arc::new(Instant), ResubmitPolicy::LastWriterWins);
        let form = FormInput::new("180", "3", "2", "Saudi Arabia", "Riyadh");

        let out = run_submissions(submitter, &form, 3, DisplayStyle::default(), Vec::new())
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 6, "got {:?}", lines);
        assert_eq!(lines.iter().filter(|l| **l == "Calculating...").count(), 3);
        assert_eq!(
            lines
                .iter()
                .filter(|l| **l == "Predicted Price: ﷼ 1,234,567 SAR")
                .count(),
            3
        );
    }
}
