// src/cli.rs
use crate::core::{ConfigManager, PredictionClient};
use crate::extraction::{ExtractionProfile, ExtractionRequest, Extractor};
use crate::utils::is_blank;
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "job-extractor")]
#[command(about = "Extract structured job details from free-form postings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP endpoint (default)
    Serve,
    /// Run one extraction and print the JSON result
    Extract {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Override the configured extraction profile
        #[arg(long)]
        profile: Option<ExtractionProfile>,
    },
}

pub async fn handle_command(cli: Cli, config: ConfigManager) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => start_web_server(config).await,
        Command::Extract {
            title,
            description,
            profile,
        } => {
            if is_blank(&title) || is_blank(&description) {
                anyhow::bail!("Both --title and --description must be non-empty");
            }

            let client = PredictionClient::new(&config.inference)
                .context("Failed to initialize inference client")?;
            let mut extractor = Extractor::new(Arc::new(client), config.extraction.clone());
            if let Some(profile) = profile {
                extractor = extractor.with_profile(profile);
            }

            info!(profile = %extractor.config().profile, "Running one-off extraction");
            let result = extractor
                .extract(&ExtractionRequest::new(title, description))
                .await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["job-extractor"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_extract_arguments() {
        let cli = Cli::try_parse_from([
            "job-extractor",
            "extract",
            "--title",
            "Staff Engineer",
            "--description",
            "Remote, 8+ years",
            "--profile",
            "company",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Extract {
                title,
                description,
                profile,
            }) => {
                assert_eq!(title, "Staff Engineer");
                assert_eq!(description, "Remote, 8+ years");
                assert_eq!(profile, Some(ExtractionProfile::Company));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let parsed = Cli::try_parse_from([
            "job-extractor",
            "extract",
            "--title",
            "a",
            "--description",
            "b",
            "--profile",
            "verbose",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_blank_input_fails_before_any_call() {
        let cli = Cli {
            command: Some(Command::Extract {
                title: "  ".to_string(),
                description: "text".to_string(),
                profile: None,
            }),
        };
        let config = ConfigManager::from_sources("local", None, |_| None).unwrap();
        let err = handle_command(cli, config).await.unwrap_err();
        assert!(err.to_string().contains("must be non-empty"));
    }
}
