//! Implementation of the `tagsmith status` command.
//!
//! Builds the configured provider and performs one minimal completion round
//! trip so operators can verify credentials and connectivity before wiring
//! the tool into a document pipeline.

use std::time::Instant;

use anyhow::Result;
use clap::Args;

use crate::adapters::providers::ProviderRegistry;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::CompletionRequest;
use crate::services::tokens;

const PING_PROMPT: &str = "Reply with the single word OK.";

/// Arguments for `tagsmith status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the provider round trip and only check configuration
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, serde::Serialize)]
struct StatusOutput {
    success: bool,
    provider: String,
    checked_connectivity: bool,
    latency_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Provider:      {}", self.provider)];
        if !self.checked_connectivity {
            lines.push("Configuration: ok (connectivity not checked)".to_string());
        } else if let Some(error) = &self.error {
            lines.push(format!("Connectivity:  FAILED ({error})"));
        } else {
            lines.push(format!(
                "Connectivity:  ok ({} ms)",
                self.latency_ms.unwrap_or_default()
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Verify configuration and, unless `--offline`, provider reachability.
pub async fn execute(args: StatusArgs, config: &Config, json_mode: bool) -> Result<()> {
    let provider = ProviderRegistry::create(config)?;

    if args.offline {
        output(
            &StatusOutput {
                success: true,
                provider: provider.name().to_string(),
                checked_connectivity: false,
                latency_ms: None,
                error: None,
            },
            json_mode,
        );
        return Ok(());
    }

    let request = CompletionRequest {
        system_prompt: PING_PROMPT.to_string(),
        user_content: "ping".to_string(),
        prompt_tokens: tokens::estimate(PING_PROMPT, "") + tokens::estimate("ping", ""),
    };

    let started = Instant::now();
    let result = provider.complete(request).await;
    let latency_ms = started.elapsed().as_millis();

    let output_data = match result {
        Ok(_) => StatusOutput {
            success: true,
            provider: provider.name().to_string(),
            checked_connectivity: true,
            latency_ms: Some(latency_ms),
            error: None,
        },
        Err(err) => StatusOutput {
            success: false,
            provider: provider.name().to_string(),
            checked_connectivity: true,
            latency_ms: None,
            error: Some(err.to_string()),
        },
    };
    output(&output_data, json_mode);
    Ok(())
}
