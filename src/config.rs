use std::path::PathBuf;

/// Environment variable holding the serialized fallback context.
pub const CONTEXT_ENV_VAR: &str = "TRANSFORM_CONTEXT_JSON";

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_FETCH_STEP: &str = "fetch_leads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output_dir: PathBuf,
    /// Context key of the upstream fetch step.
    pub fetch_step: String,
    /// Raw fallback context, used when the input document carries none.
    pub fallback_context: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            fetch_step: DEFAULT_FETCH_STEP.to_string(),
            fallback_context: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            output_dir: non_blank(
                "LEADS_OUTPUT_DIR",
                std::env::var("LEADS_OUTPUT_DIR")
                    .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            )
            .map(PathBuf::from)?,
            fetch_step: non_blank(
                "LEADS_FETCH_STEP",
                std::env::var("LEADS_FETCH_STEP")
                    .unwrap_or_else(|_| DEFAULT_FETCH_STEP.to_string()),
            )?,
            fallback_context: std::env::var(CONTEXT_ENV_VAR)
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Only the size of the fallback context is logged; it may carry CRM data.
        tracing::debug!("Output directory: {}", config.output_dir.display());
        tracing::debug!("Fetch step: {}", config.fetch_step);
        if let Some(ref raw) = config.fallback_context {
            tracing::info!("{} set ({} bytes)", CONTEXT_ENV_VAR, raw.len());
        }

        Ok(config)
    }
}

fn non_blank(name: &str, value: String) -> anyhow::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(trimmed.to_string())
}
