use std::io::Write;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoho_leads_md::config::Config;
use zoho_leads_md::errors::AppError;
use zoho_leads_md::models::StatusReport;
use zoho_leads_md::transform;

/// Reads one JSON document from stdin, writes the leads listing and debug report, and
/// prints a single status document on stdout.
///
/// Exit codes follow `AppError::exit_code`; stdout always carries a status document.
fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the status document.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zoho_leads_md=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => return fail(AppError::Config(e.to_string())),
    };

    let stdin = std::io::stdin();
    match transform::run(stdin.lock(), &config) {
        Ok(status) => {
            emit(&status);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(error: AppError) -> ExitCode {
    tracing::error!("{}", error);
    emit(&StatusReport::failure(error.to_string()));
    ExitCode::from(error.exit_code())
}

fn emit(status: &StatusReport) {
    let mut stdout = std::io::stdout().lock();
    match serde_json::to_string(status) {
        Ok(line) => {
            if let Err(e) = writeln!(stdout, "{}", line) {
                tracing::error!("Failed to write status document: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to encode status document: {}", e),
    }
}
