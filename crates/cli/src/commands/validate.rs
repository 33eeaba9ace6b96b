//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::ConfigLoader;
use contracts::{ExtractorConfig, TimestampBasis};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    recording: Option<String>,
    targets: Vec<u64>,
    tolerance_ms: u64,
    basis: TimestampBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_time_ms: Option<u64>,
    use_recording_start: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    let config = match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    // Targets were checked by validation
    let targets = config.resolved_targets().unwrap_or_default();
    let warnings = collect_warnings(&config);

    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            version: format!("{:?}", config.version),
            recording: config.recording.as_ref().map(|p| p.display().to_string()),
            targets,
            tolerance_ms: config.tolerance_ms,
            basis: config.basis,
            reference_time_ms: config.reference_time_ms,
            use_recording_start: config.use_recording_start,
        }),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ExtractorConfig) -> Vec<String> {
    let mut warnings: Vec<String> = ConfigLoader::warnings(config)
        .iter()
        .map(ToString::to_string)
        .collect();

    if config.recording.is_none() {
        warnings.push("No recording configured - pass --recording to `run`".to_string());
    }

    if config.targets.is_empty() {
        warnings.push("No targets configured - every frame will be extracted".to_string());
    } else if config.tolerance_ms == 0 {
        warnings.push("tolerance_ms is 0 - only exact timestamp matches are kept".to_string());
    }

    if config.options.append {
        warnings.push("append has no effect on a single `run` pass (see --runs)".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            if let Some(ref recording) = summary.recording {
                println!("  Recording: {}", recording);
            }
            println!("  Targets: {:?}", summary.targets);
            println!("  Tolerance: {} ms", summary.tolerance_ms);
            println!("  Basis: {:?}", summary.basis);
            if let Some(reference) = summary.reference_time_ms {
                println!("  Reference time: {} ms", reference);
            } else if summary.use_recording_start {
                println!("  Reference time: recording start");
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn validate_text(text: &str) -> ValidationResult {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        })
    }

    #[test]
    fn test_valid_with_warnings() {
        let result = validate_text("targets = [\"0x10\"]\nbasis = \"absolute\"\n");
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("No recording")));
        assert!(warnings.iter().any(|w| w.contains("only exact")));
        assert_eq!(result.summary.unwrap().targets, vec![16]);
    }

    #[test]
    fn test_invalid_config() {
        let result = validate_text("targets = [\"nope\"]\n");
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("targets[0]"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/extract.toml".into(),
            json: true,
        });
        assert!(!result.valid);
    }
}
