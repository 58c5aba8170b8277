//! `rebal setup`: writes a commented starter configuration and shows the
//! settings a rebalance run will pick up from it.

use super::ui;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the example configuration to `config_path`, or to the per-user
/// default location when no path is given.
pub fn setup(config_path: Option<&str>) -> Result<()> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    let config = write_example_config(&path)?;

    println!(
        "{} {}\n",
        ui::style_text("Created configuration at", ui::StyleType::TotalLabel),
        path.display()
    );
    println!("{}", settings_table(&config));
    println!(
        "{}",
        ui::style_text(
            "Relative paths resolve against the directory rebal is run from.",
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

/// Writes the example configuration unless a file already exists at `path`.
/// Returns the settings the written file resolves to.
pub fn write_example_config(path: &Path) -> Result<AppConfig> {
    let config: AppConfig =
        serde_yaml::from_str(EXAMPLE_CONFIG).context("Bundled example config is invalid")?;
    config.rebalance.validate()?;

    if path.exists() {
        anyhow::bail!(
            "Configuration file already exists at {}, edit it or remove it first",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!(path = %path.display(), "Created example configuration");
    Ok(config)
}

fn settings_table(config: &AppConfig) -> Table {
    let rebalance = &config.rebalance;
    let rows = [
        (
            "Cash injection (TWD)",
            ui::format_amount(rebalance.cash_injection),
        ),
        ("Holdings", rebalance.holdings_path.display().to_string()),
        ("Target allocation", rebalance.target_path.display().to_string()),
        ("Show zero rows", rebalance.show_zero_rows.to_string()),
        ("Buy orders", rebalance.to_buy_path.display().to_string()),
        ("Report", rebalance.report_path.display().to_string()),
        ("Quote source", config.providers.yahoo_base_url().to_string()),
    ];

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Setting"), ui::header_cell("Value")]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_config_loads_back_as_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        let written = write_example_config(&config_path)?;

        assert_eq!(written, AppConfig::default());
        assert_eq!(AppConfig::load_from_path(&config_path)?, written);
        assert!(fs::read_to_string(&config_path)?.starts_with("# Example configuration"));
        Ok(())
    }

    #[test]
    fn test_existing_config_is_kept() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "rebalance:\n  cash_injection: 5\n")?;

        let err = write_example_config(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            AppConfig::load_from_path(&config_path)?.rebalance.cash_injection,
            5.0
        );
        Ok(())
    }

    #[test]
    fn test_settings_table_lists_effective_values() {
        let rendered = settings_table(&AppConfig::default()).to_string();

        assert!(rendered.contains("4,000,000.00"));
        assert!(rendered.contains("target_alloc.json"));
        assert!(rendered.contains("report.json"));
        assert!(rendered.contains("https://query1.finance.yahoo.com"));
    }

    #[test]
    fn test_setup_honors_explicit_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("rebal.yaml");

        setup(config_path.to_str())?;

        assert!(config_path.exists());
        Ok(())
    }
}
