use super::ui;
use crate::core::allocation::TargetAllocation;
use crate::core::exposure;
use crate::core::metadata::MetadataProvider;
use anyhow::Result;
use comfy_table::Cell;
use std::path::Path;

pub async fn run(target_path: &Path, provider: &(dyn MetadataProvider + Send + Sync)) -> Result<()> {
    let target = TargetAllocation::load(target_path)?;

    let pb = ui::new_progress_bar(0, true);
    pb.set_message("Classifying tickers...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let report = exposure::compute_exposure(&target, provider).await;
    pb.finish_and_clear();

    for (symbol, reason) in &report.skipped {
        println!(
            "{}",
            ui::style_text(
                &format!("Warning: Could not fetch info for {symbol}: {reason}"),
                ui::StyleType::Warning
            )
        );
    }

    if !report.tickers.is_empty() {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Ticker"),
            ui::header_cell("Target weight"),
        ]);
        for ticker in &report.tickers {
            table.add_row(vec![
                Cell::new(ticker),
                ui::number_cell(format!("{:.2}%", target.weight(ticker) * 100.0)),
            ]);
        }
        println!("{table}");
    }

    println!(
        "{} {}",
        ui::style_text("RE/REIT tickers:", ui::StyleType::TotalLabel),
        report.tickers.join(", ")
    );
    println!(
        "{} {}",
        ui::style_text("RE ratio:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}%", report.ratio * 100.0),
            ui::StyleType::TotalValue
        )
    );
    Ok(())
}
