use super::ui;
use crate::core::allocation::{Holdings, TargetAllocation, symbol_universe};
use crate::core::config::RebalanceConfig;
use crate::core::currency::{Currency, CurrencyRateProvider};
use crate::core::market;
use crate::core::price::PriceProvider;
use crate::core::rebalance::{self, RebalancePlan};
use crate::core::report::{self, JsonOutput, ValuationReport};
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use tracing::info;

/// Loads inputs, prices every symbol, prints the plan and writes `to_buy.json`
/// and `report.json`. Either both files are replaced or neither is.
pub async fn run(
    config: &RebalanceConfig,
    price_provider: &(dyn PriceProvider + Send + Sync),
    currency_provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<()> {
    config.validate()?;
    let holdings = Holdings::load(&config.holdings_path)?;
    let target = TargetAllocation::load(&config.target_path)?;
    let symbols = symbol_universe(&holdings, &target);

    let pb = ui::new_progress_bar(symbols.len() as u64 + 1, true);
    pb.set_message("Fetching prices...");
    let snapshot =
        market::fetch_snapshot(&symbols, price_provider, currency_provider, &|| pb.inc(1)).await;
    pb.finish_and_clear();
    let snapshot = snapshot?;

    let plan = rebalance::compute_plan(config, &holdings, &target, &snapshot)?;
    display_plan(&plan, config.show_zero_rows, snapshot.latest_as_of());

    let orders = report::buy_orders(&plan, config.show_zero_rows);
    let outputs = [
        JsonOutput::new(&config.to_buy_path, &orders)?,
        JsonOutput::new(&config.report_path, &ValuationReport::from_plan(&plan))?,
    ];
    report::write_outputs(&outputs)?;
    println!();
    for output in &outputs {
        println!("Wrote {}", output.path().display());
    }

    info!(orders = orders.len(), "Rebalance complete");
    Ok(())
}

fn display_plan(plan: &RebalancePlan, show_zero: bool, as_of: Option<DateTime<Utc>>) {
    let base = Currency::BASE;
    println!(
        "\n{}\n",
        ui::style_text("Re-balancing proposal", ui::StyleType::Title)
    );

    let mut rows = plan.visible_rows(show_zero).peekable();
    if rows.peek().is_none() {
        println!(
            "{}",
            ui::style_text(
                "Portfolio already matches the target, nothing to buy.",
                ui::StyleType::Subtle
            )
        );
    } else {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Price"),
            ui::header_cell(&format!("Price ({base})")),
            ui::header_cell("Own"),
            ui::header_cell("Buy"),
            ui::header_cell(&format!("Cost ({base})")),
        ]);
        for row in rows {
            table.add_row(vec![
                Cell::new(&row.symbol),
                ui::number_cell(row.display_price()),
                ui::number_cell(ui::format_amount(row.price_base)),
                ui::number_cell(row.owned),
                ui::highlight_cell(row.buy),
                ui::number_cell(ui::format_amount(row.cost_base)),
            ]);
        }
        println!("{table}");
    }

    println!();
    let totals = [
        ("Current value", plan.current_value),
        ("Cash injection", plan.cash_injection),
        ("Total capital", plan.total_capital),
        ("Order cost", plan.total_cost()),
    ];
    for (label, value) in totals {
        println!(
            "{} {}",
            ui::style_text(&format!("{label} ({base}):"), ui::StyleType::TotalLabel),
            ui::format_amount(value)
        );
    }
    let leftover = plan.leftover_cash();
    let leftover_style = if leftover < 0.0 {
        ui::StyleType::Warning
    } else {
        ui::StyleType::TotalValue
    };
    println!(
        "{} {}",
        ui::style_text(&format!("Leftover cash ({base}):"), ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_amount(leftover), leftover_style)
    );
    if leftover < 0.0 {
        println!(
            "{}",
            ui::style_text(
                "Orders exceed the cash injection: holdings above target are not sold.",
                ui::StyleType::Warning
            )
        );
    }

    let rate_line = match as_of {
        Some(ts) => format!(
            "USD/{base} {:.4}, prices as of {}",
            plan.usd_twd,
            ts.format("%Y-%m-%d")
        ),
        None => format!("USD/{base} {:.4}", plan.usd_twd),
    };
    println!("{}", ui::style_text(&rate_line, ui::StyleType::Subtle));
}
