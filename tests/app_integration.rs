use rebal::core::RebalanceError;
use rebal::core::config::RebalanceOverrides;
use std::fs;
use std::path::Path;
use tracing::{error, info};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn chart_response(price: f64, currency: &str, long_name: &str) -> String {
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{
                            "regularMarketPrice": {price},
                            "currency": "{currency}",
                            "longName": "{long_name}"
                        }},
                        "timestamp": [1760486400],
                        "indicators": {{ "quote": [{{ "close": [{price}] }}] }}
                    }}]
                }}
            }}"#
        )
    }

    pub async fn mount_chart(server: &MockServer, symbol: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }
}

fn write_config(dir: &Path, base_url: &str, holdings: &str, target: &str) -> String {
    fs::write(dir.join("holdings.json"), holdings).expect("Failed to write holdings");
    fs::write(dir.join("target_alloc.json"), target).expect("Failed to write target");

    let config_path = dir.join("config.yaml");
    let config_content = format!(
        r#"
        rebalance:
          cash_injection: 100000
          holdings_path: "{dir}/holdings.json"
          target_path: "{dir}/target_alloc.json"
          to_buy_path: "{dir}/to_buy.json"
          report_path: "{dir}/report.json"
        providers:
          yahoo:
            base_url: {base_url}
    "#,
        dir = dir.display(),
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path.to_string_lossy().into_owned()
}

#[test_log::test(tokio::test)]
async fn test_full_rebalance_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_chart(
        &mock_server,
        "VTI",
        test_utils::chart_response(10.0, "USD", "Vanguard Total Stock Market Index Fund ETF"),
    )
    .await;
    test_utils::mount_chart(
        &mock_server,
        "0050.TW",
        test_utils::chart_response(200.0, "TWD", "Yuanta Taiwan Top 50 ETF"),
    )
    .await;
    test_utils::mount_chart(
        &mock_server,
        "USDTWD=X",
        test_utils::chart_response(32.0, "TWD", "USD/TWD"),
    )
    .await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        dir.path(),
        &mock_server.uri(),
        r#"{"VTI": 100, "0050.TW": 100}"#,
        r#"{"VTI": 0.5, "0050.TW": 0.5}"#,
    );

    let result = rebal::run_command(
        rebal::AppCommand::Rebalance(RebalanceOverrides::default()),
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );

    // Held: VTI 32_000 TWD, 0050.TW 20_000 TWD; capital 152_000, 76_000 each.
    let to_buy: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("to_buy.json")).unwrap())
            .unwrap();
    assert_eq!(to_buy, serde_json::json!({"0050.TW": 280, "VTI": 137}));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    info!(%report, "Generated report");
    assert_eq!(report["summary"]["orig_total_usd"], 1625.0);
    assert_eq!(report["positions"]["0050.TW"]["orig_price_usd"], 6.25);
    assert_eq!(report["positions"]["0050.TW"]["new_qty"], 380);
    assert_eq!(report["positions"]["VTI"]["new_value_usd"], 2370.0);
}

#[test_log::test(tokio::test)]
async fn test_missing_prices_abort_without_output() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_chart(
        &mock_server,
        "VTI",
        test_utils::chart_response(10.0, "USD", "Vanguard Total Stock Market Index Fund ETF"),
    )
    .await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        dir.path(),
        &mock_server.uri(),
        r#"{"VTI": 1}"#,
        r#"{"VTI": 0.7, "DELISTED": 0.3}"#,
    );

    let err = rebal::run_command(
        rebal::AppCommand::Rebalance(RebalanceOverrides::default()),
        Some(&config_path),
    )
    .await
    .expect_err("Run should fail without prices");

    match err.downcast_ref::<RebalanceError>() {
        Some(RebalanceError::DataUnavailable { symbols }) => {
            assert_eq!(symbols, &vec!["USDTWD=X (forex rate)", "DELISTED"]);
        }
        _ => panic!("unexpected error: {err}"),
    }
    assert!(!dir.path().join("to_buy.json").exists());
    assert!(!dir.path().join("report.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_invalid_weights_make_no_requests() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::any())
        .respond_with(wiremock::ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        dir.path(),
        &mock_server.uri(),
        r#"{"VTI": 1}"#,
        r#"{"VTI": 0.6, "BND": 0.5}"#,
    );

    let err = rebal::run_command(
        rebal::AppCommand::Rebalance(RebalanceOverrides::default()),
        Some(&config_path),
    )
    .await
    .expect_err("Run should fail on weights summing to 1.1");

    let err = err
        .downcast_ref::<RebalanceError>()
        .expect("Expected a rebalance error");
    assert!(err.is_input_error());
    mock_server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_exposure_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_chart(
        &mock_server,
        "VNQ",
        test_utils::chart_response(91.0, "USD", "Vanguard Real Estate Index Fund ETF Shares"),
    )
    .await;
    test_utils::mount_chart(
        &mock_server,
        "VTI",
        test_utils::chart_response(10.0, "USD", "Vanguard Total Stock Market Index Fund ETF"),
    )
    .await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    // MISSING has no mock and is skipped with a warning
    let config_path = write_config(
        dir.path(),
        &mock_server.uri(),
        "{}",
        r#"{"VNQ": 0.2, "VTI": 0.7, "MISSING": 0.1}"#,
    );

    let result = rebal::run_command(
        rebal::AppCommand::Exposure { target_path: None },
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Exposure failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
#[ignore = "requires network access to Yahoo Finance"]
async fn test_real_yahoo_finance_api() {
    use rebal::core::{CurrencyRateProvider, PriceProvider};
    use rebal::providers::yahoo_finance::{YahooCurrencyProvider, YahooFinanceProvider};

    let base_url = "https://query1.finance.yahoo.com";
    let provider = YahooFinanceProvider::new(base_url);

    let symbol = "2330.TW";
    info!(?symbol, "Fetching price from Yahoo Finance");

    match provider.fetch_price(symbol).await {
        Ok(price_result) => {
            info!(?price_result, "Received successful price response");
            assert!(price_result.price > 0.0, "Price should be positive");
            assert_eq!(price_result.currency.as_deref(), Some("TWD"));
        }
        Err(e) => {
            error!("API request failed: {e}\n{e:?}");
            panic!("API request failed: {e}");
        }
    }

    let rate = YahooCurrencyProvider::new(base_url)
        .get_rate("USD", "TWD")
        .await
        .expect("Currency rate API request failed");
    assert!(rate > 0.0, "Currency rate should be positive");
}
