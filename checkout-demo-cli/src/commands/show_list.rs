//! Show-list command - print what a list offers without starting a checkout

use anyhow::{Context, Result};
use checkout_lib::{CheckoutConfig, HttpConnection, PaymentConnection};

use crate::ui;

#[tracing::instrument(skip(config), fields(list_url = %config.list_url))]
pub async fn run(config: &CheckoutConfig, json: bool) -> Result<()> {
    let connection =
        HttpConnection::new(config.connection.clone()).context("Failed to build HTTP client")?;

    let spinner = ui::spinner("Loading list...");
    let list = connection.load_list(&config.list_url).await;
    spinner.finish_and_clear();
    let list = list.context("Failed to load list")?;

    if json {
        ui::json(&serde_json::to_value(&list)?);
        return Ok(());
    }

    ui::header("Payment Session");
    ui::key_value("Interaction", &list.interaction.to_string());
    ui::key_value("Result", &list.result_info);
    if let Some(operation_type) = &list.operation_type {
        ui::key_value("Operation", operation_type.as_str());
    }

    if let Some(preset) = &list.preset_account {
        ui::header("Preset Account");
        ui::key_value(&preset.code, &preset.method);
    }

    if !list.accounts.is_empty() {
        ui::header("Registered Accounts");
        for account in &list.accounts {
            let label = account
                .masked_account
                .as_ref()
                .and_then(|masked| masked.display_label.as_deref())
                .unwrap_or(&account.label);
            ui::key_value(&account.code, label);
        }
    }

    ui::header("Networks");
    if list.applicable_networks().is_empty() {
        ui::warning("No applicable networks");
    }
    for network in list.applicable_networks() {
        ui::key_value(&network.code, &format!("{} ({})", network.label, network.method));
    }

    if !list.risk_providers.is_empty() {
        ui::header("Risk Providers");
        for provider in &list.risk_providers {
            ui::key_value(
                &provider.provider_code,
                provider.provider_type.as_deref().unwrap_or("-"),
            );
        }
    }

    Ok(())
}
