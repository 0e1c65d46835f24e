//! Checkout command - run an interactive checkout against a list

use anyhow::{Context, Result};
use checkout_interactive::{CheckoutOrchestrator, FollowUp, OrchestratorHandle};
use checkout_lib::model::{CheckoutResult, FlowType, InteractionCode};
use checkout_lib::request::BrowserData;
use checkout_lib::{CheckoutConfig, HttpConnection, InputCategory, InputValues};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::terminal::{CardView, TerminalHost, TerminalLauncher, UiEvent};
use crate::ui;

#[tracing::instrument(skip(config), fields(list_url = %config.list_url))]
pub async fn run(config: CheckoutConfig) -> Result<()> {
    ui::header("Checkout");

    let connection = Arc::new(
        HttpConnection::new(config.connection.clone()).context("Failed to build HTTP client")?,
    );
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let host = Arc::new(TerminalHost::new(events_tx.clone()));
    let launcher = Arc::new(TerminalLauncher::new(events_tx));

    let handle = CheckoutOrchestrator::new(connection, host, launcher)
        .with_browser_data(terminal_browser_data())
        .spawn();

    handle.load_session(config).await?;
    let mut spinner = Some(ui::spinner("Loading payment session..."));
    let mut cards: Vec<CardView> = Vec::new();

    while let Some(event) = events.recv().await {
        if let Some(pb) = spinner.take() {
            pb.finish_and_clear();
        }
        tracing::debug!(?event, "host event");

        match event {
            UiEvent::SessionReady(ready) => {
                cards = ready;
                if !choose_card(&handle, &cards).await? {
                    ui::info("Checkout cancelled");
                    return Ok(());
                }
            }
            UiEvent::Processing(key) => {
                spinner = Some(ui::spinner(&format!("Processing {}...", key)));
            }
            UiEvent::Message(interaction, follow_up) => {
                ui::warning(&format!("The payment was not completed ({})", interaction));
                match follow_up {
                    FollowUp::KeepSession => {
                        if !choose_card(&handle, &cards).await? {
                            ui::info("Checkout cancelled");
                            return Ok(());
                        }
                    }
                    FollowUp::ReloadSession => {
                        spinner = Some(ui::spinner("Reloading payment session..."));
                    }
                }
            }
            UiEvent::ConnectionError(flow) => {
                ui::error(&format!("Could not reach the Payment API during {}", flow));
                if ui::confirm("Retry?", true)? {
                    handle.retry().await?;
                    spinner = Some(retry_spinner(flow));
                } else {
                    handle.abort().await?;
                }
            }
            UiEvent::Redirect { url, form } => {
                spinner = follow_redirect(&handle, &url, &form).await?;
            }
            UiEvent::Finished(result) => {
                print_result(&result);
                return Ok(());
            }
        }
    }

    anyhow::bail!("Checkout ended without a result")
}

/// Lets the user pay with, or delete, one of `cards`. Returns false on cancel.
async fn choose_card(handle: &OrchestratorHandle, cards: &[CardView]) -> Result<bool> {
    ui::separator();
    let mut items: Vec<String> = cards
        .iter()
        .map(|card| format!("Pay with {} ({})", card.label, card.payment_method))
        .collect();
    let deletable: Vec<&CardView> = cards.iter().filter(|card| card.deletable).collect();
    items.extend(deletable.iter().map(|card| format!("Delete {}", card.label)));
    items.push("Cancel".to_string());

    loop {
        let choice = ui::select("Payment method", &items)?;
        if let Some(card) = cards.get(choice) {
            let input = prompt_input(card)?;
            handle.select_card(&card.key, input).await?;
            return Ok(true);
        }
        match deletable.get(choice - cards.len()) {
            Some(card) => {
                if ui::confirm(&format!("Delete {}?", card.label), false)? {
                    handle.delete_account(&card.key).await?;
                    return Ok(true);
                }
            }
            None => return Ok(false),
        }
    }
}

fn prompt_input(card: &CardView) -> Result<InputValues> {
    let mut input = InputValues::new();
    if card.needs_card_details {
        input.put(InputCategory::Account, "number", ui::input("Card number")?);
        input.put(InputCategory::Account, "expiryMonth", ui::input("Expiry month (MM)")?);
        input.put(InputCategory::Account, "expiryYear", ui::input("Expiry year (YYYY)")?);
        input.put(InputCategory::Account, "verificationCode", ui::input("CVC")?);
        input.put(InputCategory::Account, "holderName", ui::input("Card holder")?);
    } else if card.needs_verification {
        if let Some(code) = ui::optional_input("CVC (leave empty to skip)")? {
            input.put(InputCategory::Account, "verificationCode", code);
        }
    }
    Ok(input)
}

/// Shows the redirect, waits for the return URL and resumes the checkout.
async fn follow_redirect(
    handle: &OrchestratorHandle,
    url: &str,
    form: &[(String, String)],
) -> Result<Option<ProgressBar>> {
    handle.pause().await?;

    ui::info("Open this URL in a browser to continue:");
    println!("\n  {}\n", url);
    if !form.is_empty() {
        ui::info("Submit it as a POST form with:");
        for (name, value) in form {
            ui::key_value(name, value);
        }
    }

    loop {
        let returned = ui::input("Paste the URL the browser returned to")?;
        match handle.complete_redirect(returned.trim()).await {
            Ok(()) => break,
            Err(err) => ui::error(&err.to_string()),
        }
    }

    handle.resume().await?;
    Ok(Some(ui::spinner("Finishing payment...")))
}

fn retry_spinner(flow: FlowType) -> ProgressBar {
    match flow {
        FlowType::Load => ui::spinner("Reloading payment session..."),
        _ => ui::spinner("Retrying..."),
    }
}

fn terminal_browser_data() -> BrowserData {
    BrowserData {
        java_enabled: Some(false),
        language: std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(|tag| tag.replace('_', "-"))),
        ..BrowserData::default()
    }
}

fn print_result(result: &CheckoutResult) {
    ui::separator();
    let interaction = result.interaction();
    let summary = format!("{} {}", interaction, result.result_info());
    match interaction.code {
        InteractionCode::Proceed => ui::success(&summary),
        InteractionCode::Verify => ui::warning(&summary),
        _ => ui::error(&summary),
    }
    if let Some(cause) = result.cause() {
        ui::key_value("Cause", &cause.message);
    }
}
