//! Parse-return command - decode the outcome carried by a redirect return URL

use anyhow::{Context, Result};
use checkout_lib::redirect::parse_return_url;

use crate::ui;

pub fn run(url: &str) -> Result<()> {
    let result = parse_return_url(url).context("Not a valid return URL")?;

    ui::header("Redirect Result");
    ui::key_value("Interaction", &result.interaction.to_string());
    if !result.result_info.is_empty() {
        ui::key_value("Result", &result.result_info);
    }
    Ok(())
}
