//! Test fixtures for lists, accounts and operation results.

use crate::model::{
    AccountRegistration, ApplicableNetwork, ErrorInfo, Interaction, InteractionCode,
    InteractionReason, Links, ListResult, Networks, OperationResult, OperationType, PresetAccount,
    ProviderParameters, LINK_OPERATION, LINK_SELF,
};

/// Self link of the list returned by [`list`].
pub const LIST_URL: &str = "https://api.example.com/pci/v1/lists/L1";

fn links(pairs: &[(&str, String)]) -> Links {
    pairs
        .iter()
        .map(|(name, url)| (name.to_string(), url.clone()))
        .collect()
}

/// Operation link of a network in [`LIST_URL`].
pub fn network_operation_url(code: &str) -> String {
    format!("{}/{}/charge", LIST_URL, code)
}

/// Self link of a registered account.
pub fn account_url(id: &str) -> String {
    format!("https://api.example.com/pci/v1/accounts/{}", id)
}

/// An applicable network with an operation link.
pub fn network(code: &str, method: &str) -> ApplicableNetwork {
    ApplicableNetwork {
        code: code.to_string(),
        label: code.to_string(),
        method: method.to_string(),
        grouping: None,
        registration: None,
        recurrence: None,
        redirect: false,
        links: links(&[(LINK_OPERATION, network_operation_url(code))]),
        providers: Vec::new(),
    }
}

/// A registered account with self and operation links.
pub fn account(code: &str, id: &str) -> AccountRegistration {
    AccountRegistration {
        code: code.to_string(),
        label: code.to_string(),
        method: "CREDIT_CARD".to_string(),
        masked_account: None,
        links: links(&[
            (LINK_SELF, account_url(id)),
            (LINK_OPERATION, format!("{}/charge", account_url(id))),
        ]),
    }
}

/// A preset account as found in a PRESET list.
pub fn preset(code: &str) -> PresetAccount {
    PresetAccount {
        code: code.to_string(),
        method: "CREDIT_CARD".to_string(),
        masked_account: None,
        links: links(&[(LINK_OPERATION, format!("{}/preset/charge", LIST_URL))]),
        redirect: None,
    }
}

/// A PROCEED/OK list of the given type.
pub fn list(operation_type: OperationType, networks: Vec<ApplicableNetwork>) -> ListResult {
    ListResult {
        links: links(&[(LINK_SELF, LIST_URL.to_string())]),
        result_info: format!("{} applicable networks", networks.len()),
        interaction: Interaction::proceed_ok(),
        operation_type: Some(operation_type),
        accounts: Vec::new(),
        networks: Networks {
            applicable: networks,
        },
        preset_account: None,
        extra_elements: None,
        risk_providers: Vec::new(),
    }
}

/// A CHARGE list offering VISA and MASTERCARD.
pub fn card_list() -> ListResult {
    list(
        OperationType::Charge,
        vec![network("VISA", "CREDIT_CARD"), network("MASTERCARD", "CREDIT_CARD")],
    )
}

/// A CHARGE list that asks for the given risk providers.
pub fn list_with_risk(providers: &[(&str, Option<&str>)]) -> ListResult {
    let mut list = card_list();
    list.risk_providers = providers
        .iter()
        .map(|(code, kind)| ProviderParameters::new(*code, kind.map(str::to_string)))
        .collect();
    list
}

pub fn operation_result(code: InteractionCode, reason: InteractionReason) -> OperationResult {
    OperationResult::new(format!("{}/{}", code, reason), Interaction::new(code, reason))
}

pub fn error_info(code: InteractionCode, reason: InteractionReason) -> ErrorInfo {
    ErrorInfo::new(format!("{}/{}", code, reason), Interaction::new(code, reason))
}
