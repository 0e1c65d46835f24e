//! Immutable value types for Payment API requests and responses.
//!
//! Every type in here mirrors the JSON the List and Operation APIs exchange.
//! Values are created once per response and superseded, never mutated, by the
//! next response.

mod interaction;
mod list;
mod operation;
mod result;

pub use interaction::{Interaction, InteractionCode, InteractionReason};
pub use list::{
    AccountRegistration, ApplicableNetwork, Checkbox, CheckboxMode, ExtraElement, ExtraElements,
    ListResult, MaskedAccount, Networks, OperationType, PresetAccount,
};
pub use operation::{ErrorInfo, HttpMethod, OperationResult, Parameter, ProviderParameters, Redirect};
pub use result::{CheckoutResult, FailureCause, FailureKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named links (`self`, `operation`, `logo`, ...) attached to API resources.
pub type Links = BTreeMap<String, String>;

/// Link name of the resource itself.
pub const LINK_SELF: &str = "self";

/// Link name used to submit an operation.
pub const LINK_OPERATION: &str = "operation";

/// The kind of request whose outcome is being interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowType {
    /// Loading (or reloading) the payment session.
    Load,
    /// Charging, paying out or presetting through a network or preset account.
    Process,
    /// Deregistering a saved account.
    Delete,
    /// Submitting a network while the list is an UPDATE list.
    Update,
}

impl FlowType {
    /// Interaction code synthesized when a network failure stops this flow.
    ///
    /// Loads can be aborted safely. Anything that submitted an operation may
    /// have been applied server-side, so the result must be verified.
    pub fn network_failure_code(&self) -> InteractionCode {
        match self {
            Self::Load => InteractionCode::Abort,
            Self::Process | Self::Delete | Self::Update => InteractionCode::Verify,
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Load => "LOAD",
            Self::Process => "PROCESS",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
        };
        f.write_str(label)
    }
}

/// Declares an API string enum with an `Unknown` catch-all.
///
/// The Payment API adds codes over time; an unrecognized value must survive a
/// round trip rather than fail deserialization of the whole response.
macro_rules! api_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this client does not know about.
            Unknown(String),
        }

        impl $name {
            /// The wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(value) => value.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $( $wire => Self::$variant, )+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(Self::from(value.as_str()))
            }
        }
    };
}

pub(crate) use api_enum;
