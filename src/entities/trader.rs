// 🧑‍💼 Trader - participant of the trading network
//
// The trader id is IDENTITY (never changes); names are values

use super::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trader {
    /// Stable identity (e.g. an email address)
    pub trader_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Trader {
    pub fn new(
        trader_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Trader {
            trader_id: trader_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Resource for Trader {
    const TYPE_NAME: &'static str = "Trader";

    fn identifier(&self) -> &str {
        &self.trader_id
    }
}
