// 🌽 Commodity - asset held in the ownership ledger
//
// Trading symbol is IDENTITY; owner is the only value trades change

use super::relationship::Relationship;
use super::trader::Trader;
use super::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
    /// Stable identity (e.g. "EMA")
    pub trading_symbol: String,
    pub description: String,
    pub main_exchange: String,
    pub quantity: i64,

    /// Current owner, by identifier
    pub owner: Relationship<Trader>,
}

impl Commodity {
    pub fn new(
        trading_symbol: impl Into<String>,
        description: impl Into<String>,
        main_exchange: impl Into<String>,
        quantity: i64,
        owner: Relationship<Trader>,
    ) -> Self {
        Commodity {
            trading_symbol: trading_symbol.into(),
            description: description.into(),
            main_exchange: main_exchange.into(),
            quantity,
            owner,
        }
    }

    pub fn is_owned_by(&self, trader_id: &str) -> bool {
        self.owner.id() == trader_id
    }
}

impl Resource for Commodity {
    const TYPE_NAME: &'static str = "Commodity";

    fn identifier(&self) -> &str {
        &self.trading_symbol
    }
}
