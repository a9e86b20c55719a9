// 🔁 Transactions - units of ledger mutation and their handlers

use crate::entities::{Commodity, Relationship, Trader};
use crate::error::Result;
use crate::network::{Resolve, WorldState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A transaction payload the network can dispatch to a handler
pub trait TransactionType: Serialize + DeserializeOwned {
    /// Short type name; the network namespace qualifies it
    const TYPE_NAME: &'static str;
}

/// Move a commodity to a new owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub commodity: Relationship<Commodity>,
    pub new_owner: Relationship<Trader>,
}

impl Trade {
    pub fn new(commodity: Relationship<Commodity>, new_owner: Relationship<Trader>) -> Self {
        Trade {
            commodity,
            new_owner,
        }
    }
}

impl TransactionType for Trade {
    const TYPE_NAME: &'static str = "Trade";
}

/// Track the trade of a commodity from one trader to another.
///
/// Resolves the commodity, points its owner at `new_owner` and writes it back
/// through the asset registry. Neither the previous owner nor the new owner
/// is checked here; resolution and persistence errors propagate unchanged.
pub fn trade_commodity(trade: &Trade, state: &WorldState) -> Result<()> {
    let mut commodity: Commodity = state.resolve(&trade.commodity)?;
    debug!(
        commodity = %commodity.trading_symbol,
        from = %commodity.owner.id(),
        to = %trade.new_owner.id(),
        "trading commodity"
    );

    commodity.owner = trade.new_owner.clone();
    state.commodities().update(commodity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRegistry, DEFAULT_NAMESPACE};
    use std::sync::Arc;

    fn state_with_corn() -> WorldState {
        let schema = SchemaRegistry::commodity_trading(DEFAULT_NAMESPACE).unwrap();
        let state = WorldState::new(Arc::new(schema)).unwrap();

        state
            .commodities()
            .add(Commodity::new(
                "EMA",
                "Corn",
                "Euronext",
                100,
                Relationship::new(DEFAULT_NAMESPACE, "dan@email.com").unwrap(),
            ))
            .unwrap();
        state
    }

    fn trade(symbol: &str, new_owner: &str) -> Trade {
        Trade::new(
            Relationship::new(DEFAULT_NAMESPACE, symbol).unwrap(),
            Relationship::new(DEFAULT_NAMESPACE, new_owner).unwrap(),
        )
    }

    #[test]
    fn test_trade_moves_owner() {
        let state = state_with_corn();

        trade_commodity(&trade("EMA", "simon@email.com"), &state).unwrap();

        let ema = state.commodities().get("EMA").unwrap();
        assert!(ema.is_owned_by("simon@email.com"));
        assert_eq!(ema.description, "Corn");
        assert_eq!(ema.main_exchange, "Euronext");
        assert_eq!(ema.quantity, 100);
    }

    #[test]
    fn test_replayed_trade_keeps_end_state() {
        let state = state_with_corn();
        let t = trade("EMA", "simon@email.com");

        trade_commodity(&t, &state).unwrap();
        trade_commodity(&t, &state).unwrap();

        assert!(state
            .commodities()
            .get("EMA")
            .unwrap()
            .is_owned_by("simon@email.com"));
    }

    #[test]
    fn test_unknown_commodity_is_not_found() {
        let state = state_with_corn();

        let err = trade_commodity(&trade("GOLD", "simon@email.com"), &state).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(state.commodities().count().unwrap(), 1);
        assert!(!state.commodities().exists("GOLD").unwrap());
        assert!(state
            .commodities()
            .get("EMA")
            .unwrap()
            .is_owned_by("dan@email.com"));
    }

    #[test]
    fn test_handler_does_not_check_new_owner() {
        // Participant existence is the network's concern, not the handler's
        let state = state_with_corn();

        trade_commodity(&trade("EMA", "ghost@email.com"), &state).unwrap();
        assert!(state
            .commodities()
            .get("EMA")
            .unwrap()
            .is_owned_by("ghost@email.com"));
    }

    #[test]
    fn test_trade_json_shape() {
        let value = serde_json::to_value(trade("EMA", "simon@email.com")).unwrap();

        assert_eq!(value["commodity"], "resource:org.acme.bnatemplate.Commodity#EMA");
        assert_eq!(
            value["newOwner"],
            "resource:org.acme.bnatemplate.Trader#simon@email.com"
        );
    }
}
