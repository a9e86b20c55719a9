// 🌐 Business Network - schema + registries + handlers + history
//
// Transactions run one at a time (`&mut self`): validate the payload against
// the schema, check every relationship resolves, run the handler, record the
// transaction. A failing transaction leaves no history record.

use crate::config::NetworkConfig;
use crate::entities::{parse_relationship_uri, Commodity, Relationship, Resource, Trader};
use crate::error::{LedgerError, Result};
use crate::historian::{Historian, HistorianRecord};
use crate::registry::Registry;
use crate::schema::{FullyQualifiedName, SchemaRegistry, TypeKind};
use crate::transaction::{trade_commodity, Trade, TransactionType};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// WORLD STATE
// ============================================================================

/// Everything a transaction handler may read or write
pub struct WorldState {
    schema: Arc<SchemaRegistry>,
    traders: Registry<Trader>,
    commodities: Registry<Commodity>,
}

impl WorldState {
    pub fn new(schema: Arc<SchemaRegistry>) -> Result<Self> {
        let trader_def = schema.require(&schema.qualify(Trader::TYPE_NAME)?)?.clone();
        let commodity_def = schema.require(&schema.qualify(Commodity::TYPE_NAME)?)?.clone();

        Ok(WorldState {
            traders: Registry::new(trader_def)?,
            commodities: Registry::new(commodity_def)?,
            schema,
        })
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Participant registry
    pub fn traders(&self) -> &Registry<Trader> {
        &self.traders
    }

    /// Asset registry (the ownership ledger)
    pub fn commodities(&self) -> &Registry<Commodity> {
        &self.commodities
    }

    /// Does `id` exist in the registry for `fqn`?
    pub fn exists(&self, fqn: &FullyQualifiedName, id: &str) -> Result<bool> {
        if fqn == self.traders.fqn() {
            self.traders.exists(id)
        } else if fqn == self.commodities.fqn() {
            self.commodities.exists(id)
        } else {
            Err(LedgerError::UnknownType(fqn.to_string()))
        }
    }
}

/// Explicit relationship resolution: `resolve(ref) -> entity`
pub trait Resolve<T> {
    fn resolve(&self, relationship: &Relationship<T>) -> Result<T>;
}

impl Resolve<Trader> for WorldState {
    fn resolve(&self, relationship: &Relationship<Trader>) -> Result<Trader> {
        self.traders.resolve(relationship)
    }
}

impl Resolve<Commodity> for WorldState {
    fn resolve(&self, relationship: &Relationship<Commodity>) -> Result<Commodity> {
        self.commodities.resolve(relationship)
    }
}

// ============================================================================
// BUSINESS NETWORK
// ============================================================================

type Handler = Box<dyn Fn(&Value, &WorldState) -> Result<()> + Send + Sync>;

pub struct BusinessNetwork {
    config: NetworkConfig,
    state: WorldState,
    handlers: HashMap<FullyQualifiedName, Handler>,
    historian: Historian,
}

impl BusinessNetwork {
    /// Start a network with the commodity trading model and its handlers
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let schema = SchemaRegistry::commodity_trading(&config.namespace)?;

        let mut network = BusinessNetwork {
            state: WorldState::new(Arc::new(schema))?,
            handlers: HashMap::new(),
            historian: Historian::new(),
            config,
        };
        network.register_handler::<Trade>(trade_commodity)?;

        info!(namespace = %network.config.namespace, "business network started");
        Ok(network)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn schema(&self) -> &SchemaRegistry {
        self.state.schema()
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Handle to the participant registry (shares storage with the network)
    pub fn participant_registry(&self) -> Registry<Trader> {
        self.state.traders.clone()
    }

    /// Handle to the asset registry (shares storage with the network)
    pub fn asset_registry(&self) -> Registry<Commodity> {
        self.state.commodities.clone()
    }

    /// Build a relationship to a `T` in this network's namespace
    pub fn relationship<T: Resource>(&self, id: impl Into<String>) -> Result<Relationship<T>> {
        Relationship::new(&self.config.namespace, id)
    }

    pub fn resolve<T>(&self, relationship: &Relationship<T>) -> Result<T>
    where
        WorldState: Resolve<T>,
    {
        self.state.resolve(relationship)
    }

    /// Route transactions of type `T` to `handler`
    pub fn register_handler<T: TransactionType + 'static>(
        &mut self,
        handler: fn(&T, &WorldState) -> Result<()>,
    ) -> Result<()> {
        let fqn = self.schema().qualify(T::TYPE_NAME)?;
        if self.schema().require(&fqn)?.kind != TypeKind::Transaction {
            return Err(LedgerError::UnknownTransaction(fqn.to_string()));
        }

        self.handlers.insert(
            fqn,
            Box::new(move |payload: &Value, state: &WorldState| {
                let transaction: T = serde_json::from_value(payload.clone())?;
                handler(&transaction, state)
            }),
        );
        Ok(())
    }

    /// Submit a typed transaction
    pub fn submit_transaction<T: TransactionType>(&mut self, transaction: &T) -> Result<HistorianRecord> {
        let fqn = self.schema().qualify(T::TYPE_NAME)?;
        let payload = serde_json::to_value(transaction)?;
        self.submit(&fqn, payload)
    }

    /// Submit a serialized transaction by fully qualified type name
    pub fn submit(&mut self, fqn: &FullyQualifiedName, payload: Value) -> Result<HistorianRecord> {
        match self.process(fqn, &payload) {
            Ok(()) => {
                let record = self.historian.append(fqn.clone(), payload, &self.config.actor);
                info!(
                    transaction = %fqn,
                    transaction_id = %record.transaction_id,
                    "transaction committed"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(transaction = %fqn, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }

    fn process(&self, fqn: &FullyQualifiedName, payload: &Value) -> Result<()> {
        let definition = self.schema().require(fqn)?;
        let handler = self
            .handlers
            .get(fqn)
            .ok_or_else(|| LedgerError::UnknownTransaction(fqn.to_string()))?;

        definition
            .validate(payload)
            .map_err(LedgerError::Validation)?;

        // Referential integrity: every relationship must resolve right now
        for (field, target) in definition.relationships() {
            let uri = payload.get(field).and_then(Value::as_str).unwrap_or_default();
            let (_, id) = parse_relationship_uri(uri)?;
            if !self.state.exists(target, &id)? {
                return Err(LedgerError::not_found(target, id));
            }
        }

        handler(payload, &self.state)
    }

    pub fn history(&self) -> &Historian {
        &self.historian
    }

    pub(crate) fn historian_mut(&mut self) -> &mut Historian {
        &mut self.historian
    }
}

impl fmt::Debug for BusinessNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        handlers.sort();

        f.debug_struct("BusinessNetwork")
            .field("config", &self.config)
            .field("handlers", &handlers)
            .field("history", &self.historian.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
