// Commodity Trading Network - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod db;
pub mod entities;       // Trader, Commodity, Relationship
pub mod error;
pub mod historian;      // Append-only transaction history
pub mod network;        // Business network: dispatch + referential integrity
pub mod registry;       // Versioned participant/asset registries
pub mod schema;         // Typed (namespace, type) model
pub mod transaction;    // Trade + trade_commodity handler

// Re-export commonly used types
pub use config::NetworkConfig;
pub use db::{
    setup_database, save_network, load_network,
    insert_record, get_history, get_namespace_history,
    load_traders_csv, load_commodities_csv, import_csv,
};
pub use entities::{Commodity, Relationship, Resource, Trader};
pub use error::{LedgerError, Result};
pub use historian::{Historian, HistorianRecord};
pub use network::{BusinessNetwork, Resolve, WorldState};
pub use registry::{Registry, Versioned};
pub use schema::{
    FullyQualifiedName, SchemaRegistry, TypeDefinition, TypeKind,
    FieldDefinition, FieldType, ValidationError, ValidationResult,
    DEFAULT_NAMESPACE,
};
pub use transaction::{trade_commodity, Trade, TransactionType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
