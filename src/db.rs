// 🗄️ Persistence - SQLite (WAL) snapshots of a network + CSV seed import
//
// Registries are stored as their full version log, so temporal queries keep
// working after a reload. History rows are stored in commit order.

use crate::config::NetworkConfig;
use crate::entities::{Commodity, Relationship, Resource, Trader};
use crate::error::{LedgerError, Result};
use crate::historian::HistorianRecord;
use crate::network::BusinessNetwork;
use crate::registry::{Registry, Versioned};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(journal_mode = %mode, "database opened");

    // ==========================================================================
    // Resource versions (participants + assets, append-only per record)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS resource_versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_name TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            valid_from TEXT NOT NULL,
            valid_until TEXT,
            data TEXT NOT NULL,
            UNIQUE (type_name, resource_id, version)
        )",
        [],
    )?;

    // ==========================================================================
    // History (committed transactions, hash-chained)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id TEXT UNIQUE NOT NULL,
            transaction_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            participant TEXT NOT NULL,
            payload TEXT NOT NULL,
            previous_hash TEXT,
            hash TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_versions_resource ON resource_versions(type_name, resource_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_history_type ON history(transaction_type)",
        [],
    )?;

    Ok(())
}

fn parse_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// REGISTRY VERSIONS
// ============================================================================

fn save_versions<T: Resource>(conn: &Connection, registry: &Registry<T>) -> Result<usize> {
    let type_name = registry.fqn().to_string();
    conn.execute(
        "DELETE FROM resource_versions WHERE type_name = ?1",
        params![type_name],
    )?;

    let snapshot = registry.snapshot()?;
    for v in &snapshot {
        conn.execute(
            "INSERT INTO resource_versions (
                type_name, resource_id, version, valid_from, valid_until, data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                type_name,
                v.record.identifier(),
                v.version,
                v.valid_from.to_rfc3339(),
                v.valid_until.map(|dt| dt.to_rfc3339()),
                serde_json::to_string(&v.record)?,
            ],
        )?;
    }

    Ok(snapshot.len())
}

fn load_versions<T: Resource>(conn: &Connection, registry: &Registry<T>) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT version, valid_from, valid_until, data
         FROM resource_versions
         WHERE type_name = ?1
         ORDER BY id ASC",
    )?;

    let versions = stmt
        .query_map(params![registry.fqn().to_string()], |row| {
            let valid_from: String = row.get(1)?;
            let valid_until: Option<String> = row.get(2)?;
            let data: String = row.get(3)?;

            Ok(Versioned {
                version: row.get(0)?,
                valid_from: parse_time(1, &valid_from)?,
                valid_until: valid_until.map(|s| parse_time(2, &s)).transpose()?,
                record: parse_json(3, &data)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Versioned<T>>>>()?;

    let count = versions.len();
    registry.restore(versions)?;
    Ok(count)
}

// ============================================================================
// HISTORY
// ============================================================================

/// Append one committed transaction to the history table
pub fn insert_record(conn: &Connection, record: &HistorianRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO history (
            transaction_id, transaction_type, timestamp, participant, payload, previous_hash, hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.transaction_id,
            record.transaction_type.to_string(),
            record.timestamp.to_rfc3339(),
            record.participant,
            serde_json::to_string(&record.payload)?,
            record.previous_hash,
            record.hash,
        ],
    )?;

    Ok(())
}

/// All history records in commit order
pub fn get_history(conn: &Connection) -> Result<Vec<HistorianRecord>> {
    query_history(conn, None)
}

/// History records whose transaction type lives in `namespace`, in commit order
pub fn get_namespace_history(conn: &Connection, namespace: &str) -> Result<Vec<HistorianRecord>> {
    query_history(conn, Some(namespace))
}

fn namespace_prefix(namespace: &str) -> String {
    format!("{}.", namespace)
}

fn query_history(conn: &Connection, namespace: Option<&str>) -> Result<Vec<HistorianRecord>> {
    // Exact prefix and a dot-free type name, so org.acme does not match org.acme.x.Trade
    let mut stmt = conn.prepare(
        "SELECT transaction_id, transaction_type, timestamp, participant, payload, previous_hash, hash
         FROM history
         WHERE ?1 IS NULL
            OR (substr(transaction_type, 1, length(?1)) = ?1
                AND instr(substr(transaction_type, length(?1) + 1), '.') = 0)
         ORDER BY id ASC",
    )?;

    let records = stmt
        .query_map(params![namespace.map(namespace_prefix)], |row| {
            let transaction_type: String = row.get(1)?;
            let timestamp: String = row.get(2)?;
            let payload: String = row.get(4)?;

            Ok(HistorianRecord {
                transaction_id: row.get(0)?,
                transaction_type: transaction_type.parse().map_err(|e: LedgerError| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?,
                timestamp: parse_time(2, &timestamp)?,
                participant: row.get(3)?,
                payload: parse_json(4, &payload)?,
                previous_hash: row.get(5)?,
                hash: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

// ============================================================================
// NETWORK SNAPSHOTS
// ============================================================================

/// Persist every registry version and every history record
pub fn save_network(conn: &Connection, network: &BusinessNetwork) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let traders = save_versions(&tx, &network.participant_registry())?;
    let commodities = save_versions(&tx, &network.asset_registry())?;

    // Other namespaces sharing the database keep their history
    tx.execute(
        "DELETE FROM history
         WHERE substr(transaction_type, 1, length(?1)) = ?1
           AND instr(substr(transaction_type, length(?1) + 1), '.') = 0",
        params![namespace_prefix(network.namespace())],
    )?;
    for record in network.history().records() {
        insert_record(&tx, record)?;
    }

    tx.commit()?;
    debug!(
        traders,
        commodities,
        history = network.history().len(),
        "network saved"
    );
    Ok(())
}

/// Rebuild a network from a database written by `save_network`
pub fn load_network(conn: &Connection, config: NetworkConfig) -> Result<BusinessNetwork> {
    let mut network = BusinessNetwork::new(config)?;

    load_versions(conn, &network.participant_registry())?;
    load_versions(conn, &network.asset_registry())?;

    let records = get_namespace_history(conn, network.namespace())?;
    network.historian_mut().restore(records);
    if !network.history().verify_chain() {
        return Err(LedgerError::CorruptHistory(
            "hash chain does not verify".to_string(),
        ));
    }

    Ok(network)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

/// Commodity row with the owner given as a bare trader id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommodityRow {
    trading_symbol: String,
    description: String,
    main_exchange: String,
    quantity: i64,
    owner: String,
}

/// Columns: traderId,firstName,lastName
pub fn load_traders_csv(csv_path: &Path) -> Result<Vec<Trader>> {
    let mut rdr = csv::Reader::from_path(csv_path)?;
    let traders = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<Trader>, _>>()?;
    Ok(traders)
}

/// Columns: tradingSymbol,description,mainExchange,quantity,owner
pub fn load_commodities_csv(csv_path: &Path, namespace: &str) -> Result<Vec<Commodity>> {
    let mut rdr = csv::Reader::from_path(csv_path)?;

    let mut commodities = Vec::new();
    for result in rdr.deserialize() {
        let row: CommodityRow = result?;
        commodities.push(Commodity::new(
            row.trading_symbol,
            row.description,
            row.main_exchange,
            row.quantity,
            Relationship::new(namespace, row.owner)?,
        ));
    }

    Ok(commodities)
}

/// Seed a network's registries from CSV files. Returns (traders, commodities).
pub fn import_csv(
    network: &BusinessNetwork,
    traders_path: &Path,
    commodities_path: &Path,
) -> Result<(usize, usize)> {
    let traders = load_traders_csv(traders_path)?;
    let commodities = load_commodities_csv(commodities_path, network.namespace())?;
    let counts = (traders.len(), commodities.len());

    // Each add_all is atomic; undo the traders if the commodities are rejected
    let participants = network.participant_registry();
    let before = participants.snapshot()?;
    participants.add_all(traders)?;
    if let Err(e) = network.asset_registry().add_all(commodities) {
        participants.restore(before)?;
        return Err(e);
    }

    info!(traders = counts.0, commodities = counts.1, "csv import complete");
    Ok(counts)
}
