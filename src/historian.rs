// 📜 Historian - append-only record of committed transactions
// Every change is an event; records are never rewritten
//
// Records are chained: each hash covers the previous record's hash, so any
// edit to an earlier record breaks `verify_chain`.

use crate::schema::FullyQualifiedName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorianRecord {
    pub transaction_id: String,
    pub transaction_type: FullyQualifiedName,
    pub timestamp: DateTime<Utc>,

    /// Who submitted the transaction
    pub participant: String,

    /// The transaction as submitted
    pub payload: serde_json::Value,

    pub previous_hash: Option<String>,
    pub hash: String,
}

impl HistorianRecord {
    fn new(
        transaction_type: FullyQualifiedName,
        payload: serde_json::Value,
        participant: &str,
        previous_hash: Option<String>,
    ) -> Self {
        let mut record = HistorianRecord {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            transaction_type,
            timestamp: Utc::now(),
            participant: participant.to_string(),
            payload,
            previous_hash,
            hash: String::new(),
        };
        record.hash = record.compute_hash();
        record
    }

    /// SHA-256 over the chain link and the record contents.
    /// Each field is length-prefixed so field boundaries are unambiguous.
    pub fn compute_hash(&self) -> String {
        let fields = [
            self.previous_hash.clone().unwrap_or_default(),
            self.transaction_id.clone(),
            self.transaction_type.to_string(),
            self.timestamp.to_rfc3339(),
            self.participant.clone(),
            self.payload.to_string(),
        ];

        let mut hasher = Sha256::new();
        for field in &fields {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Historian {
    records: Vec<HistorianRecord>,
}

impl Historian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed transaction and return its record
    pub fn append(
        &mut self,
        transaction_type: FullyQualifiedName,
        payload: serde_json::Value,
        participant: &str,
    ) -> HistorianRecord {
        let previous_hash = self.records.last().map(|r| r.hash.clone());
        let record = HistorianRecord::new(transaction_type, payload, participant, previous_hash);
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[HistorianRecord] {
        &self.records
    }

    pub fn records_for(&self, transaction_type: &FullyQualifiedName) -> Vec<&HistorianRecord> {
        self.records
            .iter()
            .filter(|r| &r.transaction_type == transaction_type)
            .collect()
    }

    pub fn get(&self, transaction_id: &str) -> Option<&HistorianRecord> {
        self.records
            .iter()
            .find(|r| r.transaction_id == transaction_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check every hash and every link back to the first record
    pub fn verify_chain(&self) -> bool {
        let mut previous: Option<&str> = None;
        for record in &self.records {
            if record.previous_hash.as_deref() != previous || record.compute_hash() != record.hash {
                return false;
            }
            previous = Some(&record.hash);
        }
        true
    }

    /// Replace the history with previously persisted records
    pub fn restore(&mut self, records: Vec<HistorianRecord>) {
        self.records = records;
    }
}
