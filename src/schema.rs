// 📐 Schema Layer - typed model of the business network
// Every type name is resolved to a definition once, when the network starts

use crate::entities::relationship::parse_relationship_uri;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_NAMESPACE: &str = "org.acme.bnatemplate";

// ============================================================================
// FULLY QUALIFIED NAMES
// ============================================================================

/// `namespace.Type`, e.g. `org.acme.bnatemplate.Commodity`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullyQualifiedName {
    namespace: String,
    name: String,
}

impl FullyQualifiedName {
    pub fn new(namespace: &str, name: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        if !is_identifier(name) {
            return Err(LedgerError::InvalidName(format!("{}.{}", namespace, name)));
        }

        Ok(FullyQualifiedName {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for FullyQualifiedName {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, name) = s
            .rsplit_once('.')
            .ok_or_else(|| LedgerError::InvalidName(s.to_string()))?;
        FullyQualifiedName::new(namespace, name)
    }
}

impl TryFrom<String> for FullyQualifiedName {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FullyQualifiedName> for String {
    fn from(fqn: FullyQualifiedName) -> Self {
        fqn.to_string()
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Namespaces are dotted identifiers: `org.acme.bnatemplate`
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || !namespace.split('.').all(is_identifier) {
        return Err(LedgerError::InvalidName(namespace.to_string()));
    }
    Ok(())
}

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Participant,
    Asset,
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    /// By-identifier reference to another declared type
    Relationship(FullyQualifiedName),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub optional: bool,
}

/// Structural definition of one participant, asset or transaction type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub fqn: FullyQualifiedName,
    pub kind: TypeKind,

    /// Identifying field; transactions have none
    pub identified_by: Option<String>,

    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn new(fqn: FullyQualifiedName, kind: TypeKind) -> Self {
        TypeDefinition {
            fqn,
            kind,
            identified_by: None,
            fields: Vec::new(),
        }
    }

    /// Builder: declare the identifying field (always a required string)
    pub fn identified_by(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.push(FieldDefinition {
            name: field.clone(),
            field_type: FieldType::String,
            optional: false,
        });
        self.identified_by = Some(field);
        self
    }

    /// Builder: add a required field
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.into(),
            field_type,
            optional: false,
        });
        self
    }

    /// Builder: add an optional field
    pub fn with_optional_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.into(),
            field_type,
            optional: true,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Relationship fields with their target types
    pub fn relationships(&self) -> impl Iterator<Item = (&str, &FullyQualifiedName)> {
        self.fields.iter().filter_map(|f| match &f.field_type {
            FieldType::Relationship(target) => Some((f.name.as_str(), target)),
            _ => None,
        })
    }

    /// Check a serialized instance against this definition
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        let context = self.fqn.name().to_string();
        let error = |field: &str, message: String| ValidationError {
            field: field.to_string(),
            message,
            context: context.clone(),
        };

        let object = match instance.as_object() {
            Some(object) => object,
            None => return Err(vec![error("$", "Expected an object".to_string())]),
        };

        let mut errors = Vec::new();

        for field in &self.fields {
            let value = match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if !field.optional {
                        errors.push(error(field.name.as_str(), "Required field is missing".to_string()));
                    }
                    continue;
                }
                Some(value) => value,
            };

            match &field.field_type {
                FieldType::String => match value.as_str() {
                    None => errors.push(error(field.name.as_str(), "Expected a string".to_string())),
                    Some("") if self.identified_by.as_deref() == Some(field.name.as_str()) => {
                        errors.push(error(field.name.as_str(), "Identifier must not be empty".to_string()))
                    }
                    Some(_) => {}
                },
                FieldType::Integer => {
                    if value.as_i64().is_none() {
                        errors.push(error(field.name.as_str(), "Expected an integer".to_string()));
                    }
                }
                FieldType::Relationship(target) => {
                    let parsed = value.as_str().map(parse_relationship_uri);
                    match parsed {
                        Some(Ok((fqn, _))) if &fqn == target => {}
                        _ => errors.push(error(
                            field.name.as_str(),
                            format!("Expected a relationship to {}", target),
                        )),
                    }
                }
            }
        }

        for key in object.keys() {
            if self.field(key).is_none() {
                errors.push(error(key.as_str(), format!("Field is not declared in {}", self.fqn)));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

// ============================================================================
// SCHEMA REGISTRY
// ============================================================================

/// Catalog of every type declared by the network
pub struct SchemaRegistry {
    namespace: String,
    types: HashMap<FullyQualifiedName, TypeDefinition>,
}

impl SchemaRegistry {
    /// Create an empty registry for a namespace
    pub fn new(namespace: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        Ok(SchemaRegistry {
            namespace: namespace.to_string(),
            types: HashMap::new(),
        })
    }

    /// The trading model: Trader participants, Commodity assets, Trade transactions
    pub fn commodity_trading(namespace: &str) -> Result<Self> {
        let mut registry = SchemaRegistry::new(namespace)?;

        let trader = FullyQualifiedName::new(namespace, "Trader")?;
        let commodity = FullyQualifiedName::new(namespace, "Commodity")?;
        let trade = FullyQualifiedName::new(namespace, "Trade")?;

        registry.register(
            TypeDefinition::new(trader.clone(), TypeKind::Participant)
                .identified_by("traderId")
                .with_field("firstName", FieldType::String)
                .with_field("lastName", FieldType::String),
        );

        registry.register(
            TypeDefinition::new(commodity.clone(), TypeKind::Asset)
                .identified_by("tradingSymbol")
                .with_field("description", FieldType::String)
                .with_field("mainExchange", FieldType::String)
                .with_field("quantity", FieldType::Integer)
                .with_field("owner", FieldType::Relationship(trader.clone())),
        );

        registry.register(
            TypeDefinition::new(trade, TypeKind::Transaction)
                .with_field("commodity", FieldType::Relationship(commodity))
                .with_field("newOwner", FieldType::Relationship(trader)),
        );

        Ok(registry)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register (or replace) a type definition
    pub fn register(&mut self, definition: TypeDefinition) {
        self.types.insert(definition.fqn.clone(), definition);
    }

    pub fn get(&self, fqn: &FullyQualifiedName) -> Option<&TypeDefinition> {
        self.types.get(fqn)
    }

    /// Like `get`, but an undeclared type is an error
    pub fn require(&self, fqn: &FullyQualifiedName) -> Result<&TypeDefinition> {
        self.get(fqn)
            .ok_or_else(|| LedgerError::UnknownType(fqn.to_string()))
    }

    /// Qualify a short type name with this registry's namespace
    pub fn qualify(&self, name: &str) -> Result<FullyQualifiedName> {
        let fqn = FullyQualifiedName::new(&self.namespace, name)?;
        if self.contains(&fqn) {
            Ok(fqn)
        } else {
            Err(LedgerError::UnknownType(fqn.to_string()))
        }
    }

    pub fn contains(&self, fqn: &FullyQualifiedName) -> bool {
        self.types.contains_key(fqn)
    }

    pub fn by_kind(&self, kind: TypeKind) -> Vec<&TypeDefinition> {
        let mut defs: Vec<&TypeDefinition> =
            self.types.values().filter(|d| d.kind == kind).collect();
        defs.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        defs
    }

    pub fn list_all(&self) -> Vec<&TypeDefinition> {
        let mut defs: Vec<&TypeDefinition> = self.types.values().collect();
        defs.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        defs
    }

    pub fn count(&self) -> usize {
        self.types.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::commodity_trading(DEFAULT_NAMESPACE).unwrap()
    }

    fn commodity_fqn() -> FullyQualifiedName {
        FullyQualifiedName::new(DEFAULT_NAMESPACE, "Commodity").unwrap()
    }

    #[test]
    fn test_fqn_parse_and_display() {
        let fqn: FullyQualifiedName = "org.acme.bnatemplate.Commodity".parse().unwrap();
        assert_eq!(fqn.namespace(), "org.acme.bnatemplate");
        assert_eq!(fqn.name(), "Commodity");
        assert_eq!(fqn.to_string(), "org.acme.bnatemplate.Commodity");
    }

    #[test]
    fn test_fqn_rejects_malformed_names() {
        assert!("Commodity".parse::<FullyQualifiedName>().is_err());
        assert!("org..Commodity".parse::<FullyQualifiedName>().is_err());
        assert!("org.acme.".parse::<FullyQualifiedName>().is_err());
        assert!("org.acme.9Lives".parse::<FullyQualifiedName>().is_err());
    }

    #[test]
    fn test_fqn_serializes_as_string() {
        let fqn = commodity_fqn();
        let value = serde_json::to_value(&fqn).unwrap();
        assert_eq!(value, json!("org.acme.bnatemplate.Commodity"));

        let back: FullyQualifiedName = serde_json::from_value(value).unwrap();
        assert_eq!(back, fqn);
    }

    #[test]
    fn test_commodity_trading_model() {
        let registry = registry();
        assert_eq!(registry.count(), 3);
        assert_eq!(registry.by_kind(TypeKind::Participant).len(), 1);
        assert_eq!(registry.by_kind(TypeKind::Asset).len(), 1);
        assert_eq!(registry.by_kind(TypeKind::Transaction).len(), 1);

        let commodity = registry.require(&commodity_fqn()).unwrap();
        assert_eq!(commodity.identified_by.as_deref(), Some("tradingSymbol"));

        let targets: Vec<String> = commodity
            .relationships()
            .map(|(_, target)| target.to_string())
            .collect();
        assert_eq!(targets, vec!["org.acme.bnatemplate.Trader".to_string()]);
    }

    #[test]
    fn test_qualify_short_names() {
        let registry = registry();
        assert_eq!(
            registry.qualify("Trade").unwrap().to_string(),
            "org.acme.bnatemplate.Trade"
        );

        let err = registry.qualify("Swap").unwrap_err();
        assert!(matches!(err, LedgerError::UnknownType(_)));
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        assert!(SchemaRegistry::new("").is_err());
        assert!(SchemaRegistry::new("org.acme-corp").is_err());
        assert!(SchemaRegistry::new("org.acme").is_ok());
    }

    #[test]
    fn test_validate_commodity_instance() {
        let registry = registry();
        let def = registry.require(&commodity_fqn()).unwrap();

        let ok = json!({
            "tradingSymbol": "EMA",
            "description": "Corn",
            "mainExchange": "Euronext",
            "quantity": 100,
            "owner": "resource:org.acme.bnatemplate.Trader#dan@email.com"
        });
        assert!(def.validate(&ok).is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let registry = registry();
        let def = registry.require(&commodity_fqn()).unwrap();

        let bad = json!({
            "tradingSymbol": "",
            "mainExchange": "Euronext",
            "quantity": "lots",
            "owner": "resource:org.acme.bnatemplate.Commodity#EMA",
            "colour": "yellow"
        });

        let errors = def.validate(&bad).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"tradingSymbol"));
        assert!(fields.contains(&"description"));
        assert!(fields.contains(&"quantity"));
        assert!(fields.contains(&"owner"));
        assert!(fields.contains(&"colour"));
        assert!(errors.iter().all(|e| e.context == "Commodity"));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut registry = registry();
        let fqn = FullyQualifiedName::new(DEFAULT_NAMESPACE, "Exchange").unwrap();
        registry.register(
            TypeDefinition::new(fqn.clone(), TypeKind::Participant)
                .identified_by("code")
                .with_optional_field("city", FieldType::String),
        );

        let def = registry.require(&fqn).unwrap();
        assert!(def.validate(&json!({ "code": "ENX" })).is_ok());
        assert!(def.validate(&json!({ "code": "ENX", "city": null })).is_ok());
        assert!(def.validate(&json!({ "code": "ENX", "city": 7 })).is_err());
    }
}
