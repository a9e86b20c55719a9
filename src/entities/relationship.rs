// 🔗 Relationship - by-identifier reference to another resource
//
// A relationship never loads its target. Resolving it is an explicit step
// that goes through the registry holding the target type.
//
// Serialized form: "resource:org.acme.bnatemplate.Trader#dan@email.com"

use super::Resource;
use crate::error::{LedgerError, Result};
use crate::schema::FullyQualifiedName;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

const URI_SCHEME: &str = "resource:";

/// Split a relationship URI into its target type and identifier
pub fn parse_relationship_uri(uri: &str) -> Result<(FullyQualifiedName, String)> {
    let invalid = || LedgerError::InvalidName(uri.to_string());

    let rest = uri.strip_prefix(URI_SCHEME).ok_or_else(invalid)?;
    let (fqn, id) = rest.split_once('#').ok_or_else(invalid)?;
    if id.is_empty() {
        return Err(invalid());
    }

    Ok((fqn.parse()?, id.to_string()))
}

pub struct Relationship<T> {
    fqn: FullyQualifiedName,
    id: String,
    _target: PhantomData<fn() -> T>,
}

impl<T: Resource> Relationship<T> {
    /// Reference a `T` in `namespace` by identifier
    pub fn new(namespace: &str, id: impl Into<String>) -> Result<Self> {
        Ok(Relationship {
            fqn: FullyQualifiedName::new(namespace, T::TYPE_NAME)?,
            id: id.into(),
            _target: PhantomData,
        })
    }

    /// Reference an existing resource
    pub fn to(namespace: &str, resource: &T) -> Result<Self> {
        Relationship::new(namespace, resource.identifier())
    }

    /// Parse a relationship URI, checking it targets `T`
    pub fn parse(uri: &str) -> Result<Self> {
        let (fqn, id) = parse_relationship_uri(uri)?;
        if fqn.name() != T::TYPE_NAME {
            return Err(LedgerError::InvalidName(format!(
                "{} is not a relationship to {}",
                uri,
                T::TYPE_NAME
            )));
        }

        Ok(Relationship {
            fqn,
            id,
            _target: PhantomData,
        })
    }
}

impl<T> Relationship<T> {
    pub fn fqn(&self) -> &FullyQualifiedName {
        &self.fqn
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn to_uri(&self) -> String {
        format!("{}{}#{}", URI_SCHEME, self.fqn, self.id)
    }
}

// Manual impls: PhantomData<fn() -> T> must not force bounds on T

impl<T> Clone for Relationship<T> {
    fn clone(&self) -> Self {
        Relationship {
            fqn: self.fqn.clone(),
            id: self.id.clone(),
            _target: PhantomData,
        }
    }
}

impl<T> PartialEq for Relationship<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fqn == other.fqn && self.id == other.id
    }
}

impl<T> Eq for Relationship<T> {}

impl<T> Hash for Relationship<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fqn.hash(state);
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Relationship<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Relationship").field(&self.to_uri()).finish()
    }
}

impl<T> fmt::Display for Relationship<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl<T> Serialize for Relationship<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_uri())
    }
}

impl<'de, T: Resource> Deserialize<'de> for Relationship<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Relationship::parse(&uri).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Commodity, Trader};
    use crate::schema::DEFAULT_NAMESPACE;

    #[test]
    fn test_relationship_uri() {
        let dan: Relationship<Trader> = Relationship::new(DEFAULT_NAMESPACE, "dan@email.com").unwrap();
        assert_eq!(
            dan.to_uri(),
            "resource:org.acme.bnatemplate.Trader#dan@email.com"
        );
        assert_eq!(dan.fqn().name(), "Trader");
        assert_eq!(dan.id(), "dan@email.com");
    }

    #[test]
    fn test_parse_relationship_uri() {
        let (fqn, id) =
            parse_relationship_uri("resource:org.acme.bnatemplate.Commodity#EMA").unwrap();
        assert_eq!(fqn.to_string(), "org.acme.bnatemplate.Commodity");
        assert_eq!(id, "EMA");

        assert!(parse_relationship_uri("org.acme.bnatemplate.Commodity#EMA").is_err());
        assert!(parse_relationship_uri("resource:org.acme.bnatemplate.Commodity").is_err());
        assert!(parse_relationship_uri("resource:org.acme.bnatemplate.Commodity#").is_err());
    }

    #[test]
    fn test_typed_parse_rejects_wrong_target() {
        let result = Relationship::<Trader>::parse("resource:org.acme.bnatemplate.Commodity#EMA");
        assert!(result.is_err());

        let ok = Relationship::<Commodity>::parse("resource:org.acme.bnatemplate.Commodity#EMA");
        assert_eq!(ok.unwrap().id(), "EMA");
    }

    #[test]
    fn test_relationship_serde() {
        let simon: Relationship<Trader> =
            Relationship::new(DEFAULT_NAMESPACE, "simon@email.com").unwrap();

        let json = serde_json::to_string(&simon).unwrap();
        assert_eq!(json, "\"resource:org.acme.bnatemplate.Trader#simon@email.com\"");

        let back: Relationship<Trader> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, simon);

        let wrong: std::result::Result<Relationship<Commodity>, _> = serde_json::from_str(&json);
        assert!(wrong.is_err());
    }
}
