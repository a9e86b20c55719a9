// Entity Models
// Identity persists, values change
//
// Each entity has:
// - A stable identifier that NEVER changes
// - Values that transactions may update
// - A registry keyed by its fully qualified type name

pub mod commodity;
pub mod relationship;
pub mod trader;

pub use commodity::Commodity;
pub use relationship::{parse_relationship_uri, Relationship};
pub use trader::Trader;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A participant or asset stored in a registry
pub trait Resource: Clone + Serialize + DeserializeOwned {
    /// Short type name; the network namespace qualifies it
    const TYPE_NAME: &'static str;

    fn identifier(&self) -> &str;
}
