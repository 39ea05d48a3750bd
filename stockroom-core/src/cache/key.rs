//! Cache keys

use crate::coordinator::Resource;
use std::fmt;

/// Query parameter scoping UOM reads to one dimension
pub const UOM_DIMENSION_PARAM: &str = "uomDimensionId";

/// Which slice of a resource a read covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// The full list
    All,
    /// One entity by id
    Id(String),
    /// A list filtered by one query parameter
    Filter { param: String, value: String },
}

/// Identity of a cached read: `(resource, scope)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub resource: Resource,
    pub scope: Scope,
}

impl QueryKey {
    pub fn new(resource: Resource, scope: Scope) -> Self {
        Self { resource, scope }
    }

    pub fn list(resource: Resource) -> Self {
        Self::new(resource, Scope::All)
    }

    pub fn by_id(resource: Resource, id: impl ToString) -> Self {
        Self::new(resource, Scope::Id(id.to_string()))
    }

    pub fn filtered(resource: Resource, param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(resource, Scope::Filter { param: param.into(), value: value.into() })
    }

    /// UOMs belonging to one dimension
    pub fn uoms_by_dimension(dimension_id: impl ToString) -> Self {
        Self::filtered(Resource::Uom, UOM_DIMENSION_PARAM, dimension_id.to_string())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::All => write!(f, "{}", self.resource),
            Scope::Id(id) => write!(f, "{}/{}", self.resource, id),
            Scope::Filter { param, value } => write!(f, "{}?{}={}", self.resource, param, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(QueryKey::list(Resource::ProductType).to_string(), "product-types");
        assert_eq!(QueryKey::by_id(Resource::Vendor, 7).to_string(), "vendor-forms/7");
        assert_eq!(QueryKey::uoms_by_dimension(3).to_string(), "uoms?uomDimensionId=3");
    }

    #[test]
    fn test_keys_differ_by_scope() {
        assert_ne!(QueryKey::uoms_by_dimension(1), QueryKey::uoms_by_dimension(2));
        assert_ne!(QueryKey::list(Resource::Vendor), QueryKey::by_id(Resource::Vendor, 1));
    }
}
