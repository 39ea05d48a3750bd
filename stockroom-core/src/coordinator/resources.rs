//! Backend resources and the operations each one supports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_write(self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// Backend resource type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Language,
    SalesStatus,
    UomDimension,
    Uom,
    ProductType,
    ProductGroup,
    ProductCategory,
    ProductMaster,
    Vendor,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Language,
        Resource::SalesStatus,
        Resource::UomDimension,
        Resource::Uom,
        Resource::ProductType,
        Resource::ProductGroup,
        Resource::ProductCategory,
        Resource::ProductMaster,
        Resource::Vendor,
    ];

    /// Collection path relative to the API base URL
    pub fn path(self) -> &'static str {
        match self {
            Resource::Language => "/languages",
            Resource::SalesStatus => "/sales-statuses",
            Resource::UomDimension => "/uom-dimensions",
            Resource::Uom => "/uoms",
            Resource::ProductType => "/product-types",
            Resource::ProductGroup => "/product-groups",
            Resource::ProductCategory => "/product-categories",
            Resource::ProductMaster => "/product-master-forms",
            Resource::Vendor => "/vendor-forms",
        }
    }

    /// Path of one entity
    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.path(), urlencoding::encode(id))
    }

    /// Whether the backend exposes `operation` for this resource
    pub fn supports(self, operation: Operation) -> bool {
        match operation {
            Operation::List => true,
            Operation::Get => matches!(self, Resource::ProductMaster | Resource::Vendor),
            Operation::Create | Operation::Update | Operation::Delete => matches!(
                self,
                Resource::ProductType
                    | Resource::ProductGroup
                    | Resource::ProductCategory
                    | Resource::ProductMaster
                    | Resource::Vendor
            ),
        }
    }

    /// Resources whose cached reads embed data of this one
    pub fn dependents(self) -> &'static [Resource] {
        match self {
            Resource::UomDimension => &[Resource::Uom],
            Resource::ProductType | Resource::ProductGroup | Resource::ProductCategory => {
                &[Resource::ProductMaster]
            }
            _ => &[],
        }
    }

    /// This resource followed by its dependents
    pub fn invalidation_set(self) -> Vec<Resource> {
        let mut set = vec![self];
        set.extend_from_slice(self.dependents());
        set
    }

    fn slug(self) -> &'static str {
        self.path().trim_start_matches('/')
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/').to_ascii_lowercase();
        Resource::ALL
            .into_iter()
            .find(|resource| {
                let slug = resource.slug();
                // Accept both the path slug and the entity name
                wanted == slug
                    || wanted == slug.trim_end_matches("-forms")
                    || format!("{}-forms", wanted) == slug
            })
            .ok_or_else(|| format!("unknown resource \"{}\"", s))
    }
}
