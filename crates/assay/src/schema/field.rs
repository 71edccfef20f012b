//! Field descriptors as supplied by the metadata store.

use serde::{Deserialize, Deserializer, Serialize};

use super::types::{AddressRole, FieldType};

/// Description of one dataset field. Read-only to the profiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether the store maintains an index over this field.
    #[serde(default)]
    pub indexed: bool,
    /// Address role tag, when the store has one.
    #[serde(
        default,
        alias = "feature",
        deserialize_with = "deserialize_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<AddressRole>,
}

impl FieldDescriptor {
    /// Create a descriptor with no index and no address role.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexed: false,
            role: None,
        }
    }

    /// Mark the field as indexed.
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Tag the field with an address role.
    pub fn with_role(mut self, role: AddressRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Feature tags outside the address vocabulary are not an error; they
/// simply carry no role.
fn deserialize_role<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AddressRole>, D::Error> {
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(tag.as_deref().and_then(AddressRole::from_tag))
}
