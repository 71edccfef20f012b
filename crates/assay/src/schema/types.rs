//! Core type definitions for field descriptors.

use serde::{Deserialize, Deserializer, Serialize};

/// Declared semantic type of a field, as recorded by the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    String,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Dates and timestamps.
    Date,
    /// Structured geometry (GeoJSON document or WKT).
    Geometry,
    /// Type not recorded or not recognized.
    Unknown,
}

impl FieldType {
    /// Map a metadata-store type name onto a field type.
    ///
    /// Store type names are matched case-insensitively; anything unrecognized
    /// becomes [`FieldType::Unknown`].
    pub fn from_store_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "string" | "str" | "text" => FieldType::String,
            "int" | "int32" | "int64" | "long" | "integer" => FieldType::Integer,
            "double" | "float" | "decimal" | "number" => FieldType::Float,
            "date" | "datetime" | "timestamp" => FieldType::Date,
            "geometry" | "geojson" | "wkt" => FieldType::Geometry,
            _ => FieldType::Unknown,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Geometry => "geometry",
            FieldType::Unknown => "unknown",
        }
    }

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Unknown
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::from_store_name(&name))
    }
}

/// Role a field plays in a structured address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressRole {
    /// Region / oblast / krai.
    #[serde(alias = "Region")]
    Region,
    /// District, town or settlement.
    #[serde(alias = "Municipalitet")]
    Municipality,
    /// Street name.
    #[serde(alias = "Street")]
    Street,
    /// House number and building parts.
    #[serde(alias = "HouseNumber")]
    House,
}

impl AddressRole {
    /// All roles in address order.
    pub const ALL: [AddressRole; 4] = [
        AddressRole::Region,
        AddressRole::Municipality,
        AddressRole::Street,
        AddressRole::House,
    ];

    /// Parse a metadata-store feature tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "region" => Some(AddressRole::Region),
            "municipality" | "municipalitet" => Some(AddressRole::Municipality),
            "street" => Some(AddressRole::Street),
            "house" | "housenumber" | "house_number" => Some(AddressRole::House),
            _ => None,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AddressRole::Region => "Region",
            AddressRole::Municipality => "Municipality",
            AddressRole::Street => "Street",
            AddressRole::House => "House",
        }
    }
}
