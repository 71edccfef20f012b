//! Address and geometry vocabularies.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::tokens::TokenSet;
use crate::error::{AssayError, Result};
use crate::schema::AddressRole;

const REGION_TYPES: &[&str] = &["область", "обл", "край", "регион"];

const MUNICIPALITY_TYPES: &[&str] = &[
    "район",
    "р-н",
    "поселок",
    "посёлок",
    "пос",
    "поселок городского типа",
    "посёлок городского типа",
    "пгт",
    "село",
    "деревня",
    "город",
    "гор",
    "г",
];

const STREET_TYPES: &[&str] = &[
    "аллея",
    "ал",
    "бульвар",
    "бул",
    "дорога",
    "дор",
    "кольцевая",
    "набережная",
    "переулок",
    "пер",
    "площадь",
    "пл",
    "проезд",
    "проспект",
    "пр",
    "линия",
    "лин",
    "шоссе",
    "ш",
    "шоссейная",
    "улица",
    "ул",
];

const HOUSE_TYPES: &[&str] = &["дом", "д", "здание", "строение", "стр", "корпус", "корп", "к"];

const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "LineString",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiPolygon",
    "GeometryCollection",
    "CircularString",
    "CompoundCurve",
    "CurvePolygon",
    "MultiCurve",
    "MultiSurface",
    "Curve",
    "Surface",
    "PolyhedralSurface",
    "TIN",
    "Triangle",
];

static BUILTIN: Lazy<DictionaryCatalog> = Lazy::new(|| {
    DictionaryCatalog::from_lists(DictionaryLists {
        region_types: owned(REGION_TYPES),
        municipality_types: owned(MUNICIPALITY_TYPES),
        street_types: owned(STREET_TYPES),
        house_types: owned(HOUSE_TYPES),
        address_words: Vec::new(),
        geometry_types: owned(GEOMETRY_TYPES),
    })
});

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// On-disk dictionary document. Missing lists fall back to the built-in
/// vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryLists {
    #[serde(default = "default_region_types", alias = "regionTypes")]
    pub region_types: Vec<String>,
    #[serde(
        default = "default_municipality_types",
        alias = "municipalityTypes",
        alias = "municipalitetTypes"
    )]
    pub municipality_types: Vec<String>,
    #[serde(default = "default_street_types", alias = "streetTypes")]
    pub street_types: Vec<String>,
    #[serde(default = "default_house_types", alias = "houseTypes")]
    pub house_types: Vec<String>,
    /// Extra address words that are not type words of any role.
    #[serde(default, alias = "addressWords", alias = "dic")]
    pub address_words: Vec<String>,
    #[serde(default = "default_geometry_types", alias = "geometryTypes")]
    pub geometry_types: Vec<String>,
}

fn default_region_types() -> Vec<String> {
    owned(REGION_TYPES)
}

fn default_municipality_types() -> Vec<String> {
    owned(MUNICIPALITY_TYPES)
}

fn default_street_types() -> Vec<String> {
    owned(STREET_TYPES)
}

fn default_house_types() -> Vec<String> {
    owned(HOUSE_TYPES)
}

fn default_geometry_types() -> Vec<String> {
    owned(GEOMETRY_TYPES)
}

/// Immutable vocabularies used for address and geometry detection.
#[derive(Debug, Clone)]
pub struct DictionaryCatalog {
    region: TokenSet,
    municipality: TokenSet,
    street: TokenSet,
    house: TokenSet,
    address: TokenSet,
    geometry_types: Vec<String>,
    lists: DictionaryLists,
}

impl DictionaryCatalog {
    /// The built-in Russian address vocabulary and OGC shape names.
    pub fn builtin() -> &'static DictionaryCatalog {
        &BUILTIN
    }

    /// Load a dictionary document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| AssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lists: DictionaryLists = serde_json::from_reader(std::io::BufReader::new(file))?;
        if lists.geometry_types.iter().all(|t| t.trim().is_empty()) {
            return Err(AssayError::Config(format!(
                "dictionary '{}' has no geometry types",
                path.display()
            )));
        }
        Ok(Self::from_lists(lists))
    }

    pub fn from_lists(lists: DictionaryLists) -> Self {
        let address = TokenSet::new(
            lists
                .region_types
                .iter()
                .chain(&lists.municipality_types)
                .chain(&lists.street_types)
                .chain(&lists.house_types)
                .chain(&lists.address_words),
        );
        let mut geometry_types: Vec<String> = lists
            .geometry_types
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        // Longest names first so "MultiPolygon" wins over a shorter prefix.
        geometry_types.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            region: TokenSet::new(&lists.region_types),
            municipality: TokenSet::new(&lists.municipality_types),
            street: TokenSet::new(&lists.street_types),
            house: TokenSet::new(&lists.house_types),
            address,
            geometry_types,
            lists,
        }
    }

    /// The vocabulary this catalog was built from.
    pub fn lists(&self) -> &DictionaryLists {
        &self.lists
    }

    /// Type words of one address role.
    pub fn role_types(&self, role: AddressRole) -> &TokenSet {
        match role {
            AddressRole::Region => &self.region,
            AddressRole::Municipality => &self.municipality,
            AddressRole::Street => &self.street,
            AddressRole::House => &self.house,
        }
    }

    /// Every address word across all roles.
    pub fn address_tokens(&self) -> &TokenSet {
        &self.address
    }

    /// Recognized geometry type names, longest first.
    pub fn geometry_types(&self) -> &[String] {
        &self.geometry_types
    }

    /// The geometry type name `text` opens with, compared case-insensitively.
    pub fn geometry_type_prefix(&self, text: &str) -> Option<&str> {
        self.geometry_types
            .iter()
            .find(|name| {
                text.get(..name.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(name))
            })
            .map(|s| s.as_str())
    }

    /// Returns true if `name` is a recognized geometry type.
    pub fn is_geometry_type(&self, name: &str) -> bool {
        self.geometry_types.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

impl Default for DictionaryCatalog {
    fn default() -> Self {
        BUILTIN.clone()
    }
}
