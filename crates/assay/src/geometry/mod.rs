//! Geometry parsing, structural validity and territorial extent.

mod extent;
mod parse;

pub use extent::{BBox, Extent};
pub use parse::{
    check_structure, parse_geojson, parse_value, parse_wkt, strip_srid, GeometryError,
};
