//! WKT, EWKT and GeoJSON parsing into `geo_types`.

use std::str::FromStr;

use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::Value;
use thiserror::Error;

use crate::input::RawValue;

/// Why a value is not a usable geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("WKT parse error: {0}")]
    Wkt(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("malformed geometry: {0}")]
    Malformed(&'static str),
}

type Result<T> = std::result::Result<T, GeometryError>;

/// Drop an EWKT `SRID=<n>;` prefix.
pub fn strip_srid(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.get(..5) {
        Some(head) if head.eq_ignore_ascii_case("srid=") => trimmed
            .find(';')
            .map(|i| &trimmed[i + 1..])
            .unwrap_or(trimmed),
        _ => trimmed,
    }
}

/// Parse WKT or EWKT text.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::from_str(strip_srid(text).trim())
        .map_err(|e| GeometryError::Wkt(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| GeometryError::Wkt(format!("{:?}", e)))
        })
}

/// Parse a GeoJSON geometry or Feature.
pub fn parse_geojson(value: &Value) -> Result<Geometry<f64>> {
    let object = value
        .as_object()
        .ok_or(GeometryError::GeoJson("expected an object".to_string()))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GeometryError::GeoJson("missing 'type'".to_string()))?;

    let coordinates = || {
        object
            .get("coordinates")
            .ok_or(GeometryError::GeoJson(format!("{} without coordinates", kind)))
    };

    Ok(match kind {
        "Feature" => {
            let geometry = object
                .get("geometry")
                .filter(|g| !g.is_null())
                .ok_or(GeometryError::GeoJson("feature without geometry".to_string()))?;
            return parse_geojson(geometry);
        }
        "Point" => Geometry::Point(Point::from(position(coordinates()?)?)),
        "LineString" => Geometry::LineString(line_string(coordinates()?)?),
        "Polygon" => Geometry::Polygon(polygon(coordinates()?)?),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            array(coordinates()?)?
                .iter()
                .map(|p| position(p).map(Point::from))
                .collect::<Result<_>>()?,
        )),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            array(coordinates()?)?
                .iter()
                .map(line_string)
                .collect::<Result<_>>()?,
        )),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            array(coordinates()?)?
                .iter()
                .map(polygon)
                .collect::<Result<_>>()?,
        )),
        "GeometryCollection" => {
            let members = object
                .get("geometries")
                .ok_or(GeometryError::GeoJson("collection without geometries".to_string()))?;
            Geometry::GeometryCollection(GeometryCollection(
                array(members)?
                    .iter()
                    .map(parse_geojson)
                    .collect::<Result<_>>()?,
            ))
        }
        other => return Err(GeometryError::GeoJson(format!("unsupported type '{}'", other))),
    })
}

fn array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or(GeometryError::GeoJson("expected an array".to_string()))
}

fn position(value: &Value) -> Result<Coord<f64>> {
    let parts = array(value)?;
    if parts.len() < 2 {
        return Err(GeometryError::GeoJson("position needs two numbers".to_string()));
    }
    let number = |v: &Value| {
        v.as_f64()
            .ok_or(GeometryError::GeoJson("position member is not a number".to_string()))
    };
    Ok(Coord {
        x: number(&parts[0])?,
        y: number(&parts[1])?,
    })
}

fn line_string(value: &Value) -> Result<LineString<f64>> {
    Ok(LineString::new(
        array(value)?.iter().map(position).collect::<Result<_>>()?,
    ))
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(line_string);
    let exterior = rings
        .next()
        .ok_or(GeometryError::GeoJson("polygon without rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Check structural validity: finite coordinates, line strings with at
/// least two positions, rings with at least four positions, non-empty
/// multi geometries.
///
/// Polygon rings are closed when the polygon is constructed, so an open
/// ring of three distinct positions is accepted.
pub fn check_structure(geometry: &Geometry<f64>) -> Result<()> {
    match geometry {
        Geometry::Point(p) => finite(&p.0),
        Geometry::Line(l) => finite(&l.start).and(finite(&l.end)),
        Geometry::LineString(ls) => path(ls),
        Geometry::Polygon(p) => area(p),
        Geometry::MultiPoint(mp) => non_empty(mp.0.len())
            .and_then(|()| mp.0.iter().try_for_each(|p| finite(&p.0))),
        Geometry::MultiLineString(mls) => {
            non_empty(mls.0.len()).and_then(|()| mls.0.iter().try_for_each(path))
        }
        Geometry::MultiPolygon(mp) => {
            non_empty(mp.0.len()).and_then(|()| mp.0.iter().try_for_each(area))
        }
        Geometry::GeometryCollection(gc) => {
            non_empty(gc.0.len()).and_then(|()| gc.0.iter().try_for_each(check_structure))
        }
        Geometry::Rect(r) => finite(&r.min()).and(finite(&r.max())),
        Geometry::Triangle(t) => t.to_array().iter().try_for_each(finite),
    }
}

fn finite(coord: &Coord<f64>) -> Result<()> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::Malformed("non-finite coordinate"))
    }
}

fn non_empty(len: usize) -> Result<()> {
    if len == 0 {
        Err(GeometryError::Malformed("empty geometry"))
    } else {
        Ok(())
    }
}

fn path(ls: &LineString<f64>) -> Result<()> {
    if ls.0.len() < 2 {
        return Err(GeometryError::Malformed("line string needs two positions"));
    }
    ls.0.iter().try_for_each(finite)
}

fn ring(ls: &LineString<f64>) -> Result<()> {
    if ls.0.len() < 4 || !ls.is_closed() {
        return Err(GeometryError::Malformed("ring needs four positions and closure"));
    }
    ls.0.iter().try_for_each(finite)
}

fn area(p: &Polygon<f64>) -> Result<()> {
    ring(p.exterior())?;
    p.interiors().iter().try_for_each(ring)
}

/// Interpret a stored value as a structurally valid geometry.
///
/// Text is tried as GeoJSON when it opens with `{`, otherwise as WKT/EWKT.
/// Never panics; anything unparseable yields an error.
pub fn parse_value(value: &RawValue) -> Result<Geometry<f64>> {
    let geometry = match value {
        RawValue::Document(doc) => parse_geojson(doc)?,
        RawValue::Text(text) if text.trim_start().starts_with('{') => {
            let doc: Value = serde_json::from_str(text)
                .map_err(|e| GeometryError::GeoJson(e.to_string()))?;
            parse_geojson(&doc)?
        }
        RawValue::Text(text) => parse_wkt(text)?,
        _ => return Err(GeometryError::Malformed("not a geometry value")),
    };
    check_structure(&geometry)?;
    Ok(geometry)
}
