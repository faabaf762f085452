//! GeoJSON feature collection I/O
//!
//! Parses through `serde_json::Value`; only the geometry types the
//! accessibility workflow uses are supported. The legacy named `crs` member
//! is honoured on read and written when the layer has an EPSG code.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection, FeatureSink, LayerSchema};
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Parse a GeoJSON FeatureCollection
pub fn feature_collection_from_str(text: &str) -> Result<FeatureCollection> {
    let root: Value = serde_json::from_str(text)?;
    if root.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(Error::Other("GeoJSON root is not a FeatureCollection".into()));
    }

    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Other("FeatureCollection has no features array".into()))?
        .iter()
        .enumerate()
        .map(|(i, f)| parse_feature(f).map_err(|e| Error::Other(format!("feature {}: {}", i, e))))
        .collect::<Result<Vec<_>>>()?;

    let mut collection = FeatureCollection::from_features(features);
    collection.schema.crs = root
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .and_then(CRS::parse);
    Ok(collection)
}

/// Read a GeoJSON FeatureCollection from disk
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    feature_collection_from_str(&text)
}

/// Serialize a FeatureCollection to GeoJSON text
pub fn feature_collection_to_string(collection: &FeatureCollection) -> Result<String> {
    let mut root = header(&collection.schema);
    root.insert(
        "features".into(),
        Value::Array(collection.iter().map(feature_to_json).collect()),
    );
    Ok(serde_json::to_string(&Value::Object(root))?)
}

/// Write a FeatureCollection as GeoJSON
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let text = feature_collection_to_string(collection)?;
    std::fs::write(path.as_ref(), text)?;
    Ok(())
}

/// Streaming GeoJSON sink: the file is created in `create`, each feature is
/// written as it arrives and `finish` closes the array.
#[derive(Debug)]
pub struct GeoJsonFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl GeoJsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            written: 0,
        }
    }

    /// Number of features written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl FeatureSink for GeoJsonFileSink {
    fn create(&mut self, schema: &LayerSchema) -> Result<()> {
        let file = File::create(&self.path)
            .map_err(|e| Error::SinkCreation(format!("{}: {}", self.path.display(), e)))?;
        let mut writer = BufWriter::new(file);

        // Header object minus its closing brace, then the open features array
        let head = serde_json::to_string(&Value::Object(header(schema)))?;
        let head = head.strip_suffix('}').unwrap_or(&head);
        let separator = if head.ends_with('{') { "" } else { "," };
        write!(writer, "{}{}\"features\":[", head, separator)?;

        self.writer = Some(writer);
        self.written = 0;
        Ok(())
    }

    fn add_feature(&mut self, feature: Feature) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::Other("feature added before sink was created".into()))?;
        if self.written > 0 {
            writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut *writer, &feature_to_json(&feature))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.write_all(b"]}")?;
            writer.flush()?;
        }
        Ok(())
    }
}

fn header(schema: &LayerSchema) -> Map<String, Value> {
    let mut root = Map::new();
    root.insert("type".into(), Value::from("FeatureCollection"));
    if let Some(code) = schema.crs.as_ref().and_then(|c| c.epsg()) {
        root.insert(
            "crs".into(),
            json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
            }),
        );
    }
    root
}

fn parse_feature(value: &Value) -> Result<Feature> {
    if value.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(Error::Other("object is not a Feature".into()));
    }

    let mut feature = match value.get("geometry") {
        None | Some(Value::Null) => Feature::empty(),
        Some(g) => Feature::new(parse_geometry(g)?),
    };

    feature.id = match value.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if let Some(props) = value.get("properties").and_then(Value::as_object) {
        for (key, v) in props {
            feature.set_property(key.clone(), attribute_from_json(v));
        }
    }

    Ok(feature)
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::from(*i),
        // Non-finite floats have no JSON representation
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn feature_to_json(feature: &Feature) -> Value {
    let properties: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect();

    let mut obj = Map::new();
    obj.insert("type".into(), Value::from("Feature"));
    if let Some(id) = &feature.id {
        obj.insert("id".into(), Value::from(id.as_str()));
    }
    obj.insert(
        "geometry".into(),
        feature.geometry.as_ref().map(geometry_to_json).unwrap_or(Value::Null),
    );
    obj.insert("properties".into(), Value::Object(properties));
    Value::Object(obj)
}

// ─── Geometry conversion ───────────────────────────────────────────────

fn coord(value: &Value) -> Result<Coord<f64>> {
    let arr = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| Error::Other("position must have at least two numbers".into()))?;
    match (arr[0].as_f64(), arr[1].as_f64()) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(Error::Other("position contains a non-number".into())),
    }
}

fn coords(value: &Value) -> Result<Vec<Coord<f64>>> {
    value
        .as_array()
        .ok_or_else(|| Error::Other("expected an array of positions".into()))?
        .iter()
        .map(coord)
        .collect()
}

fn nested<T>(value: &Value, f: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| Error::Other("expected a nested coordinate array".into()))?
        .iter()
        .map(f)
        .collect()
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = nested(value, |r| coords(r).map(LineString::from))?;
    if rings.is_empty() {
        return Err(Error::Other("polygon without rings".into()));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Other("geometry without type".into()))?;
    let c = value.get("coordinates").unwrap_or(&Value::Null);

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(coord(c)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::from(
            coords(c)?.into_iter().map(Point::from).collect::<Vec<_>>(),
        )),
        "LineString" => Geometry::LineString(LineString::from(coords(c)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(nested(c, |l| {
            coords(l).map(LineString::from)
        })?)),
        "Polygon" => Geometry::Polygon(polygon(c)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(nested(c, polygon)?)),
        other => return Err(Error::UnsupportedGeometry(other.to_string())),
    };
    Ok(geometry)
}

fn position(c: &Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn line_positions(ls: &LineString<f64>) -> Value {
    Value::Array(ls.coords().map(position).collect())
}

fn polygon_positions(p: &Polygon<f64>) -> Value {
    let mut rings = vec![line_positions(p.exterior())];
    rings.extend(p.interiors().iter().map(line_positions));
    Value::Array(rings)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(&p.0)).collect::<Vec<_>>()
        }),
        Geometry::Line(l) => json!({
            "type": "LineString",
            "coordinates": [position(&l.start), position(&l.end)]
        }),
        Geometry::LineString(ls) => {
            json!({ "type": "LineString", "coordinates": line_positions(ls) })
        }
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(line_positions).collect::<Vec<_>>()
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_positions(p) }),
        Geometry::Rect(r) => {
            json!({ "type": "Polygon", "coordinates": polygon_positions(&r.to_polygon()) })
        }
        Geometry::Triangle(t) => {
            json!({ "type": "Polygon", "coordinates": polygon_positions(&t.to_polygon()) })
        }
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_positions).collect::<Vec<_>>()
        }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_json).collect::<Vec<_>>()
        }),
    }
}
