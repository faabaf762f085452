//! Layer schemas: ordered attribute fields plus geometry type and CRS

use crate::crs::CRS;
use crate::vector::Feature;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Storage type of an attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
}

impl FieldKind {
    /// Widen two kinds into one that can hold both (Int + Float -> Float,
    /// anything else mixed -> String).
    fn widen(self, other: FieldKind) -> FieldKind {
        match (self, other) {
            (a, b) if a == b => a,
            (FieldKind::Int, FieldKind::Float) | (FieldKind::Float, FieldKind::Int) => {
                FieldKind::Float
            }
            _ => FieldKind::String,
        }
    }
}

/// A named, typed attribute column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Geometry type of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    /// Mixed or not yet known
    #[default]
    Unknown,
}

impl GeometryKind {
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryKind::Polygon
            }
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::Unknown,
        }
    }
}

/// Schema of a feature layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSchema {
    pub fields: Vec<Field>,
    pub geometry_kind: GeometryKind,
    pub crs: Option<CRS>,
}

impl LayerSchema {
    pub fn new(geometry_kind: GeometryKind, crs: Option<CRS>) -> Self {
        Self {
            fields: Vec::new(),
            geometry_kind,
            crs,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Make sure a field with this name and kind exists.
    ///
    /// An existing field keeps its position but takes the new kind.
    /// Returns `true` when the field was appended.
    pub fn ensure_field(&mut self, field: Field) -> bool {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => {
                existing.kind = field.kind;
                false
            }
            None => {
                self.fields.push(field);
                true
            }
        }
    }

    /// Derive a schema from feature attributes and geometries.
    ///
    /// Field order follows first appearance; names within one feature are
    /// taken in sorted order so the result is deterministic.
    pub fn infer(features: &[Feature]) -> Self {
        let mut schema = LayerSchema::default();
        let mut geometry_kind: Option<GeometryKind> = None;

        for feature in features {
            if let Some(geom) = &feature.geometry {
                let kind = GeometryKind::of(geom);
                geometry_kind = match geometry_kind {
                    None => Some(kind),
                    Some(k) if k == kind => Some(k),
                    Some(_) => Some(GeometryKind::Unknown),
                };
            }

            let mut names: Vec<&String> = feature.properties.keys().collect();
            names.sort();
            for name in names {
                let Some(kind) = feature.properties[name].kind() else {
                    continue;
                };
                match schema.fields.iter_mut().find(|f| &f.name == name) {
                    Some(field) => field.kind = field.kind.widen(kind),
                    None => schema.fields.push(Field::new(name.clone(), kind)),
                }
            }
        }

        schema.geometry_kind = geometry_kind.unwrap_or_default();
        schema
    }
}
