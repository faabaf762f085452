//! Vector features, layer schemas and output sinks

mod schema;
mod sink;

pub use schema::{Field, FieldKind, GeometryKind, LayerSchema};
pub use sink::{FeatureSink, MemorySink};

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The schema field kind this value would be stored as
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(_) => Some(FieldKind::Bool),
            AttributeValue::Int(_) => Some(FieldKind::Int),
            AttributeValue::Float(_) => Some(FieldKind::Float),
            AttributeValue::String(_) => Some(FieldKind::String),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style id setter
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute, overwriting any previous value
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Collection of features sharing a schema
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub schema: LayerSchema,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: LayerSchema) -> Self {
        Self {
            schema,
            features: Vec::new(),
        }
    }

    /// Build a collection and derive its schema from the features.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut collection = Self {
            schema: LayerSchema::default(),
            features,
        };
        collection.schema = LayerSchema::infer(&collection.features);
        collection
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    #[test]
    fn test_set_property_overwrites() {
        let mut f = Feature::new(Geometry::Point(Point::new(1.0, 2.0)))
            .with_property("score", AttributeValue::Float(10.0));
        f.set_property("score", AttributeValue::Float(20.0));

        assert_eq!(f.properties.len(), 1);
        assert_eq!(f.get_property("score").and_then(|v| v.as_f64()), Some(20.0));
    }

    #[test]
    fn test_from_features_infers_schema() {
        let features = vec![
            Feature::new(Geometry::Point(Point::new(0.0, 0.0)))
                .with_property("name", AttributeValue::String("Kibera".into())),
            Feature::new(Geometry::Point(Point::new(1.0, 1.0)))
                .with_property("members", AttributeValue::Int(40)),
        ];
        let fc = FeatureCollection::from_features(features);

        assert_eq!(fc.len(), 2);
        assert_eq!(fc.schema.geometry_kind, GeometryKind::Point);
        assert!(fc.schema.has_field("name"));
        assert!(fc.schema.has_field("members"));
    }
}
