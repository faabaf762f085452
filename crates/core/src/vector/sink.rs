//! Output sinks for newly created features

use crate::error::{Error, Result};
use crate::vector::{Feature, FeatureCollection, LayerSchema};

/// Destination for features produced by an analysis.
///
/// `create` is called exactly once, before the first feature. A failure
/// there must be reported as [`Error::SinkCreation`] so callers can abort
/// before emitting anything.
pub trait FeatureSink {
    /// Prepare the destination for features of the given schema
    fn create(&mut self, schema: &LayerSchema) -> Result<()>;

    /// Append one feature
    fn add_feature(&mut self, feature: Feature) -> Result<()>;

    /// Flush and close the destination
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink collecting features into a [`FeatureCollection`]
#[derive(Debug, Default)]
pub struct MemorySink {
    collection: Option<FeatureCollection>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `create` has been called
    pub fn is_created(&self) -> bool {
        self.collection.is_some()
    }

    /// Features emitted so far
    pub fn features(&self) -> &[Feature] {
        self.collection
            .as_ref()
            .map(|c| c.features.as_slice())
            .unwrap_or(&[])
    }

    /// Take the collected layer; empty if the sink was never created
    pub fn into_collection(self) -> FeatureCollection {
        self.collection.unwrap_or_default()
    }
}

impl FeatureSink for MemorySink {
    fn create(&mut self, schema: &LayerSchema) -> Result<()> {
        self.collection = Some(FeatureCollection::with_schema(schema.clone()));
        Ok(())
    }

    fn add_feature(&mut self, feature: Feature) -> Result<()> {
        match self.collection.as_mut() {
            Some(collection) => {
                collection.push(feature);
                Ok(())
            }
            None => Err(Error::Other("feature added before sink was created".into())),
        }
    }
}
