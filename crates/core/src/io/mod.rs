//! I/O for the formats the command-line front end consumes and produces
//!
//! - GeoTIFF (single band) for classified land-cover rasters and change maps
//! - GeoJSON feature collections for cooperatives, roads, markets and results

mod geojson;
mod native;

pub use geojson::{
    feature_collection_from_str, feature_collection_to_string, read_geojson, write_geojson,
    GeoJsonFileSink,
};
pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    GeoTiffOptions, SampleType,
};
