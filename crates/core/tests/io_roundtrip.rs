//! File-based I/O tests for GeoJSON layers and GeoTIFF rasters.

use coopaccess_core::io::{read_geojson, read_geotiff, write_geojson, write_geotiff, GeoTiffOptions};
use coopaccess_core::{AttributeValue, Feature, FeatureCollection, GeoTransform, Raster, CRS};
use geo_types::{Geometry, LineString, Point};

#[test]
fn geojson_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roads.geojson");

    let mut layer = FeatureCollection::from_features(vec![
        Feature::new(Geometry::LineString(LineString::from(vec![(0.0, 0.0), (250.0, 40.0)])))
            .with_id("R1")
            .with_property("surface", AttributeValue::String("paved".into())),
        Feature::new(Geometry::Point(Point::new(12.5, -3.0)))
            .with_property("lanes", AttributeValue::Int(2)),
    ]);
    layer.schema.crs = Some(CRS::from_epsg(32737));

    write_geojson(&layer, &path).unwrap();
    let back = read_geojson(&path).unwrap();

    assert_eq!(back.len(), 2);
    assert_eq!(back.features[0].id.as_deref(), Some("R1"));
    assert_eq!(back.features[0].geometry, layer.features[0].geometry);
    assert_eq!(back.features[1].get_property("lanes"), Some(&AttributeValue::Int(2)));
    assert_eq!(back.schema.crs.and_then(|c| c.epsg()), Some(32737));
}

#[test]
fn geotiff_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landcover_2020.tif");

    let mut raster = Raster::from_vec(vec![1u8, 2, 2, 3, 3, 3, 4, 4, 5], 3, 3).unwrap();
    raster.set_transform(GeoTransform::new(36.5, -1.0, 0.00025, -0.00025));
    raster.set_crs(Some(CRS::wgs84()));

    write_geotiff(&raster, &path, Some(GeoTiffOptions::uint8())).unwrap();
    let back: Raster<u8> = read_geotiff(&path).unwrap();

    assert_eq!(back.data(), raster.data());
    assert!(back.transform().approx_eq(raster.transform(), 1e-12));
    assert!(back.check_same_grid(&raster).is_ok());
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_geojson(dir.path().join("nope.geojson")).is_err());
    assert!(read_geotiff::<f64, _>(dir.path().join("nope.tif")).is_err());
}
