//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for single-band TIFF I/O with the minimal set of
//! GeoTIFF tags (pixel scale, tiepoint, key directory, GDAL nodata).

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKindStandard};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GDAL_NODATA_TAG: u16 = 42113;

/// Sample type written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleType {
    /// 32-bit float samples
    #[default]
    Float32,
    /// 8-bit unsigned samples, for class and change maps
    UInt8,
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub sample_type: SampleType,
}

impl GeoTiffOptions {
    pub fn uint8() -> Self {
        Self {
            sample_type: SampleType::UInt8,
        }
    }
}

/// Read the first band of a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-band (chunky) files carry more samples than cells
    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single band of {} samples, found {}",
            rows * cols,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA_TAG))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .and_then(num_traits::cast::<f64, T>);
    raster.set_nodata(nodata);
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    Ok(raster)
}

/// EPSG code from ProjectedCSTypeGeoKey (3072) or GeographicTypeGeoKey (2048)
fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder
        .get_tag_u16_vec(Tag::Unknown(GEO_KEY_DIRECTORY_TAG))
        .ok()?;
    // Header is 4 shorts, then entries of (key, location, count, value)
    keys.get(4..)?
        .chunks_exact(4)
        .find(|entry| (entry[0] == 3072 || entry[0] == 2048) && entry[1] == 0)
        .map(|entry| u32::from(entry[3]))
        .filter(|&code| code != 0 && code != 32767)
}

/// Read the geotransform from ModelPixelScale + ModelTiepoint tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE_TAG))
        .ok()?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT_TAG))
        .ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file, options.unwrap_or_default())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let (width, height) = (cols as u32, rows as u32);
    let image_err = |e: tiff::TiffError| Error::Other(format!("Cannot write TIFF image: {}", e));

    match options.sample_type {
        SampleType::Float32 => {
            let data: Vec<f32> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
                .collect();
            let mut image = encoder
                .new_image::<Gray32Float>(width, height)
                .map_err(image_err)?;
            write_geo_tags(image.encoder(), raster)?;
            image.write_data(&data).map_err(image_err)?;
        }
        SampleType::UInt8 => {
            let data: Vec<u8> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(u8::MAX))
                .collect();
            let mut image = encoder.new_image::<Gray8>(width, height).map_err(image_err)?;
            write_geo_tags(image.encoder(), raster)?;
            image.write_data(&data).map_err(image_err)?;
        }
    }

    Ok(())
}

fn write_geo_tags<W, T>(
    dir: &mut DirectoryEncoder<'_, W, TiffKindStandard>,
    raster: &Raster<T>,
) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
    T: RasterElement,
{
    let gt = raster.transform();
    let tag_err = |e: tiff::TiffError| Error::Other(format!("Cannot write GeoTIFF tag: {}", e));

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), &scale[..])
        .map_err(tag_err)?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT_TAG), &tiepoint[..])
        .map_err(tag_err)?;

    // GTModelTypeGeoKey, GTRasterTypeGeoKey = PixelIsArea, then the
    // geographic (2048) or projected (3072) CS key when the EPSG code is known
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    if let Some(code) = raster.crs().and_then(|c| c.epsg()).and_then(|c| u16::try_from(c).ok()) {
        let geographic = (4000..5000).contains(&code);
        geokeys[3] = 3;
        geokeys[7] = if geographic { 2 } else { 1 };
        let key = if geographic { 2048 } else { 3072 };
        geokeys.extend_from_slice(&[key, 0, 1, code]);
    }
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY_TAG), &geokeys[..])
        .map_err(tag_err)?;

    if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = nd.to_string();
        dir.write_tag(Tag::Unknown(GDAL_NODATA_TAG), text.as_str())
            .map_err(tag_err)?;
    }

    Ok(())
}
