// ============================================================================
// Raster I/O: single-band TIFF load/save
// ============================================================================
//
// The editing core never touches files; this module converts between TIFF
// files and the plain `RasterData` the session loads and exports.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype, compression};

use crate::canvas::PixelBuffer;
use crate::error::EditError;

/// Raw raster as exchanged with the outside world: dimensions + row-major
/// `f64` samples (NaN = no data).
#[derive(Clone, Debug, PartialEq)]
pub struct RasterData {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
}

impl RasterData {
    pub fn new(width: u32, height: u32, values: Vec<f64>) -> Self {
        Self { width, height, values }
    }

    pub fn into_buffer(self) -> Result<PixelBuffer, EditError> {
        PixelBuffer::from_values(self.width, self.height, self.values)
    }
}

impl From<&PixelBuffer> for RasterData {
    fn from(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            values: buffer.values().to_vec(),
        }
    }
}

/// Error type for raster file operations
#[derive(Debug)]
pub enum RasterIoError {
    Io(std::io::Error),
    Tiff(String),
    Unsupported(String),
    InvalidData(String),
}

impl std::fmt::Display for RasterIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterIoError::Io(e) => write!(f, "I/O error: {}", e),
            RasterIoError::Tiff(e) => write!(f, "TIFF error: {}", e),
            RasterIoError::Unsupported(e) => write!(f, "Unsupported raster: {}", e),
            RasterIoError::InvalidData(e) => write!(f, "Invalid raster data: {}", e),
        }
    }
}

impl std::error::Error for RasterIoError {}

impl From<std::io::Error> for RasterIoError {
    fn from(e: std::io::Error) -> Self {
        RasterIoError::Io(e)
    }
}

impl From<tiff::TiffError> for RasterIoError {
    fn from(e: tiff::TiffError) -> Self {
        RasterIoError::Tiff(e.to_string())
    }
}

/// TIFF compression applied on export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TiffCompression {
    #[default]
    None,
    Lzw,
    Deflate,
}

impl TiffCompression {
    pub fn name(&self) -> &'static str {
        match self {
            TiffCompression::None => "none",
            TiffCompression::Lzw => "lzw",
            TiffCompression::Deflate => "deflate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "none" | "uncompressed" => Some(TiffCompression::None),
            "lzw" => Some(TiffCompression::Lzw),
            "deflate" | "zip" => Some(TiffCompression::Deflate),
            _ => None,
        }
    }
}

/// Sample type written on export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SampleFormat {
    #[default]
    Float32,
    Float64,
}

impl SampleFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Float32 => "float32",
            SampleFormat::Float64 => "float64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "float32" | "f32" => Some(SampleFormat::Float32),
            "float64" | "f64" => Some(SampleFormat::Float64),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TiffSaveOptions {
    pub compression: TiffCompression,
    pub sample_format: SampleFormat,
}

// ============================================================================
// Loading
// ============================================================================

/// Load the first image of a TIFF file as a single-band raster.
pub fn load_tiff(path: &Path) -> Result<RasterData, RasterIoError> {
    let file = File::open(path)?;
    decode_tiff(BufReader::new(file))
}

/// Decode the first image from any seekable reader. Integer and float sample
/// types are widened to `f64`; for multi-sample images only band 0 is kept.
pub fn decode_tiff<R: Read + Seek>(reader: R) -> Result<RasterData, RasterIoError> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let pixel_count = width as usize * height as usize;
    if pixel_count == 0 {
        return Err(RasterIoError::InvalidData(format!("empty image {}x{}", width, height)));
    }

    let samples: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    };

    if samples.len() < pixel_count || samples.len() % pixel_count != 0 {
        return Err(RasterIoError::InvalidData(format!(
            "{} samples do not tile a {}x{} image",
            samples.len(),
            width,
            height
        )));
    }

    let samples_per_pixel = samples.len() / pixel_count;
    let values = if samples_per_pixel == 1 {
        samples
    } else {
        crate::log_warn!(
            "TIFF has {} samples per pixel; keeping band 0 only",
            samples_per_pixel
        );
        samples.into_iter().step_by(samples_per_pixel).collect()
    };

    Ok(RasterData { width, height, values })
}

// ============================================================================
// Saving
// ============================================================================

/// Write `raster` to `path` as a single-band float TIFF.
pub fn save_tiff(raster: &RasterData, path: &Path, options: TiffSaveOptions) -> Result<(), RasterIoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_tiff(&mut writer, raster, options)?;
    writer.flush()?;
    Ok(())
}

/// Encode `raster` into any seekable writer.
pub fn encode_tiff<W: Write + Seek>(writer: W, raster: &RasterData, options: TiffSaveOptions) -> Result<(), RasterIoError> {
    let expected = raster.width as usize * raster.height as usize;
    if raster.values.len() != expected || expected == 0 {
        return Err(RasterIoError::InvalidData(format!(
            "{} samples for a {}x{} raster",
            raster.values.len(),
            raster.width,
            raster.height
        )));
    }

    let (w, h) = (raster.width, raster.height);
    let mut tiff_enc = TiffEncoder::new(writer)?;
    match options.sample_format {
        SampleFormat::Float32 => {
            let data: Vec<f32> = raster.values.iter().map(|&v| v as f32).collect();
            match options.compression {
                TiffCompression::None => tiff_enc.write_image::<colortype::Gray32Float>(w, h, &data)?,
                TiffCompression::Lzw => tiff_enc
                    .write_image_with_compression::<colortype::Gray32Float, _>(w, h, compression::Lzw, &data)?,
                TiffCompression::Deflate => tiff_enc.write_image_with_compression::<colortype::Gray32Float, _>(
                    w,
                    h,
                    compression::Deflate::default(),
                    &data,
                )?,
            }
        }
        SampleFormat::Float64 => {
            let data = &raster.values;
            match options.compression {
                TiffCompression::None => tiff_enc.write_image::<colortype::Gray64Float>(w, h, data)?,
                TiffCompression::Lzw => tiff_enc
                    .write_image_with_compression::<colortype::Gray64Float, _>(w, h, compression::Lzw, data)?,
                TiffCompression::Deflate => tiff_enc.write_image_with_compression::<colortype::Gray64Float, _>(
                    w,
                    h,
                    compression::Deflate::default(),
                    data,
                )?,
            }
        }
    }
    Ok(())
}

/// Save a rendered preview (PNG inferred from the extension).
pub fn save_preview(image: &image::RgbaImage, path: &Path) -> Result<(), RasterIoError> {
    image
        .save(path)
        .map_err(|e| RasterIoError::Unsupported(format!("could not write preview '{}': {}", path.display(), e)))
}
