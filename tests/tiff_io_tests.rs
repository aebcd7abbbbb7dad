//! Tests for TIFF encode / decode through in-memory buffers

use std::io::Cursor;

use tiff::encoder::{TiffEncoder, colortype};
use tiffedit::io::{RasterData, RasterIoError, SampleFormat, TiffCompression, TiffSaveOptions, decode_tiff, encode_tiff};

fn sample_raster() -> RasterData {
    RasterData::new(3, 2, vec![0.5, f64::NAN, -2.25, 1000.0, 0.0, 7.125])
}

fn encode(raster: &RasterData, options: TiffSaveOptions) -> Cursor<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode_tiff(&mut cursor, raster, options).unwrap();
    cursor.set_position(0);
    cursor
}

fn assert_same_samples(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!(x == y || (x.is_nan() && y.is_nan()), "sample {}: {} != {}", i, x, y);
    }
}

#[test]
fn test_float32_preserves_nan_and_dimensions() {
    let raster = sample_raster();
    let decoded = decode_tiff(encode(&raster, TiffSaveOptions::default())).unwrap();
    assert_eq!((decoded.width, decoded.height), (3, 2));
    assert_same_samples(&decoded.values, &raster.values);
}

#[test]
fn test_float64_keeps_full_precision() {
    let raster = RasterData::new(2, 1, vec![0.1, 1.0 / 3.0]);
    let options = TiffSaveOptions {
        compression: TiffCompression::Lzw,
        sample_format: SampleFormat::Float64,
    };
    let decoded = decode_tiff(encode(&raster, options)).unwrap();
    assert_eq!(decoded.values, raster.values);
}

#[test]
fn test_compressed_float32_decodes() {
    let raster = sample_raster();
    for compression in [TiffCompression::Lzw, TiffCompression::Deflate] {
        let options = TiffSaveOptions { compression, sample_format: SampleFormat::Float32 };
        let decoded = decode_tiff(encode(&raster, options)).unwrap();
        assert_same_samples(&decoded.values, &raster.values);
    }
}

#[test]
fn test_integer_tiffs_are_widened() {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
        encoder.write_image::<colortype::Gray16>(2, 2, &[0u16, 1, 65535, 300]).unwrap();
    }
    cursor.set_position(0);

    let decoded = decode_tiff(cursor).unwrap();
    assert_eq!(decoded.values, vec![0.0, 1.0, 65535.0, 300.0]);
}

#[test]
fn test_multi_band_keeps_first_band() {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
        let rgb = [10u8, 20, 30, 40, 50, 60];
        encoder.write_image::<colortype::RGB8>(2, 1, &rgb).unwrap();
    }
    cursor.set_position(0);

    let decoded = decode_tiff(cursor).unwrap();
    assert_eq!(decoded.values, vec![10.0, 40.0]);
}

#[test]
fn test_encode_rejects_inconsistent_raster() {
    let raster = RasterData::new(3, 3, vec![0.0; 5]);
    let mut cursor = Cursor::new(Vec::new());
    let result = encode_tiff(&mut cursor, &raster, TiffSaveOptions::default());
    assert!(matches!(result, Err(RasterIoError::InvalidData(_))));
}

#[test]
fn test_decode_rejects_garbage() {
    let result = decode_tiff(Cursor::new(b"definitely not a tiff".to_vec()));
    assert!(result.is_err());
}

#[test]
fn test_option_names_round_trip() {
    for c in [TiffCompression::None, TiffCompression::Lzw, TiffCompression::Deflate] {
        assert_eq!(TiffCompression::from_name(c.name()), Some(c));
    }
    assert_eq!(SampleFormat::from_name("F64"), Some(SampleFormat::Float64));
    assert_eq!(TiffCompression::from_name("jpeg"), None);
}
