//! Importer facade tests: file loading, naming and the preview cache

mod common;

use common::*;
use dpcm_audio::{ConversionRequest, DpcmConverter, DpcmError, Quality, SampleImporter};
use std::sync::Arc;

#[test]
fn test_open_names_sample_after_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("snare.wav");
    write_hound_wav(&path, 2, 44100, &to_stereo(&square_wave(4000, 20, 10_000)));

    let importer = SampleImporter::open(&path).unwrap();
    assert_eq!(importer.name(), "snare");
    assert_eq!(importer.describe(), "44100 Hz, 16 bits, Stereo");
    assert_eq!(importer.format().channels, 2);
    assert_eq!(importer.data_len(), 16_000);
}

#[test]
fn test_open_rejects_bad_file_before_conversion() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("broken.wav");
    std::fs::write(&path, b"RIFF\x04\x00\x00\x00WAVE").unwrap();

    let result = SampleImporter::open(&path);
    assert!(matches!(result, Err(DpcmError::InvalidFormat(_))));
}

#[test]
fn test_open_missing_file_is_io_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let result = SampleImporter::open(temp_dir.path().join("nope.wav"));
    assert!(matches!(result, Err(DpcmError::Io(_))));
}

#[test]
fn test_preview_is_cached_per_request() {
    let bytes = wav_i16(1, 44100, &square_wave(6000, 30, 12_000));
    let mut importer = SampleImporter::from_bytes("hat", bytes).unwrap();
    let request = ConversionRequest::default();

    let first = importer.preview(&request).unwrap().as_bytes().as_ptr();
    let second = importer.preview(&request).unwrap().as_bytes().as_ptr();
    assert_eq!(first, second, "unchanged request should reuse the cached buffer");
    assert!(importer.last_report().is_some());

    let other = ConversionRequest::new(Quality::new(3).unwrap(), 0.0).unwrap();
    let low = importer.preview(&other).unwrap().len();
    let high = importer.preview(&request).unwrap().len();
    assert!(low < high);
}

#[test]
fn test_import_names_and_clears_cache() {
    let bytes = wav_i16(1, 22050, &square_wave(3000, 15, 20_000));
    let mut importer = SampleImporter::from_bytes("tom", bytes).unwrap();
    let request = ConversionRequest::default();

    let previewed = importer.preview(&request).unwrap().clone();
    let imported = importer.import(&request).unwrap();

    assert_eq!(imported.name, "tom");
    assert_eq!(imported.data, previewed.data);
    assert!(importer.last_report().is_none());

    // A second import converts again and yields the same bytes
    importer.set_name("tom2");
    let again = importer.import(&request).unwrap();
    assert_eq!(again.name, "tom2");
    assert_eq!(again.data, imported.data);
}

#[test]
fn test_parallel_conversions_share_source() {
    let bytes = wav_i16(1, 44100, &square_wave(5000, 40, 15_000));
    let importer = Arc::new(SampleImporter::from_bytes("loop", bytes).unwrap());

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let importer = Arc::clone(&importer);
            std::thread::spawn(move || {
                let request =
                    ConversionRequest::new(Quality::new(12 + i).unwrap(), 0.0).unwrap();
                importer.convert(&request).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let conversion = handle.join().unwrap();
        let request = ConversionRequest::new(Quality::new(12 + i as u8).unwrap(), 0.0).unwrap();
        assert_eq!(conversion, importer.convert(&request).unwrap());
    }
}

#[test]
fn test_custom_converter() {
    let bytes = wav_i16(1, 44100, &vec![0i16; 20_000]);
    let importer = SampleImporter::from_bytes("pad", bytes)
        .unwrap()
        .with_converter(DpcmConverter::with_capacity(33).unwrap());
    let conversion = importer.convert(&ConversionRequest::default()).unwrap();
    assert_eq!(conversion.sample.len(), 33);
}
