//! Handle runtime contract: lifecycles, two-phase queries and error codes.

mod common;

use std::sync::Arc;
use std::thread;

use common::{encode_png, scene};
use deepqr::{ErrorCode, Handle, PixelFormat, QrError, QrRuntime};

fn hello_result(runtime: &QrRuntime) -> Handle {
    let (img, _) = scene(400, 400, "HELLO", 137, 137);
    let detector = runtime.create_detector();
    let result = runtime
        .detect_and_decode_data(detector, &encode_png(&img))
        .expect("valid png");
    runtime.release_detector(detector).unwrap();
    result
}

#[test]
fn text_query_is_two_phase() {
    let runtime = QrRuntime::new();
    let result = hello_result(&runtime);
    assert_eq!(runtime.result_size(result).unwrap(), 1);

    // Size query: payload length plus terminator
    let required = runtime.result_text(result, 0, None).unwrap();
    assert_eq!(required, 6);

    // One byte short: rejected, buffer untouched
    let mut short = vec![0xAAu8; required - 1];
    let err = runtime.result_text(result, 0, Some(&mut short)).unwrap_err();
    assert!(matches!(err, QrError::BufferTooSmall { required: 6 }));
    assert_eq!(err.code(), ErrorCode::BufferTooSmall);
    assert!(short.iter().all(|&b| b == 0xAA));

    // Exact size: payload and NUL terminator
    let mut exact = vec![0xAAu8; required];
    assert_eq!(runtime.result_text(result, 0, Some(&mut exact)).unwrap(), 6);
    assert_eq!(&exact, b"HELLO\0");
}

#[test]
fn text_query_returns_payload_bytes_verbatim() {
    // Byte-mode payload that is not valid UTF-8
    let payload: &[u8] = b"caf\xe9 \xff\x01";
    let (img, _) = scene(400, 400, payload, 137, 137);
    let runtime = QrRuntime::new();
    let detector = runtime.create_detector();
    let result = runtime
        .detect_and_decode_data(detector, &encode_png(&img))
        .unwrap();
    assert_eq!(runtime.result_size(result).unwrap(), 1);

    let required = runtime.result_text(result, 0, None).unwrap();
    assert_eq!(required, payload.len() + 1);
    let mut buffer = vec![0xAAu8; required];
    runtime.result_text(result, 0, Some(&mut buffer)).unwrap();
    assert_eq!(&buffer[..payload.len()], payload);
    assert_eq!(buffer[payload.len()], 0);

    let set = runtime.result_set(result).unwrap();
    assert_eq!(set.get(0).unwrap().data, payload);
}

#[test]
fn points_query_is_two_phase() {
    let runtime = QrRuntime::new();
    let result = hello_result(&runtime);

    assert_eq!(runtime.result_points(result, 0, None).unwrap(), 8);

    let mut short = [-1.0f32; 7];
    assert!(matches!(
        runtime.result_points(result, 0, Some(&mut short)),
        Err(QrError::BufferTooSmall { required: 8 })
    ));
    assert!(short.iter().all(|&v| v == -1.0));

    let mut points = [0.0f32; 8];
    runtime.result_points(result, 0, Some(&mut points)).unwrap();
    for (i, v) in points.iter().enumerate() {
        assert!((130.0..230.0).contains(v), "coordinate {i} = {v}");
    }
}

#[test]
fn index_and_handle_errors() {
    let runtime = QrRuntime::new();
    let result = hello_result(&runtime);

    let err = runtime.result_text(result, 1, None).unwrap_err();
    assert!(matches!(err, QrError::InvalidIndex { index: 1, len: 1 }));
    assert_eq!(err.code() as i32, -2);

    runtime.release_result(result).unwrap();
    assert_eq!(runtime.result_size(result).unwrap_err().code() as i32, -1);
    assert_eq!(runtime.result_points(result, 0, None).unwrap_err().code(), ErrorCode::InvalidHandle);
}

#[test]
fn undecodable_inputs() {
    let runtime = QrRuntime::new();
    let detector = runtime.create_detector();

    let err = runtime.detect_and_decode_data(detector, b"\x89PNG garbage").unwrap_err();
    assert_eq!(err.code(), ErrorCode::DecodeFailed);

    let err = runtime
        .detect_and_decode_path(detector, "/nonexistent/deepqr/image.png")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DecodeFailed);

    let err = runtime
        .detect_and_decode_pixels(detector, &[0u8; 10], PixelFormat::Rgb, 4, 4, None)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    // Nothing registered on failure
    assert_eq!(runtime.result_count(), 0);
}

#[test]
fn path_entry_matches_data_entry() {
    let runtime = QrRuntime::new();
    let (img, _) = scene(400, 400, "HELLO", 137, 137);
    let path = std::env::temp_dir().join(format!("deepqr_runtime_{}.png", std::process::id()));
    std::fs::write(&path, encode_png(&img)).unwrap();

    let detector = runtime.create_detector();
    let result = runtime.detect_and_decode_path(detector, &path).unwrap();
    let _ = std::fs::remove_file(&path);

    let set = runtime.result_set(result).unwrap();
    assert_eq!(set.texts(), vec!["HELLO"]);
}

#[test]
fn shared_detector_is_serialized() {
    let runtime = Arc::new(QrRuntime::new());
    let detector = runtime.create_detector();
    let (img, _) = scene(400, 400, "HELLO", 137, 137);
    let pixels = Arc::new(img.to_contiguous());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let pixels = Arc::clone(&pixels);
            thread::spawn(move || {
                runtime
                    .detect_and_decode_pixels(detector, &pixels, PixelFormat::Gray, 400, 400, None)
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<Handle> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    for result in &results {
        assert_eq!(runtime.result_size(*result).unwrap(), 1);
    }
    assert_eq!(runtime.result_count(), 4);
}
