//! Table QR code rendering

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::models::QrPayload;

/// Rendered codes are at least this many pixels wide
const MIN_DIMENSION: u32 = 400;

/// Bytes of entropy in the per-generation session token
const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("Failed to encode QR data: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Failed to write PNG: {0}")]
    Image(#[from] image::ImageError),
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        AppError::with_message(ErrorCode::QrGenerationFailed, err.to_string())
    }
}

/// Customer-facing URL for a table, bound to a session token
pub fn table_url(public_base_url: &str, table_number: i32, token: &str) -> String {
    format!(
        "{}/table/{}?t={}",
        public_base_url.trim_end_matches('/'),
        table_number,
        token
    )
}

/// PNG bytes of a QR code encoding `data`
pub fn render_png(data: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Render a new payload for a table; every call yields a different token,
/// which retires the previous code once stored
pub fn generate(public_base_url: &str, table_number: i32) -> Result<QrPayload, QrError> {
    let session_token = shared::util::random_token(TOKEN_BYTES);
    let target_url = table_url(public_base_url, table_number, &session_token);
    let png = render_png(&target_url)?;
    let encoded = STANDARD.encode(&png);

    Ok(QrPayload {
        image_data_url: format!("data:image/png;base64,{encoded}"),
        image_bytes: encoded,
        target_url,
        session_token,
        generated_at: shared::util::now_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_shape() {
        let url = table_url("https://dine.example/", 7, "abc123");
        assert_eq!(url, "https://dine.example/table/7?t=abc123");
    }

    #[test]
    fn test_payload_accepts_only_its_own_token() {
        let qr = generate("http://localhost:3000", 4).unwrap();
        assert_eq!(qr.session_token.len(), TOKEN_BYTES * 2);
        assert!(qr.target_url.ends_with(&format!("?t={}", qr.session_token)));
        assert!(qr.accepts(Some(&qr.session_token)));
        assert!(!qr.accepts(Some("stale")));
        assert!(!qr.accepts(Some("")));
        assert!(!qr.accepts(None));
    }

    #[test]
    fn test_png_is_decodable() {
        let png = render_png("https://dine.example/table/1?t=abc").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let img = image::load_from_memory(&png).unwrap();
        assert!(img.width() >= MIN_DIMENSION);
    }

    #[test]
    fn test_each_generation_differs() {
        let a = generate("http://localhost:3000", 1).unwrap();
        let b = generate("http://localhost:3000", 1).unwrap();
        assert_ne!(a.target_url, b.target_url);
        assert_ne!(a.image_bytes, b.image_bytes);
        assert!(a.image_data_url.ends_with(&a.image_bytes));
    }
}
