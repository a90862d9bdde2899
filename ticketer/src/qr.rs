//! QR code rendering.
//!
//! [`QrCodeEncoder`] is the production [`CodeEncoder`]: it renders the payload
//! as a greyscale PNG on a blocking thread and hands it back as a `data:` URI.

use image::{ExtendedColorType, ImageEncoder, Luma, codecs::png::PngEncoder};
use qrcode::render::unicode::Dense1x2;
use qrcode::{EcLevel, QrCode};
use std::future::Future;
use std::pin::Pin;
use ticketer_core::DataUri;
use ticketer_core::environment::CodeEncoder;
use ticketer_core::error::EncodeError;

/// Renders payloads as QR code PNGs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QrCodeEncoder {
    scale: u32,
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self::new(4)
    }
}

impl QrCodeEncoder {
    /// Encoder drawing each module as a `scale` x `scale` pixel square.
    ///
    /// A scale of zero is treated as one.
    #[must_use]
    pub const fn new(scale: u32) -> Self {
        Self {
            scale: if scale == 0 { 1 } else { scale },
        }
    }

    /// Pixels per module edge
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }
}

fn build_code(payload: &str) -> Result<QrCode, EncodeError> {
    QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| EncodeError::Payload(e.to_string()))
}

/// Render `payload` as PNG bytes.
///
/// # Errors
///
/// Returns [`EncodeError::Payload`] if the payload does not fit in a QR code
/// and [`EncodeError::Render`] if PNG encoding fails.
pub fn render_png(payload: &str, scale: u32) -> Result<Vec<u8>, EncodeError> {
    let code = build_code(payload)?;
    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(scale, scale)
        .build();

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )
        .map_err(|e| EncodeError::Render(e.to_string()))?;

    Ok(png)
}

/// Render `payload` as text for a terminal, two modules per character cell.
///
/// # Errors
///
/// Returns [`EncodeError::Payload`] if the payload does not fit in a QR code.
pub fn render_terminal(payload: &str) -> Result<String, EncodeError> {
    let code = build_code(payload)?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

impl CodeEncoder for QrCodeEncoder {
    fn encode(
        &self,
        payload: String,
    ) -> Pin<Box<dyn Future<Output = Result<DataUri, EncodeError>> + Send + '_>> {
        let scale = self.scale;
        Box::pin(async move {
            let len = payload.len();
            let png = tokio::task::spawn_blocking(move || render_png(&payload, scale))
                .await
                .map_err(|e| EncodeError::Task(e.to_string()))??;

            tracing::debug!(payload_len = len, png_len = png.len(), "Rendered QR code");
            Ok(DataUri::png(&png))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    #[test]
    fn renders_png_bytes() {
        let png = render_png("https://preview-ebon.vercel.app/ticket/Ada/a@b.c/24126001", 4)
            .unwrap();
        assert!(png.len() > 8);
        assert_eq!(&png[..4], &PNG_MAGIC);
    }

    #[test]
    fn larger_scale_gives_larger_image() {
        let small = image::load_from_memory(&render_png("hello", 1).unwrap()).unwrap();
        let large = image::load_from_memory(&render_png("hello", 3).unwrap()).unwrap();
        assert_eq!(large.width(), small.width() * 3);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = "x".repeat(5_000);
        assert!(matches!(
            render_png(&payload, 1),
            Err(EncodeError::Payload(_))
        ));
    }

    #[test]
    fn terminal_rendering_is_multiline() {
        let text = render_terminal("hello").unwrap();
        assert!(text.lines().count() > 5);
    }

    #[test]
    fn zero_scale_is_clamped() {
        assert_eq!(QrCodeEncoder::new(0).scale(), 1);
    }

    #[tokio::test]
    async fn encoder_returns_png_data_uri() {
        let uri = QrCodeEncoder::default()
            .encode("hello".to_string())
            .await
            .unwrap();

        assert_eq!(uri.media_type(), "image/png");
        assert!(uri.to_string().starts_with("data:image/png;base64,"));
        assert_eq!(&uri.decode().unwrap()[..4], &PNG_MAGIC);
    }
}
