use std::fmt::Debug;

use image::GrayImage;
use itertools::Itertools;
use rxing::BarcodeFormat;

use crate::frame::Frame;

/// Fixed global threshold applied to every frame before scanning.
pub(crate) const BINARIZE_THRESHOLD: u8 = 127;

/// Text payload recovered from one symbol in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedSymbol {
    pub(crate) text: String,
}

impl DecodedSymbol {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// A short, single line version of the payload suitable for logs.
    pub(crate) fn summary(&self) -> String {
        let mut printable = self.text.trim().chars().filter(|c| !c.is_control());

        let mut display = printable.by_ref().take(50).join("");
        if printable.next().is_some() {
            display.push('…');
        }
        display
    }
}

/// Binarizes the frame and flattens it to luma for the scanners.
fn prepare(frame: &Frame, threshold: u8) -> GrayImage {
    frame.binarize(threshold).to_luma()
}

pub(crate) trait SymbolDecoder: Debug {
    fn name(&self) -> &'static str;

    /// Every symbol found in the frame, in the order the decoder produced
    /// them. Finding nothing is the common case, not an error.
    fn decode(&self, frame: &Frame) -> Vec<DecodedSymbol>;
}

#[derive(Debug)]
pub(crate) struct QrDecoder {
    threshold: u8,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self {
            threshold: BINARIZE_THRESHOLD,
        }
    }
}

impl SymbolDecoder for QrDecoder {
    fn name(&self) -> &'static str {
        "QR"
    }

    #[tracing::instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    fn decode(&self, frame: &Frame) -> Vec<DecodedSymbol> {
        let luma = prepare(frame, self.threshold);

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32)[0],
        );

        let grids = prepared.detect_grids();
        tracing::trace!(count = grids.len(), "detected grids");

        grids
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_meta, content)) => Some(DecodedSymbol::new(content)),
                Err(err) => {
                    tracing::trace!(name = self.name(), "could not decode: {err}");
                    None
                }
            })
            .collect()
    }
}

/// One-dimensional barcodes (EAN, UPC, Code 128, Code 39 and friends).
///
/// QR codes found by this scanner are dropped, `QrDecoder` owns those.
#[derive(Debug)]
pub(crate) struct LinearDecoder {
    threshold: u8,
}

impl Default for LinearDecoder {
    fn default() -> Self {
        Self {
            threshold: BINARIZE_THRESHOLD,
        }
    }
}

impl SymbolDecoder for LinearDecoder {
    fn name(&self) -> &'static str {
        "Barcode"
    }

    #[tracing::instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    fn decode(&self, frame: &Frame) -> Vec<DecodedSymbol> {
        let luma = prepare(frame, self.threshold);
        let (width, height) = luma.dimensions();

        let results = match rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height)
        {
            Ok(results) => results,
            Err(err) => {
                tracing::trace!(name = self.name(), "could not decode: {err}");
                return Vec::new();
            }
        };

        results
            .into_iter()
            .filter(|result| *result.getBarcodeFormat() != BarcodeFormat::QR_CODE)
            .map(|result| {
                tracing::trace!(format = ?result.getBarcodeFormat(), "decoded barcode");
                DecodedSymbol::new(result.getText())
            })
            .collect()
    }
}

/// Runs every decoder over the frame and chains their results, QR first.
#[derive(Debug)]
pub(crate) struct SymbolDecoders {
    decoders: Vec<Box<dyn SymbolDecoder>>,
}

impl Default for SymbolDecoders {
    fn default() -> Self {
        Self::new(vec![
            Box::new(QrDecoder::default()),
            Box::new(LinearDecoder::default()),
        ])
    }
}

impl SymbolDecoders {
    pub(crate) fn new(decoders: Vec<Box<dyn SymbolDecoder>>) -> Self {
        Self { decoders }
    }

    pub(crate) fn list(&self) -> &[Box<dyn SymbolDecoder>] {
        &self.decoders
    }
}

impl SymbolDecoder for SymbolDecoders {
    fn name(&self) -> &'static str {
        "All"
    }

    fn decode(&self, frame: &Frame) -> Vec<DecodedSymbol> {
        self.decoders
            .iter()
            .flat_map(|decoder| decoder.decode(frame))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    const MODULE_PIXELS: u32 = 6;
    const QUIET_ZONE: u32 = 4;

    fn draw_code(image: &mut RgbImage, payload: &str, left: u32, top: u32) {
        let code = qrcode::QrCode::new(payload.as_bytes()).expect("payload should encode");
        let width = code.width() as u32;

        for (i, color) in code.to_colors().into_iter().enumerate() {
            if color != qrcode::Color::Dark {
                continue;
            }

            let (mx, my) = (i as u32 % width, i as u32 / width);
            for dy in 0..MODULE_PIXELS {
                for dx in 0..MODULE_PIXELS {
                    image.put_pixel(
                        left + (QUIET_ZONE + mx) * MODULE_PIXELS + dx,
                        top + (QUIET_ZONE + my) * MODULE_PIXELS + dy,
                        Rgb([20, 20, 20]),
                    );
                }
            }
        }
    }

    fn code_extent(payload: &str) -> u32 {
        let code = qrcode::QrCode::new(payload.as_bytes()).expect("payload should encode");
        (code.width() as u32 + QUIET_ZONE * 2) * MODULE_PIXELS
    }

    /// Renders each payload as a QR code side by side on a light background.
    pub(crate) fn qr_frame(payloads: &[&str]) -> Frame {
        let extents: Vec<u32> = payloads.iter().map(|p| code_extent(p)).collect();
        let width = extents.iter().sum::<u32>().max(1);
        let height = extents.iter().copied().max().unwrap_or(1);

        let mut image = RgbImage::from_pixel(width, height, Rgb([230, 230, 230]));
        let mut left = 0;
        for (payload, extent) in payloads.iter().zip(extents) {
            draw_code(&mut image, payload, left, 0);
            left += extent;
        }

        Frame::new(image)
    }

    pub(crate) fn blank_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(64, 48, Rgb([200, 200, 200])))
    }

    const BAR_PIXELS: u32 = 4;
    const BAR_QUIET_ZONE: u32 = 12;
    const BAR_HEIGHT: u32 = 80;

    /// Renders a 12 digit payload as an EAN-13 barcode on a light background.
    pub(crate) fn ean13_frame(digits: &str) -> Frame {
        let modules = barcoders::sym::ean13::EAN13::new(digits)
            .expect("digits should encode")
            .encode();
        let width = (modules.len() as u32 + BAR_QUIET_ZONE * 2) * BAR_PIXELS;

        let mut image = RgbImage::from_pixel(width, BAR_HEIGHT, Rgb([230, 230, 230]));
        for (i, module) in modules.into_iter().enumerate() {
            if module == 0 {
                continue;
            }

            let left = (BAR_QUIET_ZONE + i as u32) * BAR_PIXELS;
            for x in left..left + BAR_PIXELS {
                for y in 0..BAR_HEIGHT {
                    image.put_pixel(x, y, Rgb([20, 20, 20]));
                }
            }
        }

        Frame::new(image)
    }

    #[test]
    fn test_decodes_single_code() {
        let symbols = QrDecoder::default().decode(&qr_frame(&["HELLO-WORLD"]));

        assert_eq!(symbols, vec![DecodedSymbol::new("HELLO-WORLD")]);
    }

    #[test]
    fn test_blank_frame_has_no_symbols() {
        assert!(QrDecoder::default().decode(&blank_frame()).is_empty());
    }

    #[test]
    fn test_decodes_every_code_in_frame() {
        let symbols = QrDecoder::default().decode(&qr_frame(&["A", "B"]));

        let texts: Vec<_> = symbols.into_iter().map(|s| s.text).sorted().collect();
        assert_eq!(texts, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_mid_grey_code_is_lost_to_threshold() {
        // 127 is not strictly above the threshold, so the background turns
        // black along with the modules.
        let mut image = qr_frame(&["HELLO-WORLD"]).as_rgb().clone();
        for pixel in image.pixels_mut() {
            if pixel.0 == [230, 230, 230] {
                *pixel = Rgb([127, 127, 127]);
            }
        }

        assert!(QrDecoder::default().decode(&Frame::new(image)).is_empty());
    }

    #[test]
    fn test_summary_strips_and_truncates() {
        assert_eq!(DecodedSymbol::new("  hi\nthere ").summary(), "hithere");

        let long = "x".repeat(60);
        let summary = DecodedSymbol::new(long).summary();
        assert_eq!(summary.chars().count(), 51);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_linear_decoder_reads_ean13() {
        let symbols = LinearDecoder::default().decode(&ean13_frame("750103131130"));

        assert_eq!(symbols, vec![DecodedSymbol::new("7501031311309")]);
    }

    #[test]
    fn test_linear_decoder_skips_qr_codes() {
        assert!(LinearDecoder::default()
            .decode(&qr_frame(&["HELLO-WORLD"]))
            .is_empty());
        assert!(LinearDecoder::default().decode(&blank_frame()).is_empty());
    }

    #[test]
    fn test_decoders_cover_qr_and_barcodes() {
        let decoders = SymbolDecoders::default();
        let names: Vec<_> = decoders.list().iter().map(|decoder| decoder.name()).collect();
        assert_eq!(names, vec!["QR", "Barcode"]);

        assert_eq!(
            decoders.decode(&qr_frame(&["HELLO-WORLD"])),
            vec![DecodedSymbol::new("HELLO-WORLD")]
        );
        assert_eq!(
            decoders.decode(&ean13_frame("750103131130")),
            vec![DecodedSymbol::new("7501031311309")]
        );
        assert!(decoders.decode(&blank_frame()).is_empty());
    }

    #[test]
    fn test_summary_ignores_trailing_control_characters() {
        let text = format!("{}\u{7}\u{7}", "x".repeat(49));

        assert_eq!(DecodedSymbol::new(text).summary(), "x".repeat(49));
    }
}
