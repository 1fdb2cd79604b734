//! Symbol decoding from binarized regions.
//!
//! The grid sampling and error correction live behind [`SymbolDecoder`]; the
//! default implementation is backed by `rqrr`.

use crate::models::{BitMatrix, Point, Quad, payload_text};

/// One symbol read from a bit matrix, corners in the matrix frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSymbol {
    /// Raw payload bytes
    pub data: Vec<u8>,
    /// Corners in top-left, top-right, bottom-right, bottom-left order
    pub quad: Quad,
}

impl DecodedSymbol {
    /// Payload as text
    pub fn text(&self) -> String {
        payload_text(&self.data)
    }
}

/// Reads every symbol it can find in a bit matrix (`true` = dark module)
pub trait SymbolDecoder: Send + Sync {
    /// Decode all symbols; an empty vector means nothing was readable
    fn decode(&self, matrix: &BitMatrix) -> Vec<DecodedSymbol>;
}

/// Decoder backed by `rqrr` grid detection and decoding
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for RqrrDecoder {
    fn decode(&self, matrix: &BitMatrix) -> Vec<DecodedSymbol> {
        if matrix.width() == 0 || matrix.height() == 0 {
            return Vec::new();
        }
        let mut prepared =
            rqrr::PreparedImage::prepare_from_bitmap(matrix.width(), matrix.height(), |x, y| {
                matrix.get(x, y)
            });
        let grids = prepared.detect_grids();

        let mut symbols = Vec::with_capacity(grids.len());
        for grid in grids {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(meta) => {
                    let corners = grid.bounds.map(|p| Point::new(p.x as f32, p.y as f32));
                    log::trace!(
                        "decoded version {} symbol with {} payload bytes",
                        meta.version.0,
                        payload.len()
                    );
                    symbols.push(DecodedSymbol {
                        data: payload,
                        quad: Quad::new(corners),
                    });
                }
                Err(err) => log::trace!("grid rejected: {err:?}"),
            }
        }
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render `payload` with `scale` pixels per module and a 4 module quiet zone
    fn render(payload: &[u8], scale: usize) -> (BitMatrix, usize) {
        let code = qrcode::QrCode::new(payload).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let quiet = 4;
        let size = (modules + 2 * quiet) * scale;
        let mut matrix = BitMatrix::new(size, size);
        for my in 0..modules {
            for mx in 0..modules {
                if colors[my * modules + mx] == qrcode::Color::Dark {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            matrix.set((mx + quiet) * scale + dx, (my + quiet) * scale + dy, true);
                        }
                    }
                }
            }
        }
        (matrix, modules)
    }

    #[test]
    fn test_decodes_rendered_symbol() {
        let (matrix, modules) = render(b"HELLO", 4);
        let symbols = RqrrDecoder::new().decode(&matrix);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].data, b"HELLO");
        assert_eq!(symbols[0].text(), "HELLO");

        // Symbol spans modules 4..4+modules at 4 px per module
        let tl = symbols[0].quad.top_left();
        let br = symbols[0].quad.bottom_right();
        assert!((tl.x - 16.0).abs() <= 3.0 && (tl.y - 16.0).abs() <= 3.0);
        let far = ((4 + modules) * 4) as f32;
        assert!((br.x - far).abs() <= 3.0 && (br.y - far).abs() <= 3.0);
    }

    #[test]
    fn test_byte_mode_payload_is_not_reencoded() {
        let payload = b"caf\xe9 \xff\x01";
        let (matrix, _) = render(payload, 4);
        let symbols = RqrrDecoder::new().decode(&matrix);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].data, payload);
        assert_eq!(symbols[0].text(), "caf\u{e9} \u{ff}\u{1}");
    }

    #[test]
    fn test_blank_matrix_yields_nothing() {
        assert!(RqrrDecoder::new().decode(&BitMatrix::new(64, 64)).is_empty());
        assert!(RqrrDecoder::new().decode(&BitMatrix::new(0, 0)).is_empty());
    }
}
