//! Per-image orchestration: detect, crop, rescale, binarize, decode, dedup.
use std::borrow::Cow;
use std::time::Instant;

use crate::decoder::SymbolDecoder;
use crate::detector::region::detection_size;
use crate::detector::{Aligner, CropPolicy, Deduplicator, RegionDetector};
use crate::models::{DecodeRecord, GrayImage, Quad, ResultSet};
use crate::scale::{SuperScale, scale_list};
use crate::utils::binarization::binarize;

/// Images with a side at or below this many pixels are not searched
pub const MIN_IMAGE_SIDE: usize = 20;

/// Detection pipeline over grayscale images.
///
/// Candidates are processed in detector order and scales in [`scale_list`]
/// order; the first scale that decodes anything ends the search for that
/// candidate.
pub struct Pipeline {
    region: RegionDetector,
    super_scale: SuperScale,
    decoder: Box<dyn SymbolDecoder>,
    crop: CropPolicy,
    scale_factor: Option<f32>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("region", &self.region)
            .field("super_scale", &self.super_scale)
            .field("crop", &self.crop)
            .field("scale_factor", &self.scale_factor)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline from its stages
    pub fn new(
        region: RegionDetector,
        super_scale: SuperScale,
        decoder: Box<dyn SymbolDecoder>,
        crop: CropPolicy,
    ) -> Self {
        Self {
            region,
            super_scale,
            decoder,
            crop,
            scale_factor: None,
        }
    }

    /// Override the detector input scale (`None` restores the area policy)
    pub fn set_scale_factor(&mut self, factor: Option<f32>) {
        self.scale_factor = factor;
    }

    /// Current detector input scale override
    pub fn scale_factor(&self) -> Option<f32> {
        self.scale_factor
    }

    /// Replace the symbol decoder
    pub fn set_decoder(&mut self, decoder: Box<dyn SymbolDecoder>) {
        self.decoder = decoder;
    }

    /// Find and decode every symbol in `img`
    pub fn run(&mut self, img: &GrayImage) -> ResultSet {
        let mut results = ResultSet::new();
        if img.width() <= MIN_IMAGE_SIDE || img.height() <= MIN_IMAGE_SIDE {
            log::debug!(
                "image {}x{} too small, skipping",
                img.width(),
                img.height()
            );
            return results;
        }

        let start = Instant::now();
        let (target_w, target_h) = detection_size(img.width(), img.height(), self.scale_factor);
        let candidates = self.region.detect(img, target_w, target_h);

        let mut dedup = Deduplicator::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let admitted = self.decode_candidate(img, candidate, &mut dedup, &mut results);
            log::trace!("candidate {index}: {admitted} symbols admitted");
        }

        log::debug!(
            "detect_and_decode {}x{}: {} candidates, {} results in {:.3}s",
            img.width(),
            img.height(),
            candidates.len(),
            results.len(),
            start.elapsed().as_secs_f64()
        );
        results
    }

    /// Try every scale of one candidate; returns how many symbols were admitted
    fn decode_candidate(
        &mut self,
        img: &GrayImage,
        candidate: &Quad,
        dedup: &mut Deduplicator,
        results: &mut ResultSet,
    ) -> usize {
        let mut aligner = Aligner::new();
        // Without a region model the candidate is the whole image, searched uncropped
        let region = if self.region.has_model() {
            Cow::Owned(aligner.crop(img, candidate, &self.crop))
        } else {
            Cow::Borrowed(img)
        };
        if region.is_empty() {
            log::trace!("candidate {candidate:?} crops to nothing");
            return 0;
        }

        for &scale in scale_list(region.width(), region.height()) {
            let scaled = self.super_scale.enhance(region.as_ref(), scale);
            if scaled.is_empty() {
                continue;
            }
            let matrix = binarize(&scaled);
            let symbols = self.decoder.decode(&matrix);
            log::trace!(
                "scale {scale}: {}x{} -> {} symbols",
                scaled.width(),
                scaled.height(),
                symbols.len()
            );
            if symbols.is_empty() {
                continue;
            }

            let mut admitted = 0;
            for symbol in symbols {
                let quad = aligner.warp_back(&symbol.quad.map(|p| p.unscale(scale)));
                if dedup.admit(&quad) {
                    results.push(DecodeRecord::from_payload(symbol.data, quad));
                    admitted += 1;
                } else {
                    log::debug!("dropping duplicate of '{}'", symbol.text());
                }
            }
            return admitted;
        }
        0
    }
}
