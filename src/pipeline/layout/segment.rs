//! Region Segmenter: fixed proportional page map, one OCR call per region.

use std::collections::BTreeMap;

use image::{DynamicImage, GenericImageView};

use super::catalog::PatternCatalog;
use super::confidence::section_confidence;
use super::types::{BoundingBox, OcrConfig, OcrEngine, Region, RegionKind};
use super::RegionError;
use crate::pipeline_config::RegionBounds;

/// Pixel box of `kind`'s band on a `width` x `height` page.
pub fn region_box(kind: RegionKind, width: u32, height: u32, bounds: &RegionBounds) -> BoundingBox {
    let band = bounds.band(kind);
    let top = ((band.top * height as f32).round() as u32).min(height);
    let bottom = ((band.bottom * height as f32).round() as u32).min(height);
    BoundingBox {
        x: 0,
        y: top,
        width,
        height: bottom.saturating_sub(top),
    }
}

/// Crop `kind`'s band out of the page.
pub fn crop_region(
    page: &DynamicImage,
    kind: RegionKind,
    bounds: &RegionBounds,
) -> Result<(BoundingBox, DynamicImage), RegionError> {
    let bbox = region_box(kind, page.width(), page.height(), bounds);
    if bbox.width == 0 || bbox.height == 0 {
        return Err(RegionError::EmptyCrop { region: kind });
    }
    let crop = page.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
    Ok((bbox, crop))
}

/// Read a region crop's text. Whitespace-only text counts as no text.
pub fn read_region(
    engine: &dyn OcrEngine,
    crop: &DynamicImage,
    kind: RegionKind,
    config: OcrConfig,
) -> Result<String, RegionError> {
    let text = engine
        .recognize_text(crop, config)
        .map_err(|source| RegionError::Ocr { region: kind, config, source })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(RegionError::EmptyText { region: kind });
    }
    Ok(text.to_string())
}

pub struct RegionSegmenter<'a> {
    engine: &'a dyn OcrEngine,
    bounds: &'a RegionBounds,
    config: OcrConfig,
    catalog: &'a PatternCatalog,
}

impl<'a> RegionSegmenter<'a> {
    pub fn new(
        engine: &'a dyn OcrEngine,
        bounds: &'a RegionBounds,
        config: OcrConfig,
        catalog: &'a PatternCatalog,
    ) -> Self {
        Self { engine, bounds, config, catalog }
    }

    /// Every region that produced text, keyed by kind. Failed regions are
    /// logged and left out; an empty map means nothing on the page was read.
    pub fn segment(&self, page: &DynamicImage) -> BTreeMap<RegionKind, Region> {
        let mut regions = BTreeMap::new();

        for kind in RegionKind::ALL {
            match self.segment_one(page, kind) {
                Ok(region) => {
                    tracing::debug!(
                        region = %kind,
                        chars = region.raw_text.len(),
                        confidence = region.confidence,
                        "Region recognized"
                    );
                    regions.insert(kind, region);
                }
                Err(e) => {
                    tracing::warn!(region = %kind, error = %e, "Region unavailable");
                }
            }
        }

        regions
    }

    fn segment_one(&self, page: &DynamicImage, kind: RegionKind) -> Result<Region, RegionError> {
        let (bbox, crop) = crop_region(page, kind, self.bounds)?;
        let text = read_region(self.engine, &crop, kind, self.config)?;
        Ok(Region {
            kind,
            bounding_box: Some(bbox),
            confidence: section_confidence(kind, &text, self.catalog),
            raw_text: text,
        })
    }
}
