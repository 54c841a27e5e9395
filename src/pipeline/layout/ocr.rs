use std::collections::HashMap;

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

use super::types::{BoundingBox, OcrConfig, OcrEngine, RegionKind, Word};
use super::OcrError;
use crate::pipeline_config::RegionBounds;

/// Parse Tesseract TSV output into words with bounding boxes.
/// TSV columns: level page_num block_num par_num line_num word_num left top width height conf text
/// Level 5 = individual word entries. Confidence stays on Tesseract's 0-100 scale.
pub fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    let mut results = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header row
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = match fields[0].parse() {
            Ok(l) => l,
            Err(_) => continue,
        };
        if level != 5 {
            continue;
        }

        let conf: f32 = match fields[10].trim().parse() {
            Ok(c) => c,
            Err(_) => continue,
        };

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        let Some(bounding_box) = parse_bounding_box(fields[6], fields[7], fields[8], fields[9])
        else {
            continue;
        };

        results.push(Word {
            text: word.to_string(),
            bounding_box,
            // Tesseract returns -1 for words it can't assign confidence to
            confidence: conf.max(0.0),
        });
    }

    results
}

/// Parse bounding box coordinates from TSV string fields.
fn parse_bounding_box(left: &str, top: &str, width: &str, height: &str) -> Option<BoundingBox> {
    Some(BoundingBox {
        x: left.trim().parse().ok()?,
        y: top.trim().parse().ok()?,
        width: width.trim().parse().ok()?,
        height: height.trim().parse().ok()?,
    })
}

// ═══════════════════════════════════════════════════════════
// Mock engine
// ═══════════════════════════════════════════════════════════

/// Canned OCR output for one region.
#[derive(Debug, Clone)]
pub struct MockRegion {
    pub text: Result<String, OcrError>,
    pub words: HashMap<OcrConfig, Result<Vec<Word>, OcrError>>,
}

impl MockRegion {
    pub fn text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            words: HashMap::new(),
        }
    }

    pub fn failing(error: OcrError) -> Self {
        Self {
            text: Err(error),
            words: HashMap::new(),
        }
    }

    pub fn with_words(mut self, config: OcrConfig, words: Result<Vec<Word>, OcrError>) -> Self {
        self.words.insert(config, words);
        self
    }
}

/// Mock OCR engine for unit testing without a real recognizer.
///
/// Pages built by [`MockOcrEngine::marker_page`] paint each region band with
/// a distinct gray level; the engine reads the top-left pixel of the crop it
/// receives to decide which region's script to replay. Regions without a
/// script, and unscripted word variants, fail with `OcrError::Engine`.
#[derive(Debug, Clone, Default)]
pub struct MockOcrEngine {
    regions: HashMap<RegionKind, MockRegion>,
}

impl MockOcrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, kind: RegionKind, region: MockRegion) -> Self {
        self.regions.insert(kind, region);
        self
    }

    /// Gray level painted into `kind`'s band.
    pub fn marker(kind: RegionKind) -> u8 {
        match kind {
            RegionKind::Header => 40,
            RegionKind::PatientInfo => 90,
            RegionKind::PrescriptionArea => 140,
            RegionKind::Footer => 190,
        }
    }

    /// A blank page whose bands carry region markers.
    pub fn marker_page(width: u32, height: u32, bounds: &RegionBounds) -> DynamicImage {
        let mut page = GrayImage::from_pixel(width, height, Luma([255]));
        for kind in RegionKind::ALL {
            let band = bounds.band(kind);
            let top = (band.top * height as f32).round() as u32;
            let bottom = ((band.bottom * height as f32).round() as u32).min(height);
            for y in top..bottom {
                for x in 0..width {
                    page.put_pixel(x, y, Luma([Self::marker(kind)]));
                }
            }
        }
        DynamicImage::ImageLuma8(page)
    }

    fn script_for(&self, image: &DynamicImage) -> Result<&MockRegion, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("empty crop".into()));
        }
        let luma = image.get_pixel(0, 0).0[0];
        RegionKind::ALL
            .into_iter()
            .find(|kind| Self::marker(*kind) == luma)
            .and_then(|kind| self.regions.get(&kind))
            .ok_or_else(|| OcrError::Engine(format!("no script for marker {luma}")))
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize_text(&self, image: &DynamicImage, _config: OcrConfig) -> Result<String, OcrError> {
        self.script_for(image)?.text.clone()
    }

    fn recognize_words(
        &self,
        image: &DynamicImage,
        config: OcrConfig,
    ) -> Result<Vec<Word>, OcrError> {
        self.script_for(image)?
            .words
            .get(&config)
            .cloned()
            .unwrap_or_else(|| Err(OcrError::Engine(format!("{config} not scripted"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn tsv_parser_extracts_words_and_boxes() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t95\tMetformin\n\
             5\t1\t1\t1\t1\t2\t100\t25\t60\t28\t88.5\t500mg"
        );
        let words = parse_tsv_words(&tsv);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Metformin");
        assert!((words[0].confidence - 95.0).abs() < f32::EPSILON);
        assert_eq!(
            words[1].bounding_box,
            BoundingBox { x: 100, y: 25, width: 60, height: 28 }
        );
        assert!((words[1].confidence - 88.5).abs() < f32::EPSILON);
    }

    #[test]
    fn tsv_parser_clamps_negative_confidence() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t-1\tgarbled");
        let words = parse_tsv_words(&tsv);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].confidence, 0.0);
    }

    #[test]
    fn tsv_parser_skips_malformed_lines() {
        let tsv = format!(
            "{HEADER}\n\
             too\tfew\tfields\n\
             5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t92\tOK\n\
             notanumber\t1\t1\t1\t1\t1\t10\t20\t80\t30\t50\tbad\n\
             5\t1\t1\t1\t1\t1\tx\t20\t80\t30\t50\tnobox\n\
             5\t1\t1\t1\t1\t2\t100\t20\t80\t30\t85\t"
        );
        let words = parse_tsv_words(&tsv);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "OK");
    }

    #[test]
    fn tsv_parser_handles_empty_input() {
        assert!(parse_tsv_words("").is_empty());
        assert!(parse_tsv_words(HEADER).is_empty());
    }

    #[test]
    fn mock_engine_routes_by_marker() {
        let bounds = RegionBounds::default();
        let page = MockOcrEngine::marker_page(50, 200, &bounds);
        let engine = MockOcrEngine::new()
            .with_region(RegionKind::Header, MockRegion::text("Dr. Smith Clinic"))
            .with_region(RegionKind::Footer, MockRegion::failing(OcrError::Timeout));

        let header = page.crop_imm(0, 0, 50, 30);
        assert_eq!(
            engine.recognize_text(&header, OcrConfig::Block).unwrap(),
            "Dr. Smith Clinic"
        );

        let footer = page.crop_imm(0, 150, 50, 50);
        assert_eq!(
            engine.recognize_text(&footer, OcrConfig::Block),
            Err(OcrError::Timeout)
        );

        let patient = page.crop_imm(0, 30, 50, 30);
        assert!(matches!(
            engine.recognize_text(&patient, OcrConfig::Block),
            Err(OcrError::Engine(_))
        ));
    }

    #[test]
    fn mock_engine_unscripted_variant_fails() {
        let page = MockOcrEngine::marker_page(50, 200, &RegionBounds::default());
        let engine = MockOcrEngine::new().with_region(
            RegionKind::PrescriptionArea,
            MockRegion::text("Rx").with_words(OcrConfig::SingleLine, Ok(vec![])),
        );
        let area = page.crop_imm(0, 60, 50, 90);
        assert_eq!(engine.recognize_words(&area, OcrConfig::SingleLine).unwrap(), vec![]);
        assert!(engine.recognize_words(&area, OcrConfig::SingleWord).is_err());
    }
}
