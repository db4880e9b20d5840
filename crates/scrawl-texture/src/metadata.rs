//! Ruled-template line metadata
//!
//! Lined templates describe where their rules sit in a JSON sidecar
//! addressed by convention as `<base>/<template_id>.json`. Everything is
//! validated before the renderer sees it; in particular the baseline
//! offset must fit inside one line.

use scrawl_core::error::{Result, TemplateError};
use scrawl_core::Color;
use serde::Deserialize;
use std::path::PathBuf;

/// Validated line-alignment metadata for a ruled template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMetadata {
    pub line_height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub line_spacing: f32,
    pub line_color: Color,
    pub has_margin_line: bool,
    pub margin_line_position: f32,
    pub margin_line_color: Color,
    /// Distance from the top of a line slot down to the baseline;
    /// structurally required to be < `line_height`
    pub baseline_offset: f32,
}

impl TemplateMetadata {
    /// Y coordinate of the nth writing baseline.
    pub fn baseline_y(&self, line_index: usize) -> f32 {
        self.margin_top
            + self.baseline_offset
            + line_index as f32 * (self.line_height + self.line_spacing)
    }
}

/// Raw wire shape before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    line_height: Option<f32>,
    margin_top: Option<f32>,
    #[serde(default)]
    margin_left: f32,
    #[serde(default)]
    margin_right: f32,
    #[serde(default)]
    margin_bottom: f32,
    line_spacing: Option<f32>,
    line_color: Option<String>,
    #[serde(default)]
    has_margin_line: bool,
    #[serde(default)]
    margin_line_position: f32,
    #[serde(default = "default_margin_line_color")]
    margin_line_color: String,
    baseline_offset: Option<f32>,
}

fn default_margin_line_color() -> String {
    "E57373".to_string()
}

/// Loads and validates `<base>/<template_id>.json`
pub struct TemplateMetadataStore {
    base_dir: PathBuf,
}

impl TemplateMetadataStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn load(&self, template_id: &str) -> Result<TemplateMetadata> {
        let path = self.base_dir.join(format!("{template_id}.json"));
        if !path.exists() {
            return Err(TemplateError::FileNotFound(path.display().to_string()).into());
        }
        let raw_text = std::fs::read_to_string(&path)?;
        parse_metadata(&raw_text)
    }
}

/// Parse and validate a metadata document.
pub fn parse_metadata(json: &str) -> Result<TemplateMetadata> {
    let raw: RawMetadata =
        serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))?;

    let line_height = require_positive("lineHeight", raw.line_height)?;
    let margin_top = require_positive("marginTop", raw.margin_top)?;
    let line_spacing = require_non_negative("lineSpacing", raw.line_spacing)?;
    let baseline_offset = require_non_negative("baselineOffset", raw.baseline_offset)?;

    if baseline_offset >= line_height {
        return Err(TemplateError::InvalidValue {
            field: "baselineOffset",
            reason: format!("{baseline_offset} must be < lineHeight {line_height}"),
        }
        .into());
    }

    let line_color = parse_color("lineColor", raw.line_color.as_deref())?;
    let margin_line_color = parse_color("marginLineColor", Some(&raw.margin_line_color))?;

    Ok(TemplateMetadata {
        line_height,
        margin_top,
        margin_left: raw.margin_left.max(0.0),
        margin_right: raw.margin_right.max(0.0),
        margin_bottom: raw.margin_bottom.max(0.0),
        line_spacing,
        line_color,
        has_margin_line: raw.has_margin_line,
        margin_line_position: raw.margin_line_position.max(0.0),
        margin_line_color,
        baseline_offset,
    })
}

fn require_positive(field: &'static str, value: Option<f32>) -> Result<f32> {
    let v = value.ok_or(TemplateError::MissingField(field))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(TemplateError::InvalidValue {
            field,
            reason: format!("{v} is not a positive number"),
        }
        .into());
    }
    Ok(v)
}

fn require_non_negative(field: &'static str, value: Option<f32>) -> Result<f32> {
    let v = value.ok_or(TemplateError::MissingField(field))?;
    if !v.is_finite() || v < 0.0 {
        return Err(TemplateError::InvalidValue {
            field,
            reason: format!("{v} is not a non-negative number"),
        }
        .into());
    }
    Ok(v)
}

fn parse_color(field: &'static str, value: Option<&str>) -> Result<Color> {
    let value = value.ok_or(TemplateError::MissingField(field))?;
    Color::from_hex(value).ok_or_else(|| {
        TemplateError::InvalidColor {
            field,
            value: value.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r##"{
        "lineHeight": 32.0,
        "marginTop": 60.0,
        "marginLeft": 48.0,
        "lineSpacing": 4.0,
        "lineColor": "#B0C4DE",
        "hasMarginLine": true,
        "marginLinePosition": 56.0,
        "baselineOffset": 24.0
    }"##;

    #[test]
    fn valid_document_parses() {
        let meta = parse_metadata(VALID).unwrap();
        assert_eq!(meta.line_height, 32.0);
        assert_eq!(meta.line_color, Color::rgb(176, 196, 222));
        assert!(meta.has_margin_line);
        // Default margin-line color applies when omitted
        assert_eq!(meta.margin_line_color, Color::rgb(229, 115, 115));
    }

    #[test]
    fn baseline_positions_stack_by_line() {
        let meta = parse_metadata(VALID).unwrap();
        assert_eq!(meta.baseline_y(0), 60.0 + 24.0);
        assert_eq!(meta.baseline_y(2), 60.0 + 24.0 + 2.0 * 36.0);
    }

    #[test]
    fn baseline_offset_must_fit_inside_a_line() {
        let doc = VALID.replace("\"baselineOffset\": 24.0", "\"baselineOffset\": 32.0");
        let err = parse_metadata(&doc).unwrap_err();
        assert!(err.to_string().contains("baselineOffset"));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let doc = r#"{"marginTop": 60.0, "lineSpacing": 0.0, "lineColor": "000000", "baselineOffset": 1.0}"#;
        let err = parse_metadata(doc).unwrap_err();
        assert!(err.to_string().contains("lineHeight"));
    }

    #[test]
    fn bad_hex_color_is_rejected() {
        let doc = VALID.replace("#B0C4DE", "bluish");
        assert!(parse_metadata(&doc).is_err());
    }

    #[test]
    fn store_reads_by_convention_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("college.json"), VALID).unwrap();
        let store = TemplateMetadataStore::new(dir.path());
        assert!(store.load("college").is_ok());
        assert!(store.load("legal").is_err());
    }
}
