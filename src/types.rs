//! Wire shapes shared with the persistence layer.
//!
//! Field names and enumeration spellings are part of the JSON contract and
//! must not change.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEventData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_colors: Option<BrandColors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<VisualStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image_url: Option<String>,
}

impl ParsedEventData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_date: None,
            end_date: None,
            location: None,
            brand_colors: None,
            logo_url: None,
            organizer_name: None,
            visual_style: None,
            hero_image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualStyle {
    pub style: DesignStyle,
    pub typography: Typography,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorative_elements: Option<Vec<DecorativeElement>>,
    #[serde(default)]
    pub design_elements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignStyle {
    Modern,
    Classic,
    Minimal,
    Bold,
    Playful,
    Corporate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub heading_style: HeadingStyle,
    pub body_style: BodyStyle,
    pub weight: WeightClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<LetterSpacing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingStyle {
    SansSerif,
    Serif,
    Display,
    Monospace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyStyle {
    SansSerif,
    Serif,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    Light,
    Regular,
    Bold,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterSpacing {
    Tight,
    Normal,
    Wide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStyle {
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// Degrees; 0 runs top to bottom, 90 left to right.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    pub colors: Vec<String>,
    /// Stop positions in 0..=1, evenly distributed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowStyle {
    #[serde(rename = "type")]
    pub kind: ShadowKind,
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowKind {
    Soft,
    Hard,
    Glow,
    #[serde(rename = "none")]
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorativeElement {
    #[serde(rename = "type")]
    pub kind: DecorativeShape,
    pub position: DecorativePosition,
    pub color: String,
    pub opacity: f64,
    /// Relative to the canvas, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorativeShape {
    Line,
    Circle,
    Rectangle,
    Blob,
    Dots,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecorativePosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Background,
    Border,
}

/// Facts scraped from raw markup before any model is consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub og_image: Option<String>,
    pub colors: Vec<String>,
    pub font_families: Vec<String>,
    pub links: Vec<ScrapedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedLink {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTemplate {
    pub name: String,
    pub layout: TemplateLayout,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    pub elements: Vec<TemplateElement>,
}

impl GeneratedTemplate {
    pub fn element(&self, id: &str) -> Option<&TemplateElement> {
        self.elements.iter().find(|el| el.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateLayout {
    Classic,
    Modern,
    Minimal,
    Bold,
}

impl TemplateLayout {
    pub const ALL: [TemplateLayout; 4] = [
        TemplateLayout::Classic,
        TemplateLayout::Modern,
        TemplateLayout::Minimal,
        TemplateLayout::Bold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateLayout::Classic => "classic",
            TemplateLayout::Modern => "modern",
            TemplateLayout::Minimal => "minimal",
            TemplateLayout::Bold => "bold",
        }
    }

    /// Whether posters in this layout carry the event logo.
    pub fn has_logo(self) -> bool {
        !matches!(self, TemplateLayout::Minimal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    pub properties: ElementProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Text,
    Image,
    Shape,
    Logo,
    GradientBg,
    Decorative,
}

/// Geometry is expressed in percentages (0-100) of the poster canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProperties {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Renderer-specific keys the model may add.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementProperties {
    pub fn at(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Look requested for a generated background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    Modern,
    Minimal,
    Bold,
}

impl BackgroundStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundStyle::Modern => "modern",
            BackgroundStyle::Minimal => "minimal",
            BackgroundStyle::Bold => "bold",
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackgroundStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(BackgroundStyle::Modern),
            "minimal" => Ok(BackgroundStyle::Minimal),
            "bold" => Ok(BackgroundStyle::Bold),
            other => Err(format!("unknown background style: {other}")),
        }
    }
}

/// Accepts `YYYY-MM-DD` or any string starting with one (e.g. a full
/// timestamp). Anything else, including `null` and numbers, becomes `None`.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s
            .trim()
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()),
        _ => None,
    })
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parsed_event_uses_camel_case_wire_names() {
        let mut event = ParsedEventData::named("RustConf");
        event.start_date = NaiveDate::from_ymd_opt(2025, 9, 2);
        event.hero_image_url = Some("https://example.com/hero.png".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["startDate"], "2025-09-02");
        assert_eq!(value["heroImageUrl"], "https://example.com/hero.png");
        assert!(value.get("endDate").is_none());
    }

    #[test]
    fn dates_are_read_leniently() {
        let event: ParsedEventData = serde_json::from_value(json!({
            "name": "X",
            "startDate": "2025-03-15T09:00:00Z",
            "endDate": "sometime soon"
        }))
        .unwrap();
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(event.end_date, None);
    }

    #[test]
    fn numeric_or_structured_dates_become_absent() {
        let event: ParsedEventData = serde_json::from_value(json!({
            "name": "X",
            "startDate": 20250315,
            "endDate": { "day": 17 }
        }))
        .unwrap();
        assert_eq!(event.start_date, None);
        assert_eq!(event.end_date, None);
    }

    #[test]
    fn element_kinds_round_trip_their_wire_spelling() {
        let element: TemplateElement = serde_json::from_value(json!({
            "id": "background-gradient",
            "type": "gradient-bg",
            "zIndex": 0,
            "properties": { "x": 0, "y": 0, "width": 100, "height": 100, "fontWeight": 800, "glow": true }
        }))
        .unwrap();
        assert_eq!(element.kind, ElementKind::GradientBg);
        assert_eq!(element.properties.font_weight.as_deref(), Some("800"));
        assert_eq!(element.properties.extra.get("glow"), Some(&json!(true)));
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "gradient-bg");
        assert_eq!(back["properties"]["glow"], true);
    }

    #[test]
    fn shadow_none_maps_to_flat() {
        let shadow: ShadowStyle = serde_json::from_value(json!({
            "type": "none", "color": "#000000", "blur": 0, "offsetX": 0, "offsetY": 0
        }))
        .unwrap();
        assert_eq!(shadow.kind, ShadowKind::Flat);
    }

    #[test]
    fn background_style_parses_case_insensitively() {
        assert_eq!("Bold".parse::<BackgroundStyle>(), Ok(BackgroundStyle::Bold));
        assert!("loud".parse::<BackgroundStyle>().is_err());
    }
}
