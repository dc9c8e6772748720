use once_cell::sync::Lazy;

use super::{json_instructions, OutputSchema, PromptTemplate};
use crate::error::Result;
use crate::merge::normalize_event;
use crate::types::{ParsedEventData, ScrapedData};

static SCHEMA: Lazy<OutputSchema> =
    Lazy::new(|| OutputSchema::bundled(include_str!("../../schemas/event_parsing.schema.json")));

pub struct EventParsingInput<'a> {
    pub url: &'a str,
    /// Hints scraped from the page markup, offered to the vision model.
    pub scraped: Option<&'a ScrapedData>,
}

/// Extracts event facts and visual identity from a URL or a screenshot.
pub struct EventParsingTemplate;

const TEXT_SCHEMA_EXAMPLE: &str = r##"{
  "name": "Event name",
  "description": "Brief description",
  "startDate": "YYYY-MM-DD",
  "endDate": "YYYY-MM-DD or null",
  "location": {
    "venue": "Venue name or null",
    "city": "City",
    "country": "Country",
    "isVirtual": true/false
  },
  "brandColors": {
    "primary": "#hexcolor",
    "secondary": "#hexcolor or null"
  },
  "logoUrl": "URL or null",
  "organizerName": "Organizer name or null"
}"##;

const VISION_SCHEMA_EXAMPLE: &str = r##"{
  "name": "Event name (required)",
  "description": "One or two sentence description",
  "startDate": "YYYY-MM-DD or null",
  "endDate": "YYYY-MM-DD or null",
  "location": {
    "venue": "Venue name or null",
    "city": "City name",
    "country": "Country name",
    "isVirtual": true/false
  },
  "brandColors": {
    "primary": "#RRGGBB dominant brand color",
    "secondary": "#RRGGBB secondary color or null",
    "accent": "#RRGGBB accent / call-to-action color or null",
    "background": "#RRGGBB main background",
    "text": "#RRGGBB main text color"
  },
  "logoUrl": "Logo URL or null",
  "organizerName": "Organizer name or null",
  "visualStyle": {
    "style": "modern|classic|minimal|bold|playful|corporate",
    "typography": {
      "headingStyle": "sans-serif|serif|display|monospace",
      "bodyStyle": "sans-serif|serif",
      "weight": "light|regular|bold|heavy",
      "letterSpacing": "tight|normal|wide"
    },
    "gradient": {
      "type": "linear|radial",
      "angle": 135,
      "colors": ["#start", "#end"],
      "positions": [0, 1]
    },
    "shadow": {
      "type": "soft|hard|glow|none",
      "color": "#000000",
      "blur": 20,
      "offsetX": 0,
      "offsetY": 10
    },
    "decorativeElements": [
      {
        "type": "line|circle|rectangle|blob|dots|grid",
        "position": "top-left|top-right|bottom-left|bottom-right|background|border",
        "color": "#RRGGBB",
        "opacity": 0.5,
        "size": 30
      }
    ],
    "designElements": ["gradient", "rounded-corners", "cards"]
  },
  "heroImageUrl": "Hero image URL or null"
}"##;

const VISUAL_GUIDE: &str = r#"VISUAL ANALYSIS GUIDE

1. Gradients (hero sections, buttons, overlays):
   - "linear": colors change along one direction; give the angle (0 = top to bottom, 90 = left to right, 135 = diagonal)
   - "radial": colors spread out from a center point
   - list the 2-3 colors that make up the gradient
   - use null when there is no visible gradient

2. Shadows (cards, buttons, images):
   - "soft": blurred and subtle
   - "hard": crisp edge with no blur
   - "glow": colored halo around elements
   - "none": flat design

3. Decorative elements:
   - geometric shapes such as circles, lines, blobs, dot patterns or grids
   - report where they sit, their color and their transparency

4. Typography:
   - "display" headings are decorative or distinctive typefaces
   - "heavy" weight is extra bold
   - "tight" letter spacing reads as technical, "wide" as elegant

5. Overall style:
   - "modern": gradients, soft shadows, sans-serif, generous whitespace
   - "bold": high contrast, saturated colors, hard shadows
   - "playful": rounded shapes, bright colors, glows
   - "minimal": few colors, no decoration, lots of space
   - "corporate": muted colors, structured, professional
   - "classic": serif type, traditional layout"#;

fn or_missing(value: Option<&str>) -> &str {
    value.unwrap_or("Not found")
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(", ")
    }
}

impl EventParsingTemplate {
    /// Prompt for the screenshot-based path, carrying scraped hints the model
    /// can confirm or override.
    pub fn build_vision_prompt(&self, input: &EventParsingInput<'_>) -> String {
        let hints = input
            .scraped
            .map(|s| {
                format!(
                    "\nData already extracted from the page HTML:\n\
                     - Title: {}\n\
                     - Description: {}\n\
                     - Logo URL: {}\n\
                     - Hero/OG image: {}\n\
                     - Colors found in CSS: {}\n\
                     - Fonts: {}\n",
                    or_missing(s.title.as_deref()),
                    or_missing(s.description.as_deref()),
                    or_missing(s.logo_url.as_deref()),
                    or_missing(s.og_image.as_deref()),
                    list_or_none(&s.colors),
                    list_or_none(&s.font_families),
                )
            })
            .unwrap_or_default();

        format!(
            "Analyze this screenshot of an event or conference website. Capture its visual identity \
             so that posters generated from it feel like they belong to the event.\n\n\
             URL: {}\n{}\n\
             Respond with ONLY valid JSON and nothing else, using this shape:\n\n{}\n\n{}",
            input.url, hints, VISION_SCHEMA_EXAMPLE, VISUAL_GUIDE
        )
    }
}

impl PromptTemplate for EventParsingTemplate {
    type Input<'a> = EventParsingInput<'a>;
    type Output = ParsedEventData;

    fn id(&self) -> &'static str {
        "event-parsing"
    }

    /// Text-only prompt built from the URL alone.
    fn build(&self, input: &EventParsingInput<'_>) -> String {
        format!(
            "You extract event information. Given the URL of an event page, report what you know about the event.\n\n\
             URL: {}\n\n\
             Instructions:\n\
             - Fill in every field you can determine\n\
             - Use null for anything you cannot determine\n\
             - Infer brand colors from the event's website design\n\
             - Dates use the YYYY-MM-DD format\n\n{}",
            input.url,
            json_instructions(TEXT_SCHEMA_EXAMPLE)
        )
    }

    fn output_schema(&self) -> &'static OutputSchema {
        &SCHEMA
    }

    fn parse(&self, response: &str) -> Result<ParsedEventData> {
        let value = super::decode_json(response)?;
        SCHEMA.validate(&value)?;
        let event: ParsedEventData = serde_json::from_value(value)?;
        Ok(normalize_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn text_prompt_embeds_url_and_json_instruction() {
        let prompt = EventParsingTemplate.build(&EventParsingInput {
            url: "https://rustconf.com",
            scraped: None,
        });
        assert!(prompt.contains("URL: https://rustconf.com"));
        assert!(prompt.contains("Return ONLY valid JSON"));
        assert!(prompt.contains("\"organizerName\""));
    }

    #[test]
    fn vision_prompt_lists_scraped_hints() {
        let scraped = ScrapedData {
            title: Some("RustConf".to_string()),
            colors: vec!["#F74C00".to_string(), "#1E1E2E".to_string()],
            ..ScrapedData::default()
        };
        let prompt = EventParsingTemplate.build_vision_prompt(&EventParsingInput {
            url: "https://rustconf.com",
            scraped: Some(&scraped),
        });
        assert!(prompt.contains("- Title: RustConf"));
        assert!(prompt.contains("- Logo URL: Not found"));
        assert!(prompt.contains("- Colors found in CSS: #F74C00, #1E1E2E"));
        assert!(prompt.contains("- Fonts: None"));
        assert!(prompt.contains("VISUAL ANALYSIS GUIDE"));
    }

    #[test]
    fn parses_fenced_response_with_nulls() {
        let response = r##"```json
{
  "name": "RustConf 2025",
  "description": null,
  "startDate": "2025-09-02",
  "endDate": "2025-09-05",
  "location": { "venue": null, "city": "Seattle", "country": "USA", "isVirtual": null },
  "brandColors": { "primary": "#f74c00", "secondary": null },
  "logoUrl": null,
  "organizerName": "Rust Foundation"
}
```"##;
        let event = EventParsingTemplate.parse(response).unwrap();
        assert_eq!(event.name, "RustConf 2025");
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 9, 2));
        let location = event.location.unwrap();
        assert_eq!(location.city.as_deref(), Some("Seattle"));
        assert!(!location.is_virtual);
        assert_eq!(event.brand_colors.unwrap().primary, "#F74C00");
    }

    #[test]
    fn visual_style_conforms_to_schema() {
        let response = json!({
            "name": "Design Summit",
            "visualStyle": {
                "style": "minimal",
                "typography": { "headingStyle": "serif", "bodyStyle": "sans-serif", "weight": "regular" },
                "gradient": null,
                "shadow": { "type": "soft", "color": "#000000", "blur": 20, "offsetX": 0, "offsetY": 8 },
                "decorativeElements": [{ "type": "line", "position": "border", "color": "#E17055", "opacity": 1 }],
                "designElements": ["whitespace"]
            }
        })
        .to_string();
        let event = EventParsingTemplate.parse(&response).unwrap();
        let style = event.visual_style.unwrap();
        assert!(style.gradient.is_none());
        assert_eq!(style.decorative_elements.map(|d| d.len()), Some(1));
        assert!(SCHEMA.is_valid(&serde_json::to_value(ParsedEventData::named("x")).unwrap()));
    }

    #[test]
    fn model_dates_obey_start_before_end() {
        let event = EventParsingTemplate
            .parse(r#"{"name": "Expo", "startDate": "2025-06-12", "endDate": "2025-06-10"}"#)
            .unwrap();
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 6, 12));
        assert_eq!(event.end_date, None);

        let event = EventParsingTemplate
            .parse(r#"{"name": "Expo", "startDate": "next spring", "endDate": 1718150400}"#)
            .unwrap();
        assert_eq!(event.start_date, None);
        assert_eq!(event.end_date, None);

        let event = EventParsingTemplate
            .parse(r#"{"name": "Expo", "startDate": "2025-06-10", "endDate": "2025-06-12T18:00:00Z"}"#)
            .unwrap();
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 6, 10));
        assert_eq!(event.end_date, NaiveDate::from_ymd_opt(2025, 6, 12));
    }

    #[test]
    fn rejects_missing_name_and_unknown_enums() {
        let err = EventParsingTemplate.parse(r#"{"description": "no name"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parsing);

        let err = EventParsingTemplate
            .parse(r#"{"name": "X", "visualStyle": {"style": "grunge", "typography": {"headingStyle": "serif", "bodyStyle": "serif", "weight": "bold"}}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parsing);
    }

    #[test]
    fn schema_document_requires_name() {
        let doc = EventParsingTemplate.output_schema().document();
        assert_eq!(doc["required"], json!(["name"]));
    }
}
