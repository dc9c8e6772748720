use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{decode_json, OutputSchema, PromptTemplate};
use crate::constants::DEFAULT_PRIMARY_COLOR;
use crate::error::Result;
use crate::extract::{is_valid_hex, normalize_hex};
use crate::merge::normalize_element_colors;
use crate::mock::ensure_required_elements;
use crate::types::{
    GeneratedTemplate, ParsedEventData, TemplateElement, TemplateLayout, VisualStyle,
};

static SCHEMA: Lazy<OutputSchema> = Lazy::new(|| {
    OutputSchema::bundled(include_str!("../../schemas/template_generation.schema.json"))
});

pub struct TemplateGenerationInput<'a> {
    pub event: &'a ParsedEventData,
    pub count: usize,
    /// Layout families to rotate through; all four when unset.
    pub layouts: Option<&'a [TemplateLayout]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateGenerationOutput {
    pub templates: Vec<GeneratedTemplate>,
}

/// Synthesizes poster templates themed on an event's visual identity.
pub struct TemplateGenerationTemplate;

/// Template as the model wrote it; elements are decoded one by one so a
/// single malformed element does not sink the whole template.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplate {
    name: String,
    layout: TemplateLayout,
    background_color: String,
    #[serde(default)]
    background_image_url: Option<String>,
    elements: Vec<Value>,
}

const FEW_SHOT_EXAMPLES: &str = r##"EXAMPLE 1: MODERN TECH (gradient background, glow)
Event:
{
  "name": "TechConf 2024",
  "brandColors": { "primary": "#6C5CE7", "secondary": "#A29BFE" },
  "visualStyle": {
    "style": "modern",
    "gradient": { "type": "linear", "angle": 135, "colors": ["#6C5CE7", "#A29BFE"] },
    "shadow": { "type": "glow", "color": "#A29BFE", "blur": 30, "offsetX": 0, "offsetY": 0 }
  }
}
Template:
{
  "name": "Gradient Glow",
  "layout": "modern",
  "backgroundColor": "#6C5CE7",
  "elements": [
    { "id": "background-gradient", "type": "gradient-bg", "zIndex": 0, "properties": { "x": 0, "y": 0, "width": 100, "height": 100, "gradient": { "type": "linear", "angle": 135, "colors": ["#6C5CE7", "#A29BFE"] } } },
    { "id": "decorative-circle", "type": "decorative", "zIndex": 1, "properties": { "x": -10, "y": -10, "width": 40, "height": 40, "shapeType": "circle", "fill": "#FFFFFF", "opacity": 0.1 } },
    { "id": "event-name", "type": "text", "zIndex": 10, "properties": { "x": 5, "y": 8, "width": 90, "height": 12, "content": "TechConf 2024", "fill": "#FFFFFF", "fontSize": 42, "fontFamily": "Inter", "fontWeight": "800", "shadow": { "type": "glow", "color": "#A29BFE", "blur": 20, "offsetX": 0, "offsetY": 0 } } },
    { "id": "event-date", "type": "text", "zIndex": 10, "properties": { "x": 5, "y": 22, "width": 90, "height": 6, "content": "March 15-17, 2024", "fill": "#FFFFFF", "fontSize": 20, "fontFamily": "Inter", "fontWeight": "500", "opacity": 0.9 } },
    { "id": "attending-badge", "type": "shape", "zIndex": 10, "properties": { "x": 5, "y": 75, "width": 42, "height": 12, "fill": "#FFFFFF", "borderRadius": 8, "content": "I'm Attending!", "fontSize": 18, "fontFamily": "Inter", "fontWeight": "700" } },
    { "id": "user-photo", "type": "image", "zIndex": 10, "properties": { "x": 58, "y": 32, "width": 38, "height": 48, "borderRadius": 12, "shadow": { "type": "soft", "color": "#000000", "blur": 20, "offsetX": 0, "offsetY": 10 } } },
    { "id": "user-name", "type": "text", "zIndex": 10, "properties": { "x": 5, "y": 88, "width": 50, "height": 6, "content": "", "fill": "#FFFFFF", "fontSize": 16, "fontFamily": "Inter", "fontWeight": "600" } },
    { "id": "event-logo", "type": "logo", "zIndex": 10, "properties": { "x": 80, "y": 5, "width": 15, "height": 10 } }
  ]
}

EXAMPLE 2: MINIMAL ELEGANT (clean, subtle shadow)
Event:
{
  "name": "Design Summit",
  "brandColors": { "primary": "#2D3436", "secondary": "#E17055" },
  "visualStyle": {
    "style": "minimal",
    "shadow": { "type": "soft", "color": "#000000", "blur": 20, "offsetX": 0, "offsetY": 8 },
    "decorativeElements": [{ "type": "line", "position": "border", "color": "#E17055", "opacity": 1 }]
  }
}
Template:
{
  "name": "Clean Minimal",
  "layout": "minimal",
  "backgroundColor": "#FAFAFA",
  "elements": [
    { "id": "accent-line", "type": "decorative", "zIndex": 1, "properties": { "x": 0, "y": 0, "width": 100, "height": 1, "shapeType": "rectangle", "fill": "#E17055" } },
    { "id": "event-name", "type": "text", "zIndex": 10, "properties": { "x": 10, "y": 18, "width": 80, "height": 10, "content": "Design Summit", "fill": "#2D3436", "fontSize": 36, "fontFamily": "Playfair Display", "fontWeight": "500", "letterSpacing": 1 } },
    { "id": "event-date", "type": "text", "zIndex": 10, "properties": { "x": 10, "y": 30, "width": 80, "height": 5, "content": "June 20, 2024", "fill": "#636E72", "fontSize": 14, "fontFamily": "Inter", "fontWeight": "400" } },
    { "id": "attending-badge", "type": "text", "zIndex": 10, "properties": { "x": 10, "y": 44, "width": 80, "height": 6, "content": "I'm Attending", "fill": "#2D3436", "fontSize": 16, "fontFamily": "Inter", "fontWeight": "500" } },
    { "id": "user-photo", "type": "image", "zIndex": 10, "properties": { "x": 10, "y": 54, "width": 28, "height": 35, "borderRadius": 4 } },
    { "id": "user-name", "type": "text", "zIndex": 10, "properties": { "x": 44, "y": 65, "width": 46, "height": 6, "content": "", "fill": "#2D3436", "fontSize": 18, "fontFamily": "Playfair Display", "fontWeight": "500" } },
    { "id": "event-logo", "type": "logo", "zIndex": 10, "properties": { "x": 78, "y": 85, "width": 12, "height": 8 } }
  ]
}

EXAMPLE 3: BOLD PLAYFUL (strong colors, hard shadows, blocks)
Event:
{
  "name": "Startup Week",
  "brandColors": { "primary": "#00B894", "accent": "#FDCB6E" },
  "visualStyle": {
    "style": "bold",
    "shadow": { "type": "hard", "color": "#000000", "blur": 0, "offsetX": 4, "offsetY": 4 },
    "decorativeElements": [{ "type": "rectangle", "position": "background", "color": "#FDCB6E", "opacity": 0.3 }]
  }
}
Template:
{
  "name": "Bold Impact",
  "layout": "bold",
  "backgroundColor": "#00B894",
  "elements": [
    { "id": "decorative-block", "type": "decorative", "zIndex": 1, "properties": { "x": 60, "y": 0, "width": 40, "height": 100, "shapeType": "rectangle", "fill": "#FDCB6E", "opacity": 0.25 } },
    { "id": "event-name", "type": "text", "zIndex": 10, "properties": { "x": 5, "y": 5, "width": 55, "height": 18, "content": "STARTUP WEEK", "fill": "#FFFFFF", "fontSize": 44, "fontFamily": "Montserrat", "fontWeight": "900", "shadow": { "type": "hard", "color": "#000000", "blur": 0, "offsetX": 3, "offsetY": 3 } } },
    { "id": "attending-badge", "type": "shape", "zIndex": 10, "properties": { "x": 5, "y": 26, "width": 48, "height": 10, "fill": "#FDCB6E", "content": "I'M ATTENDING!", "fontSize": 18, "fontFamily": "Montserrat", "fontWeight": "800" } },
    { "id": "user-photo", "type": "image", "zIndex": 10, "properties": { "x": 5, "y": 42, "width": 45, "height": 48, "borderRadius": 0, "shadow": { "type": "hard", "color": "#000000", "blur": 0, "offsetX": 5, "offsetY": 5 } } },
    { "id": "user-name", "type": "text", "zIndex": 10, "properties": { "x": 55, "y": 50, "width": 40, "height": 8, "content": "", "fill": "#FFFFFF", "fontSize": 20, "fontFamily": "Montserrat", "fontWeight": "700" } },
    { "id": "event-logo", "type": "logo", "zIndex": 10, "properties": { "x": 55, "y": 65, "width": 20, "height": 14 } }
  ]
}"##;

const OUTPUT_SHAPE: &str = r##"{
  "templates": [
    {
      "name": "Template Name",
      "layout": "classic|modern|minimal|bold",
      "backgroundColor": "#RRGGBB",
      "elements": [
        {
          "id": "element-id",
          "type": "text|image|shape|logo|gradient-bg|decorative",
          "zIndex": 0,
          "properties": {
            "x": 0-100, "y": 0-100, "width": 0-100, "height": 0-100,
            "content": "text",
            "fill": "#RRGGBB",
            "fontSize": 24,
            "fontFamily": "Font Name",
            "fontWeight": "400-900",
            "opacity": 0-1,
            "borderRadius": 0-50,
            "gradient": { "type": "linear|radial", "angle": 0-360, "colors": ["#RRGGBB", "#RRGGBB"] },
            "shadow": { "type": "soft|hard|glow", "color": "#RRGGBB", "blur": 0-50, "offsetX": 0-20, "offsetY": 0-20 }
          }
        }
      ]
    }
  ]
}"##;

fn style_guidance(style: &VisualStyle) -> String {
    let gradient = style
        .gradient
        .as_ref()
        .map(|g| {
            format!(
                "{} gradient at {}°, colors: {}",
                wire_name(&g.kind),
                g.angle.unwrap_or(0.0),
                g.colors.join(" → ")
            )
        })
        .unwrap_or_else(|| "No gradient detected".to_string());

    let shadow = style
        .shadow
        .as_ref()
        .map(|s| {
            format!(
                "{} shadow (blur: {}, offset: {},{}, color: {})",
                wire_name(&s.kind),
                s.blur,
                s.offset_x,
                s.offset_y,
                s.color
            )
        })
        .unwrap_or_else(|| "No shadow style detected".to_string());

    let decorative = match style.decorative_elements.as_deref() {
        Some(elements) if !elements.is_empty() => elements
            .iter()
            .map(|d| {
                format!(
                    "{} at {} ({}, opacity: {})",
                    wire_name(&d.kind),
                    wire_name(&d.position),
                    d.color,
                    d.opacity
                )
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => "No decorative elements".to_string(),
    };

    let design_elements = if style.design_elements.is_empty() {
        "none specified".to_string()
    } else {
        style.design_elements.join(", ")
    };

    let spacing = style
        .typography
        .letter_spacing
        .map(|s| format!(", {} spacing", wire_name(&s)))
        .unwrap_or_default();

    format!(
        "\nVISUAL VIBE TO CAPTURE\n\
         The event website uses this visual language. Apply it to the templates.\n\n\
         Overall style: {}\n\
         Typography: {} headings, {} weight{}\n\n\
         GRADIENT: {}\n\
         → when a gradient is present, add a \"gradient-bg\" element as the background layer (zIndex 0)\n\n\
         SHADOWS: {}\n\
         → apply this shadow style to photos, badges and cards\n\n\
         DECORATIVE ELEMENTS: {}\n\
         → add similar shapes to match the event's aesthetic\n\n\
         Design elements: {}\n",
        wire_name(&style.style),
        wire_name(&style.typography.heading_style),
        wire_name(&style.typography.weight),
        spacing,
        gradient,
        shadow,
        decorative,
        design_elements
    )
}

/// The JSON spelling of a unit enum variant.
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn color_guidance(event: &ParsedEventData) -> String {
    let Some(colors) = &event.brand_colors else {
        return String::new();
    };
    let mut lines = vec![format!("Primary: {}", colors.primary)];
    for (label, value) in [
        ("Secondary", &colors.secondary),
        ("Accent", &colors.accent),
        ("Background", &colors.background),
    ] {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    }
    format!("\nBrand colors (use these):\n- {}\n", lines.join("\n- "))
}

/// Poster background for a template whose own color was unreadable.
fn fallback_background(event: &ParsedEventData) -> String {
    event
        .brand_colors
        .as_ref()
        .and_then(|c| c.background.clone().or_else(|| Some(c.primary.clone())))
        .and_then(|c| normalize_hex(&c))
        .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string())
}

impl TemplateGenerationTemplate {
    /// Keep at most `count` templates and give each the mandatory elements.
    pub fn finalize(
        &self,
        output: TemplateGenerationOutput,
        event: &ParsedEventData,
        count: usize,
    ) -> Vec<GeneratedTemplate> {
        let mut templates = output.templates;
        templates.truncate(count);
        for template in &mut templates {
            if !is_valid_hex(&template.background_color) {
                template.background_color = fallback_background(event);
            }
            for element in &mut template.elements {
                normalize_element_colors(&mut element.properties);
            }
            let added = ensure_required_elements(template, &event.name);
            if !added.is_empty() {
                warn!(template = %template.name, added = ?added, "Generated template lacked required elements");
            }
        }
        templates
    }

    fn decode_template(raw: RawTemplate) -> GeneratedTemplate {
        let total = raw.elements.len();
        let elements: Vec<TemplateElement> = raw
            .elements
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<TemplateElement>(value) {
                Ok(mut element) => {
                    normalize_element_colors(&mut element.properties);
                    Some(element)
                }
                Err(e) => {
                    debug!(error = %e, "Dropping malformed template element");
                    None
                }
            })
            .collect();
        if elements.len() < total {
            debug!(template = %raw.name, dropped = total - elements.len(), "Template elements dropped");
        }

        GeneratedTemplate {
            background_color: normalize_hex(&raw.background_color).unwrap_or(raw.background_color),
            name: raw.name,
            layout: raw.layout,
            background_image_url: raw.background_image_url,
            elements,
        }
    }
}

impl PromptTemplate for TemplateGenerationTemplate {
    type Input<'a> = TemplateGenerationInput<'a>;
    type Output = TemplateGenerationOutput;

    fn id(&self) -> &'static str {
        "template-generation"
    }

    fn build(&self, input: &TemplateGenerationInput<'_>) -> String {
        let layouts = input
            .layouts
            .unwrap_or(&TemplateLayout::ALL)
            .iter()
            .take(input.count)
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let event_json = serde_json::to_string_pretty(input.event)
            .unwrap_or_else(|_| format!("{{\"name\": {:?}}}", input.event.name));
        let style = input
            .event
            .visual_style
            .as_ref()
            .map(style_guidance)
            .unwrap_or_default();

        format!(
            "You are an expert poster designer. Create {count} UNIQUE \"I'm attending\" poster templates \
             that capture the visual vibe of this event.\n\n\
             {examples}\n\n\
             NOW GENERATE FOR THIS EVENT\n\n\
             Event details:\n{event_json}\n{style}{colors}\n\
             REQUIREMENTS:\n\n\
             1. Create {count} visually distinct templates, one per layout: {layouts}\n\n\
             2. Apply the visual vibe:\n\
             \x20  - detected gradient → a \"gradient-bg\" background element (zIndex 0)\n\
             \x20  - use the detected shadow style on user-photo, badges and cards\n\
             \x20  - include decorative shapes that match the event's aesthetic\n\
             \x20  - follow the detected typography (weight, letter spacing)\n\n\
             3. Every template must contain these elements:\n\
             \x20  - \"event-name\" (text): event title\n\
             \x20  - \"event-date\" (text): date\n\
             \x20  - \"attending-badge\" (text or shape): \"I'm Attending!\"\n\
             \x20  - \"user-photo\" (image): the id MUST be \"user-photo\"\n\
             \x20  - \"user-name\" (text): placeholder for the attendee name\n\
             \x20  - \"event-logo\" (logo): the id MUST be \"event-logo\"\n\n\
             4. Element types:\n\
             \x20  - \"gradient-bg\": full-canvas gradient (x 0, y 0, width 100, height 100)\n\
             \x20  - \"decorative\": shapes, lines and circles\n\
             \x20  - \"text\": text content, optionally with shadow or gradient\n\
             \x20  - \"shape\": badges and buttons with borderRadius\n\
             \x20  - \"image\": the attendee photo\n\
             \x20  - \"logo\": the event logo\n\n\
             5. Layer order (zIndex): 0 background gradients, 1-5 decoration, 10 and above content\n\n\
             6. Positions and sizes are percentages (0-100) of the canvas\n\n\
             RESPOND WITH ONLY VALID JSON:\n{shape}",
            count = input.count,
            examples = FEW_SHOT_EXAMPLES,
            event_json = event_json,
            style = style,
            colors = color_guidance(input.event),
            layouts = layouts,
            shape = OUTPUT_SHAPE,
        )
    }

    fn output_schema(&self) -> &'static OutputSchema {
        &SCHEMA
    }

    /// Models sometimes answer with the bare template array.
    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Array(templates) => serde_json::json!({ "templates": templates }),
            other => other,
        }
    }

    fn parse(&self, response: &str) -> Result<TemplateGenerationOutput> {
        let value = self.normalize(decode_json(response)?);
        SCHEMA.validate(&value)?;

        #[derive(Deserialize)]
        struct Envelope {
            templates: Vec<RawTemplate>,
        }
        let envelope: Envelope = serde_json::from_value(value)?;

        Ok(TemplateGenerationOutput {
            templates: envelope.templates.into_iter().map(Self::decode_template).collect(),
        })
    }
}
