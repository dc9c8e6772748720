//! Reconciliation of model-asserted and scraped facts.

use tracing::debug;

use crate::extract::{normalize_hex, to_brand_colors};
use crate::types::{
    BrandColors, ElementProperties, GradientStyle, ParsedEventData, ScrapedData, ShadowStyle,
    VisualStyle,
};

/// Combine an AI result with scraped hints.
///
/// Brand colors come from the model when it supplied a usable palette and
/// otherwise from the first three scraped colors. The scraped logo wins over
/// the model's; the model's hero image wins over the Open-Graph image.
pub fn merge(ai: ParsedEventData, scraped: &ScrapedData) -> ParsedEventData {
    let mut merged = normalize_event(ai);

    if merged.brand_colors.is_none() {
        merged.brand_colors = to_brand_colors(&scraped.colors);
    }
    if let Some(logo) = &scraped.logo_url {
        merged.logo_url = Some(logo.clone());
    }
    if merged.hero_image_url.is_none() {
        merged.hero_image_url = scraped.og_image.clone();
    }

    merged
}

/// Clean up fields a model may get slightly wrong: color spelling and date
/// ordering.
pub fn normalize_event(mut event: ParsedEventData) -> ParsedEventData {
    event.brand_colors = event.brand_colors.and_then(normalize_brand_colors);
    event.visual_style = event.visual_style.map(normalize_visual_style);

    if let (Some(start), Some(end)) = (event.start_date, event.end_date) {
        if end < start {
            debug!(%start, %end, "Dropping end date earlier than start date");
            event.end_date = None;
        }
    }

    event
}

/// Expand and uppercase every color. An unusable primary drops the palette.
pub fn normalize_brand_colors(colors: BrandColors) -> Option<BrandColors> {
    let optional = |c: Option<String>| c.and_then(|c| normalize_hex(&c));
    Some(BrandColors {
        primary: normalize_hex(&colors.primary)?,
        secondary: optional(colors.secondary),
        accent: optional(colors.accent),
        background: optional(colors.background),
        text: optional(colors.text),
    })
}

/// Style colors that cannot be read as hex lose the piece they belong to.
pub fn normalize_visual_style(mut style: VisualStyle) -> VisualStyle {
    style.gradient = style.gradient.and_then(normalize_gradient);
    style.shadow = style.shadow.and_then(normalize_shadow);
    style.decorative_elements = style.decorative_elements.map(|elements| {
        elements
            .into_iter()
            .filter_map(|mut el| {
                el.color = normalize_hex(&el.color)?;
                Some(el)
            })
            .collect()
    });
    style
}

/// Unreadable stops are dropped; a gradient with no stops left is dropped.
pub fn normalize_gradient(mut gradient: GradientStyle) -> Option<GradientStyle> {
    let total = gradient.colors.len();
    gradient.colors = gradient.colors.iter().filter_map(|c| normalize_hex(c)).collect();
    if gradient.colors.is_empty() {
        return None;
    }
    if gradient.colors.len() < total {
        // Stop positions no longer line up with the surviving colors.
        gradient.positions = None;
    }
    Some(gradient)
}

pub fn normalize_shadow(mut shadow: ShadowStyle) -> Option<ShadowStyle> {
    shadow.color = normalize_hex(&shadow.color)?;
    Some(shadow)
}

/// Normalize every color an element carries, dropping the ones that are not
/// hex.
pub fn normalize_element_colors(properties: &mut ElementProperties) {
    properties.fill = properties.fill.take().and_then(|c| normalize_hex(&c));
    properties.stroke_color = properties.stroke_color.take().and_then(|c| normalize_hex(&c));
    properties.gradient = properties.gradient.take().and_then(normalize_gradient);
    properties.shadow = properties.shadow.take().and_then(normalize_shadow);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scraped() -> ScrapedData {
        ScrapedData {
            logo_url: Some("https://site.dev/logo.svg".to_string()),
            og_image: Some("https://site.dev/og.png".to_string()),
            colors: vec!["#111111".to_string(), "#222222".to_string(), "#333333".to_string()],
            ..ScrapedData::default()
        }
    }

    #[test]
    fn scraped_palette_fills_missing_brand_colors() {
        let merged = merge(ParsedEventData::named("Expo"), &scraped());
        let colors = merged.brand_colors.unwrap();
        assert_eq!(colors.primary, "#111111");
        assert_eq!(colors.secondary.as_deref(), Some("#222222"));
        assert_eq!(colors.accent.as_deref(), Some("#333333"));
    }

    #[test]
    fn scraped_logo_wins_and_ai_hero_wins() {
        let mut ai = ParsedEventData::named("Expo");
        ai.logo_url = Some("https://cdn.ai/guessed-logo.png".to_string());
        ai.hero_image_url = Some("https://cdn.ai/hero.png".to_string());
        let merged = merge(ai, &scraped());
        assert_eq!(merged.logo_url.as_deref(), Some("https://site.dev/logo.svg"));
        assert_eq!(merged.hero_image_url.as_deref(), Some("https://cdn.ai/hero.png"));

        let merged = merge(ParsedEventData::named("Expo"), &scraped());
        assert_eq!(merged.hero_image_url.as_deref(), Some("https://site.dev/og.png"));
    }

    #[test]
    fn ai_palette_is_normalized_and_kept() {
        let mut ai = ParsedEventData::named("Expo");
        ai.brand_colors = Some(BrandColors {
            primary: "#f0a".to_string(),
            secondary: Some("blue".to_string()),
            accent: Some("#00b894".to_string()),
            background: None,
            text: None,
        });
        let colors = merge(ai, &scraped()).brand_colors.unwrap();
        assert_eq!(colors.primary, "#FF00AA");
        assert_eq!(colors.secondary, None);
        assert_eq!(colors.accent.as_deref(), Some("#00B894"));
    }

    #[test]
    fn invalid_ai_primary_defers_to_scraped_palette() {
        let mut ai = ParsedEventData::named("Expo");
        ai.brand_colors = Some(BrandColors {
            primary: "brand purple".to_string(),
            secondary: None,
            accent: None,
            background: None,
            text: None,
        });
        assert_eq!(merge(ai, &scraped()).brand_colors.unwrap().primary, "#111111");
    }

    #[test]
    fn inverted_dates_lose_the_end_date() {
        let mut ai = ParsedEventData::named("Expo");
        ai.start_date = NaiveDate::from_ymd_opt(2025, 5, 10);
        ai.end_date = NaiveDate::from_ymd_opt(2025, 5, 8);
        let event = normalize_event(ai);
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 5, 10));
        assert_eq!(event.end_date, None);
    }

    #[test]
    fn unreadable_style_colors_are_dropped() {
        let style: VisualStyle = serde_json::from_value(serde_json::json!({
            "style": "bold",
            "typography": { "headingStyle": "display", "bodyStyle": "sans-serif", "weight": "heavy" },
            "gradient": { "type": "linear", "colors": ["#0af", "teal", "#112233"], "positions": [0.0, 0.5, 1.0] },
            "shadow": { "type": "glow", "color": "rgba(0,0,0,0.4)", "blur": 10, "offsetX": 0, "offsetY": 0 },
            "decorativeElements": [
                { "type": "circle", "position": "top-left", "color": "#fff", "opacity": 0.2 },
                { "type": "blob", "position": "background", "color": "hotpink", "opacity": 0.5 }
            ]
        }))
        .unwrap();

        let style = normalize_visual_style(style);

        let gradient = style.gradient.unwrap();
        assert_eq!(gradient.colors, vec!["#00AAFF", "#112233"]);
        assert_eq!(gradient.positions, None);
        assert!(style.shadow.is_none());
        let decorative = style.decorative_elements.unwrap();
        assert_eq!(decorative.len(), 1);
        assert_eq!(decorative[0].color, "#FFFFFF");
    }

    #[test]
    fn element_colors_are_normalized_or_removed() {
        let mut props: ElementProperties = serde_json::from_value(serde_json::json!({
            "x": 0, "y": 0, "width": 10, "height": 10,
            "fill": "white",
            "strokeColor": "#abc",
            "shadow": { "type": "soft", "color": "black", "blur": 4, "offsetX": 0, "offsetY": 2 }
        }))
        .unwrap();

        normalize_element_colors(&mut props);

        assert_eq!(props.fill, None);
        assert_eq!(props.stroke_color.as_deref(), Some("#AABBCC"));
        assert!(props.shadow.is_none());
    }

    #[test]
    fn other_fields_pass_through() {
        let mut ai = ParsedEventData::named("Expo");
        ai.organizer_name = Some("Expo Org".to_string());
        ai.description = Some("Yearly expo".to_string());
        let merged = merge(ai, &ScrapedData::default());
        assert_eq!(merged.name, "Expo");
        assert_eq!(merged.organizer_name.as_deref(), Some("Expo Org"));
        assert_eq!(merged.description.as_deref(), Some("Yearly expo"));
        assert!(merged.brand_colors.is_none());
        assert!(merged.logo_url.is_none());
    }
}
