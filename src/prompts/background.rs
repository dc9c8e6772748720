//! Background artwork prompt and its placeholder substitute.

use crate::constants::{DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR, PLACEHOLDER_IMAGE_BASE};
use crate::types::{BackgroundStyle, ParsedEventData};

const DEFAULT_THEME: &str = "professional technology conference";

/// Checked in order; the first table entry with a matching keyword wins.
const THEMES: &[(&[&str], &str)] = &[
    (
        &["ai", "artificial intelligence", "machine learning"],
        "AI and machine learning technology, neural networks, data flows",
    ),
    (
        &["web", "frontend", "javascript"],
        "web development, digital interfaces, code aesthetics",
    ),
    (
        &["startup", "entrepreneur"],
        "innovation, growth, entrepreneurship, dynamic energy",
    ),
    (
        &["design", "ux", "ui"],
        "design thinking, creative flow, user experience",
    ),
    (
        &["devops", "cloud", "infrastructure"],
        "cloud computing, infrastructure, connected systems",
    ),
    (
        &["data", "analytics"],
        "data visualization, analytics, information flow",
    ),
    (
        &["security", "cyber"],
        "cybersecurity, digital protection, encrypted networks",
    ),
    (
        &["mobile", "app"],
        "mobile technology, app interfaces, connected devices",
    ),
    (
        &["game", "gaming"],
        "gaming, interactive entertainment, digital worlds",
    ),
];

fn detect_theme(context: &str) -> &'static str {
    THEMES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| context.contains(kw)))
        .map(|(_, theme)| *theme)
        .unwrap_or(DEFAULT_THEME)
}

fn style_description(style: BackgroundStyle) -> &'static str {
    match style {
        BackgroundStyle::Modern => {
            "modern and sleek with smooth gradients, soft glows, and flowing organic shapes"
        }
        BackgroundStyle::Minimal => {
            "minimal and clean with subtle textures, fine lines, and elegant simplicity"
        }
        BackgroundStyle::Bold => {
            "bold and vibrant with high contrast, strong geometric shapes, and dynamic energy"
        }
    }
}

/// Image-generation prompt for a full-bleed poster background.
pub fn build_background_prompt(event: &ParsedEventData, style: BackgroundStyle) -> String {
    let colors = event.brand_colors.as_ref();
    let primary = colors.map(|c| c.primary.as_str()).unwrap_or(DEFAULT_PRIMARY_COLOR);
    let secondary = colors.and_then(|c| c.secondary.as_deref()).unwrap_or(primary);

    let context = format!(
        "{} {}",
        event.name,
        event.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let theme = detect_theme(&context);

    format!(
        "Create a full-bleed abstract background for the \"{name}\" event poster.\n\n\
         EVENT THEME: {theme}\n\n\
         COLOR PALETTE (MUST USE):\n\
         - PRIMARY: {primary} (dominant, 60-70%)\n\
         - SECONDARY: {secondary} (accent, 20-30%)\n\n\
         VISUAL STYLE: {style}\n\n\
         REQUIREMENTS:\n\
         - Abstract design that evokes {theme}\n\
         - Full bleed to every edge: no borders, frames or margins\n\
         - No text, logos, people or faces\n\
         - Portrait orientation\n\
         - A slightly lighter, softer area toward the bottom center for overlaid text\n\
         - High-end conference aesthetic",
        name = event.name,
        theme = theme,
        primary = primary,
        secondary = secondary,
        style = style_description(style),
    )
}

/// Placeholder image in the event's colors.
pub fn placeholder_url(event: &ParsedEventData) -> String {
    let colors = event.brand_colors.as_ref();
    let primary = colors.map(|c| c.primary.as_str()).unwrap_or(DEFAULT_PRIMARY_COLOR);
    let secondary = colors
        .and_then(|c| c.secondary.as_deref())
        .unwrap_or(DEFAULT_SECONDARY_COLOR);
    format!(
        "{}/{}/{}?text=",
        PLACEHOLDER_IMAGE_BASE,
        primary.trim_start_matches('#'),
        secondary.trim_start_matches('#')
    )
}
