//! Color and font harvesting from CSS text.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})\b").expect("valid hex regex"));
static RGB_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rgb\((\d+),\s*(\d+),\s*(\d+)\)").expect("valid rgb regex")
});
static FONT_FAMILY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)font-family:\s*['"]?([^'";,}]+)"#).expect("valid font-family regex")
});
static GOOGLE_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"family=([^&:]+)").expect("valid google fonts regex"));

/// Grays, black and white carry no brand signal.
const COMMON_COLORS: &[&str] = &[
    "#000000", "#FFFFFF", "#333333", "#666666", "#999999", "#CCCCCC", "#F5F5F5", "#EEEEEE",
    "#DDDDDD",
];

const GENERIC_FONTS: &[&str] = &["sans-serif", "serif", "monospace", "cursive", "fantasy"];

/// Normalize `#RGB` / `#RRGGBB` to uppercase `#RRGGBB`.
pub fn normalize_hex(raw: &str) -> Option<String> {
    let digits = raw.trim().strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match digits.len() {
        6 => digits.to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_uppercase()))
}

pub fn is_valid_hex(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_common_color(hex: &str) -> bool {
    COMMON_COLORS.contains(&hex.to_ascii_uppercase().as_str())
}

fn rgb_to_hex(r: u32, g: u32, b: u32) -> String {
    format!("#{:02X}{:02X}{:02X}", r.min(255), g.min(255), b.min(255))
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Append every brand-relevant color literal in `css` to `colors`.
pub fn collect_colors(css: &str, colors: &mut Vec<String>) {
    for m in HEX_COLOR.find_iter(css) {
        if let Some(hex) = normalize_hex(m.as_str()) {
            if !is_common_color(&hex) {
                push_unique(colors, hex);
            }
        }
    }

    for caps in RGB_COLOR.captures_iter(css) {
        let channel = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        if let (Some(r), Some(g), Some(b)) = (channel(1), channel(2), channel(3)) {
            let hex = rgb_to_hex(r, g, b);
            if !is_common_color(&hex) {
                push_unique(colors, hex);
            }
        }
    }
}

/// Append non-generic `font-family` names declared in `css`.
pub fn collect_fonts(css: &str, fonts: &mut Vec<String>) {
    for caps in FONT_FAMILY.captures_iter(css) {
        let Some(font) = caps.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        if font.is_empty() || GENERIC_FONTS.contains(&font.to_lowercase().as_str()) {
            continue;
        }
        push_unique(fonts, font.to_string());
    }
}

/// Families requested by a Google Fonts stylesheet link.
pub fn collect_google_families(href: &str, fonts: &mut Vec<String>) {
    for caps in GOOGLE_FAMILY.captures_iter(href) {
        if let Some(family) = caps.get(1) {
            push_unique(fonts, family.as_str().replace('+', " "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_short_and_long_hex() {
        assert_eq!(normalize_hex("#abc").as_deref(), Some("#AABBCC"));
        assert_eq!(normalize_hex(" #6c5ce7 ").as_deref(), Some("#6C5CE7"));
        assert_eq!(normalize_hex("#12345"), None);
        assert_eq!(normalize_hex("red"), None);
        assert_eq!(normalize_hex("#GGGGGG"), None);
    }

    #[test]
    fn collects_hex_and_rgb_skipping_grays() {
        let mut colors = Vec::new();
        collect_colors(
            "body{color:#333;background:#fff} .cta{background:#E17055;border-color:rgb(9, 132, 227)} a{color:#e17055}",
            &mut colors,
        );
        assert_eq!(colors, vec!["#E17055".to_string(), "#0984E3".to_string()]);
    }

    #[test]
    fn ignores_eight_digit_hex() {
        let mut colors = Vec::new();
        collect_colors("div{color:#AABBCCDD}", &mut colors);
        assert!(colors.is_empty());
    }

    #[test]
    fn collects_named_fonts_only() {
        let mut fonts = Vec::new();
        collect_fonts(
            "h1{font-family: 'Playfair Display', serif} p{font-family: sans-serif} code{font-family:\"Fira Code\"}",
            &mut fonts,
        );
        assert_eq!(fonts, vec!["Playfair Display".to_string(), "Fira Code".to_string()]);
    }

    #[test]
    fn reads_google_font_families() {
        let mut fonts = Vec::new();
        collect_google_families(
            "https://fonts.googleapis.com/css2?family=Open+Sans:wght@400;700&family=Inter&display=swap",
            &mut fonts,
        );
        assert_eq!(fonts, vec!["Open Sans".to_string(), "Inter".to_string()]);
    }
}
