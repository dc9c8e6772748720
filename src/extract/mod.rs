//! Heuristic extraction of identity facts from raw page markup.
//!
//! Everything here is best effort: a selector that does not match, a URL that
//! cannot be resolved, or malformed CSS simply leaves the field empty.

pub mod css;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::types::{BrandColors, ScrapedData, ScrapedLink};

pub use css::{is_valid_hex, normalize_hex};

const MAX_COLORS: usize = 10;
const MAX_FONTS: usize = 5;
const MAX_LINKS: usize = 10;

const LOGO_SELECTORS: &[&str] = &[
    r#"link[rel="icon"]"#,
    r#"link[rel="shortcut icon"]"#,
    r#"link[rel="apple-touch-icon"]"#,
    r#"[class*="logo"] img"#,
    r#"[id*="logo"] img"#,
    "header img",
    "nav img",
    ".navbar img",
];

const LINK_KEYWORDS: &[&str] = &[
    "register", "ticket", "schedule", "agenda", "speaker", "venue", "location", "date", "when",
    "where",
];

/// Scrape identity hints from `html`, resolving relative URLs against `base_url`.
pub fn scrape(html: &str, base_url: &str) -> ScrapedData {
    let document = Html::parse_document(html);

    let data = ScrapedData {
        title: extract_title(&document),
        description: extract_description(&document),
        logo_url: extract_logo(&document, base_url),
        og_image: extract_og_image(&document, base_url),
        colors: extract_colors(&document),
        font_families: extract_fonts(&document),
        links: extract_links(&document),
    };

    debug!(
        title = data.title.as_deref().unwrap_or("unknown"),
        colors = data.colors.len(),
        fonts = data.font_families.len(),
        links = data.links.len(),
        "Scraped page markup"
    );
    data
}

/// First three scraped colors as primary / secondary / accent.
pub fn to_brand_colors(colors: &[String]) -> Option<BrandColors> {
    let primary = colors.first()?.clone();
    Some(BrandColors {
        primary,
        secondary: colors.get(1).cloned(),
        accent: colors.get(2).cloned(),
        background: None,
        text: None,
    })
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let value = document.select(&sel).next()?.value().attr(attr)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let text = document.select(&sel).next()?.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn meta_content(document: &Html, key: &str, value: &str) -> Option<String> {
    first_attr(document, &format!(r#"meta[{key}="{value}"]"#), "content")
}

fn extract_title(document: &Html) -> Option<String> {
    meta_content(document, "property", "og:title")
        .or_else(|| meta_content(document, "name", "twitter:title"))
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

fn extract_description(document: &Html) -> Option<String> {
    meta_content(document, "property", "og:description")
        .or_else(|| meta_content(document, "name", "description"))
        .or_else(|| meta_content(document, "name", "twitter:description"))
}

fn extract_logo(document: &Html, base_url: &str) -> Option<String> {
    for selector in LOGO_SELECTORS {
        let Some(element) = select_all(document, selector).into_iter().next() else {
            continue;
        };
        let src = element
            .value()
            .attr("src")
            .or_else(|| element.value().attr("href"))
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(src) = src {
            return resolve_url(src, base_url);
        }
    }
    None
}

fn extract_og_image(document: &Html, base_url: &str) -> Option<String> {
    let image = meta_content(document, "property", "og:image")
        .or_else(|| meta_content(document, "name", "twitter:image"))?;
    resolve_url(&image, base_url)
}

fn extract_colors(document: &Html) -> Vec<String> {
    let mut colors = Vec::new();

    for style in select_all(document, "style") {
        css::collect_colors(&style.text().collect::<String>(), &mut colors);
    }
    for element in select_all(document, "[style]") {
        if let Some(style) = element.value().attr("style") {
            css::collect_colors(style, &mut colors);
        }
    }

    if let Some(theme) = meta_content(document, "name", "theme-color").and_then(|c| normalize_hex(&c)) {
        if !colors.contains(&theme) {
            colors.push(theme);
        }
    }

    colors.truncate(MAX_COLORS);
    colors
}

fn extract_fonts(document: &Html) -> Vec<String> {
    let mut fonts = Vec::new();

    for link in select_all(document, r#"link[href*="fonts.googleapis.com"]"#) {
        if let Some(href) = link.value().attr("href") {
            css::collect_google_families(href, &mut fonts);
        }
    }
    for style in select_all(document, "style") {
        css::collect_fonts(&style.text().collect::<String>(), &mut fonts);
    }
    for element in select_all(document, r#"[style*="font-family"]"#) {
        if let Some(style) = element.value().attr("style") {
            css::collect_fonts(style, &mut fonts);
        }
    }

    fonts.truncate(MAX_FONTS);
    fonts
}

fn extract_links(document: &Html) -> Vec<ScrapedLink> {
    select_all(document, "a[href]")
        .into_iter()
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let text = anchor.text().collect::<String>();
            let text = text.trim();
            let lowered = text.to_lowercase();
            if href.is_empty() || !LINK_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                return None;
            }
            Some(ScrapedLink {
                text: text.to_string(),
                href: href.to_string(),
            })
        })
        .take(MAX_LINKS)
        .collect()
}

/// Resolve a possibly relative asset URL against the page URL.
pub fn resolve_url(src: &str, base_url: &str) -> Option<String> {
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    if src.starts_with("//") {
        return Some(format!("https:{src}"));
    }
    let origin = Url::parse(base_url).ok()?.origin().ascii_serialization();
    if src.starts_with('/') {
        Some(format!("{origin}{src}"))
    } else {
        Some(format!("{origin}/{src}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <!DOCTYPE html>
        <html>
        <head>
            <title> Fallback Title </title>
            <meta property="og:title" content="RustConf 2025">
            <meta name="description" content="The official Rust conference">
            <meta property="og:image" content="/img/hero.png">
            <meta name="theme-color" content="#f74c00">
            <link rel="icon" href="//cdn.example.com/favicon.ico">
            <link href="https://fonts.googleapis.com/css2?family=Fira+Sans:wght@400" rel="stylesheet">
            <style>
                body { font-family: 'Inter', sans-serif; color: #333333; }
                .hero { background: #1E1E2E; }
            </style>
        </head>
        <body>
            <header><img src="logo.svg"></header>
            <h1>Heading</h1>
            <div style="color: rgb(255, 0, 128)">accent</div>
            <a href="/tickets">Buy Tickets</a>
            <a href="/about">About us</a>
            <a href="">Register</a>
            <a href="/venue">Venue &amp; Location</a>
        </body>
        </html>
    "##;

    #[test]
    fn scrapes_meta_first() {
        let data = scrape(PAGE, "https://rustconf.com/2025/schedule");
        assert_eq!(data.title.as_deref(), Some("RustConf 2025"));
        assert_eq!(data.description.as_deref(), Some("The official Rust conference"));
        assert_eq!(data.og_image.as_deref(), Some("https://rustconf.com/img/hero.png"));
        assert_eq!(data.logo_url.as_deref(), Some("https://cdn.example.com/favicon.ico"));
    }

    #[test]
    fn scrapes_palette_and_fonts() {
        let data = scrape(PAGE, "https://rustconf.com/");
        assert_eq!(data.colors, vec!["#1E1E2E", "#FF0080", "#F74C00"]);
        assert_eq!(data.font_families, vec!["Fira Sans", "Inter"]);
    }

    #[test]
    fn keeps_only_keyword_links_with_href() {
        let data = scrape(PAGE, "https://rustconf.com/");
        let texts: Vec<&str> = data.links.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Buy Tickets", "Venue & Location"]);
    }

    #[test]
    fn title_falls_back_through_document_title_and_heading() {
        let data = scrape("<html><head><title>  </title></head><body><h1> Big Day </h1></body></html>", "https://x.io");
        assert_eq!(data.title.as_deref(), Some("Big Day"));
    }

    #[test]
    fn empty_markup_degrades_to_empty_fields() {
        let data = scrape("", "not a url");
        assert_eq!(data, ScrapedData::default());
    }

    #[test]
    fn relative_logo_needs_a_parsable_base() {
        let html = r#"<html><body><nav><img src="brand.png"></nav></body></html>"#;
        assert_eq!(scrape(html, "https://a.org/x/y").logo_url.as_deref(), Some("https://a.org/brand.png"));
        assert_eq!(scrape(html, "::nope::").logo_url, None);
    }

    #[test]
    fn palette_is_capped() {
        let styles: String = (0..15).map(|i| format!(".c{i}{{color:#{i:02}AB{i:02}}}")).collect();
        let html = format!("<html><head><style>{styles}</style></head></html>");
        assert_eq!(scrape(&html, "https://x.io").colors.len(), MAX_COLORS);
    }

    #[test]
    fn brand_colors_take_first_three() {
        let colors = vec!["#111111".to_string(), "#222222".to_string(), "#333333".to_string(), "#444444".to_string()];
        let brand = to_brand_colors(&colors).unwrap();
        assert_eq!(brand.primary, "#111111");
        assert_eq!(brand.secondary.as_deref(), Some("#222222"));
        assert_eq!(brand.accent.as_deref(), Some("#333333"));
        assert!(to_brand_colors(&[]).is_none());
    }
}
