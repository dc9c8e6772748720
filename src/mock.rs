//! Deterministic stand-in for the AI path.
//!
//! Every value is derived from the input URL (or event) so that repeated calls
//! agree, and the output has the same shape the AI path produces.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use url::Url;

use crate::constants::{ATTENDING_TEXT, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR};
use crate::types::{
    BrandColors, ElementKind, ElementProperties, EventLocation, GeneratedTemplate,
    ParsedEventData, TemplateElement, TemplateLayout,
};

pub const EVENT_NAME_ID: &str = "event-name";
pub const BADGE_ID: &str = "badge";
pub const USER_PHOTO_ID: &str = "user-photo";
pub const EVENT_LOGO_ID: &str = "event-logo";

const FALLBACK_EVENT_NAME: &str = "Conference Event";

static COLORS: [(&str, &str); 5] = [
    ("#6C5CE7", "#A29BFE"),
    ("#00B894", "#55EFC4"),
    ("#E17055", "#FAB1A0"),
    ("#0984E3", "#74B9FF"),
    ("#D63031", "#FF7675"),
];

struct City {
    city: &'static str,
    country: &'static str,
    venue: &'static str,
}

static CITIES: [City; 5] = [
    City { city: "San Francisco", country: "USA", venue: "Moscone Center" },
    City { city: "New York", country: "USA", venue: "Javits Center" },
    City { city: "London", country: "UK", venue: "ExCeL London" },
    City { city: "Berlin", country: "Germany", venue: "Messe Berlin" },
    City { city: "Tokyo", country: "Japan", venue: "Tokyo Big Sight" },
];

const FONTS: [&str; 3] = ["Arial", "Helvetica", "Georgia"];

struct TemplateConfig {
    name: &'static str,
    layout: TemplateLayout,
}

const TEMPLATE_CONFIGS: [TemplateConfig; 3] = [
    TemplateConfig { name: "Classic Professional", layout: TemplateLayout::Classic },
    TemplateConfig { name: "Modern Gradient", layout: TemplateLayout::Modern },
    TemplateConfig { name: "Minimal Clean", layout: TemplateLayout::Minimal },
];

#[derive(Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Rect {
    const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn properties(self) -> ElementProperties {
        ElementProperties::at(self.x, self.y, self.width, self.height)
    }
}

/// Fixed element placement per layout family.
struct LayoutGeometry {
    title: Rect,
    title_font_size: f64,
    badge: Rect,
    badge_font_size: f64,
    photo: Rect,
    logo: Option<Rect>,
}

impl LayoutGeometry {
    fn for_layout(layout: TemplateLayout) -> Self {
        match layout {
            TemplateLayout::Classic | TemplateLayout::Bold => Self {
                title: Rect::new(10.0, 10.0, 80.0, 15.0),
                title_font_size: 32.0,
                badge: Rect::new(10.0, 70.0, 40.0, 10.0),
                badge_font_size: 24.0,
                photo: Rect::new(60.0, 30.0, 30.0, 30.0),
                logo: Some(Rect::new(70.0, 5.0, 20.0, 10.0)),
            },
            TemplateLayout::Modern => Self {
                title: Rect::new(10.0, 60.0, 80.0, 15.0),
                title_font_size: 28.0,
                badge: Rect::new(10.0, 80.0, 40.0, 10.0),
                badge_font_size: 20.0,
                photo: Rect::new(25.0, 10.0, 50.0, 40.0),
                logo: Some(Rect::new(5.0, 5.0, 15.0, 8.0)),
            },
            TemplateLayout::Minimal => Self {
                title: Rect::new(10.0, 75.0, 80.0, 10.0),
                title_font_size: 24.0,
                badge: Rect::new(10.0, 88.0, 30.0, 8.0),
                badge_font_size: 16.0,
                photo: Rect::new(20.0, 15.0, 60.0, 50.0),
                logo: None,
            },
        }
    }
}

/// 31-multiplier rolling hash over UTF-16 code units, wrapping at 32 bits.
pub fn hash_url(url: &str) -> u32 {
    let hash = url
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        });
    hash.unsigned_abs()
}

fn title_case(words: &str) -> String {
    words
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_event_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return FALLBACK_EVENT_NAME.to_string();
    };

    if let Some(last) = parsed.path().split('/').filter(|p| !p.is_empty()).last() {
        return title_case(&last.replace('-', " "));
    }

    parsed
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host))
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_EVENT_NAME.to_string())
}

/// Synthesize event data for `url`, dated relative to today (UTC).
pub fn generate_event_data(url: &str) -> ParsedEventData {
    generate_event_data_at(url, Utc::now().date_naive())
}

pub fn generate_event_data_at(url: &str, today: NaiveDate) -> ParsedEventData {
    let hash = hash_url(url);
    let (primary, secondary) = COLORS[(hash % COLORS.len() as u32) as usize];
    let city = &CITIES[(hash % CITIES.len() as u32) as usize];

    let event_name = extract_event_name(url);
    let start = today + Duration::days(i64::from(hash % 180 + 30));
    let end = start + Duration::days(i64::from(hash % 3 + 1));
    let organizer = event_name.split(' ').next().unwrap_or(FALLBACK_EVENT_NAME);

    ParsedEventData {
        name: format!("{} {}", event_name, today.year()),
        description: Some(format!(
            "Join us for {} - the premier event for professionals",
            event_name
        )),
        start_date: Some(start),
        end_date: Some(end),
        location: Some(EventLocation {
            venue: Some(city.venue.to_string()),
            city: Some(city.city.to_string()),
            country: Some(city.country.to_string()),
            is_virtual: hash % 5 == 0,
        }),
        brand_colors: Some(BrandColors {
            primary: primary.to_string(),
            secondary: Some(secondary.to_string()),
            accent: None,
            background: None,
            text: None,
        }),
        logo_url: None,
        organizer_name: Some(format!("{} Events", organizer)),
        visual_style: None,
        hero_image_url: None,
    }
}

fn palette(event: &ParsedEventData) -> (String, String) {
    let colors = event.brand_colors.as_ref();
    let primary = colors
        .map(|c| c.primary.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string());
    let secondary = colors
        .and_then(|c| c.secondary.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string());
    (primary, secondary)
}

/// Up to three fixed-layout templates themed with the event palette.
pub fn generate_templates(event: &ParsedEventData, count: usize) -> Vec<GeneratedTemplate> {
    let (primary, secondary) = palette(event);

    TEMPLATE_CONFIGS
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, config)| {
            let (background, text, accent) = match config.layout {
                TemplateLayout::Modern => (primary.clone(), "#FFFFFF", secondary.clone()),
                TemplateLayout::Minimal => ("#F5F5F7".to_string(), "#1A1A2E", primary.clone()),
                _ => ("#FFFFFF".to_string(), "#1A1A2E", primary.clone()),
            };
            let font = FONTS[i % FONTS.len()];
            let geometry = LayoutGeometry::for_layout(config.layout);

            let mut elements = vec![
                title_element(&geometry, &event.name, text, font),
                badge_element(&geometry, &accent, font),
                photo_element(&geometry),
            ];
            if let Some(logo) = logo_element(&geometry) {
                elements.push(logo);
            }

            GeneratedTemplate {
                name: config.name.to_string(),
                layout: config.layout,
                background_color: background,
                background_image_url: None,
                elements,
            }
        })
        .collect()
}

fn title_element(geometry: &LayoutGeometry, name: &str, fill: &str, font: &str) -> TemplateElement {
    TemplateElement {
        id: EVENT_NAME_ID.to_string(),
        kind: ElementKind::Text,
        z_index: None,
        properties: ElementProperties {
            content: Some(name.to_string()),
            fill: Some(fill.to_string()),
            font_size: Some(geometry.title_font_size),
            font_family: Some(font.to_string()),
            ..geometry.title.properties()
        },
    }
}

fn badge_element(geometry: &LayoutGeometry, fill: &str, font: &str) -> TemplateElement {
    TemplateElement {
        id: BADGE_ID.to_string(),
        kind: ElementKind::Text,
        z_index: None,
        properties: ElementProperties {
            content: Some(ATTENDING_TEXT.to_string()),
            fill: Some(fill.to_string()),
            font_size: Some(geometry.badge_font_size),
            font_family: Some(font.to_string()),
            ..geometry.badge.properties()
        },
    }
}

fn photo_element(geometry: &LayoutGeometry) -> TemplateElement {
    TemplateElement {
        id: USER_PHOTO_ID.to_string(),
        kind: ElementKind::Image,
        z_index: None,
        properties: geometry.photo.properties(),
    }
}

fn logo_element(geometry: &LayoutGeometry) -> Option<TemplateElement> {
    geometry.logo.map(|rect| TemplateElement {
        id: EVENT_LOGO_ID.to_string(),
        kind: ElementKind::Logo,
        z_index: None,
        properties: rect.properties(),
    })
}

/// Add any mandatory element a generated template is missing, placed at the
/// layout's default position. Returns the ids that were added.
pub fn ensure_required_elements(template: &mut GeneratedTemplate, event_name: &str) -> Vec<&'static str> {
    let geometry = LayoutGeometry::for_layout(template.layout);
    let mut added = Vec::new();

    if template.element(EVENT_NAME_ID).is_none() {
        let fill = if template.layout == TemplateLayout::Modern { "#FFFFFF" } else { "#1A1A2E" };
        let mut title = title_element(&geometry, event_name, fill, FONTS[0]);
        title.z_index = Some(10);
        template.elements.push(title);
        added.push(EVENT_NAME_ID);
    }
    if template.element(USER_PHOTO_ID).is_none() {
        let mut photo = photo_element(&geometry);
        photo.z_index = Some(10);
        template.elements.push(photo);
        added.push(USER_PHOTO_ID);
    }
    if template.layout.has_logo() && template.element(EVENT_LOGO_ID).is_none() {
        if let Some(mut logo) = logo_element(&geometry) {
            logo.z_index = Some(10);
            template.elements.push(logo);
            added.push(EVENT_LOGO_ID);
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_rolling_31_hash() {
        assert_eq!(hash_url(""), 0);
        assert_eq!(hash_url("a"), 97);
        assert_eq!(hash_url("ab"), 97 * 31 + 98);
        // Long inputs wrap at 32 bits and report the magnitude.
        let long = "https://example.com/".repeat(20);
        let expected = long
            .encode_utf16()
            .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
            .unsigned_abs();
        assert_eq!(hash_url(&long), expected);
    }

    #[test]
    fn names_come_from_last_path_segment() {
        assert_eq!(extract_event_name("https://conf.io/2025/rust-nation-uk/"), "Rust Nation Uk");
        assert_eq!(extract_event_name("https://www.kubecon.io"), "kubecon");
        assert_eq!(extract_event_name("definitely not a url"), FALLBACK_EVENT_NAME);
    }

    #[test]
    fn event_data_follows_hash() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let url = "https://events.example.com/devops-days";
        let hash = hash_url(url);
        let event = generate_event_data_at(url, today);

        assert_eq!(event.name, "Devops Days 2025");
        assert_eq!(event.organizer_name.as_deref(), Some("Devops Events"));
        assert_eq!(
            event.description.as_deref(),
            Some("Join us for Devops Days - the premier event for professionals")
        );
        let start = event.start_date.unwrap();
        let end = event.end_date.unwrap();
        assert_eq!((start - today).num_days(), i64::from(hash % 180 + 30));
        assert_eq!((end - start).num_days(), i64::from(hash % 3 + 1));
        let location = event.location.unwrap();
        assert_eq!(location.is_virtual, hash % 5 == 0);
        assert_eq!(location.city.as_deref(), Some(CITIES[(hash % 5) as usize].city));
        assert_eq!(event.brand_colors.unwrap().primary, COLORS[(hash % 5) as usize].0);
    }

    #[test]
    fn templates_use_palette_or_defaults() {
        let mut event = ParsedEventData::named("Launch");
        let templates = generate_templates(&event, 3);
        assert_eq!(templates[1].background_color, DEFAULT_PRIMARY_COLOR);
        let badge = templates[1].element(BADGE_ID).unwrap();
        assert_eq!(badge.properties.fill.as_deref(), Some(DEFAULT_SECONDARY_COLOR));
        assert_eq!(badge.properties.content.as_deref(), Some(ATTENDING_TEXT));

        event.brand_colors = Some(BrandColors {
            primary: "#0984E3".to_string(),
            secondary: None,
            accent: None,
            background: None,
            text: None,
        });
        let templates = generate_templates(&event, 3);
        assert_eq!(templates[1].background_color, "#0984E3");
        let title = templates[0].element(EVENT_NAME_ID).unwrap();
        assert_eq!(title.properties.content.as_deref(), Some("Launch"));
        assert_eq!(title.properties.font_size, Some(32.0));
        assert!(templates[2].element(EVENT_LOGO_ID).is_none());
        assert_eq!(templates[2].element(USER_PHOTO_ID).unwrap().properties.width, 60.0);
    }

    #[test]
    fn repairs_missing_required_elements() {
        let mut template = GeneratedTemplate {
            name: "Bare".to_string(),
            layout: TemplateLayout::Bold,
            background_color: "#000000".to_string(),
            background_image_url: None,
            elements: vec![],
        };
        let added = ensure_required_elements(&mut template, "RustConf");
        assert_eq!(added, vec![EVENT_NAME_ID, USER_PHOTO_ID, EVENT_LOGO_ID]);
        assert!(ensure_required_elements(&mut template, "RustConf").is_empty());

        template.layout = TemplateLayout::Minimal;
        template.elements.retain(|el| el.id != EVENT_LOGO_ID);
        assert!(ensure_required_elements(&mut template, "RustConf").is_empty());
    }
}
