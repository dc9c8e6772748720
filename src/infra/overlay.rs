//! Best-effort removal of cookie banners, consent dialogs and modal overlays
//! before a page is captured.
//!
//! The page script only gathers and tags candidates; the keep/remove decision
//! is made here so it can be tested without a browser.

use serde::Deserialize;
use tracing::debug;

use crate::app::ports::PagePort;
use crate::error::Result;

pub const MARKER_ATTRIBUTE: &str = "data-event-vibe-overlay";

/// Stacking order above which a fixed element is treated as an overlay.
const OVERLAY_Z_INDEX: i64 = 1000;
/// Selector matches shorter than this are banners rather than content.
const BANNER_MAX_HEIGHT: f64 = 300.0;

/// Collects candidates, tags each with [`MARKER_ATTRIBUTE`] and returns a
/// JSON string `{ viewportWidth, candidates }`.
pub const COLLECT_SCRIPT: &str = r#"(() => {
  const MARK = 'data-event-vibe-overlay';
  const selectors = [
    '[class*="cookie"]', '[id*="cookie"]',
    '[class*="consent"]', '[id*="consent"]',
    '[class*="gdpr"]', '[id*="gdpr"]',
    '[class*="popup"]', '[class*="modal"]', '[class*="overlay"]',
    '[class*="newsletter"]', '[class*="subscribe"]',
    '#onetrust-consent-sdk', '#CybotCookiebotDialog',
    '.cc-banner', '.cookie-banner', '.cookie-notice',
    '[style*="position: fixed"]'
  ];
  const seen = new Set();
  const candidates = [];
  const describe = (el, source) => {
    if (seen.has(el)) return;
    seen.add(el);
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const marker = String(candidates.length);
    el.setAttribute(MARK, marker);
    const z = parseInt(style.zIndex, 10);
    candidates.push({
      marker,
      source,
      width: rect.width,
      height: rect.height,
      inlinePosition: (el.style && el.style.position) || '',
      computedPosition: style.position || '',
      zIndex: Number.isNaN(z) ? null : z,
      className: el.classList ? el.classList.toString() : ''
    });
  };
  selectors.forEach((selector) => {
    try {
      document.querySelectorAll(selector).forEach((el) => describe(el, 'selector'));
    } catch (e) {}
  });
  document.querySelectorAll('*').forEach((el) => {
    if (window.getComputedStyle(el).position === 'fixed') describe(el, 'sweep');
  });
  return JSON.stringify({ viewportWidth: window.innerWidth, candidates });
})()"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Matched one of the consent/popup selectors.
    Selector,
    /// Found by the sweep over fixed-position elements.
    Sweep,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayCandidate {
    pub marker: String,
    pub source: CandidateSource,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub inline_position: String,
    #[serde(default)]
    pub computed_position: String,
    #[serde(default)]
    pub z_index: Option<i64>,
    #[serde(default)]
    pub class_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverlayScan {
    viewport_width: f64,
    candidates: Vec<OverlayCandidate>,
}

/// Whether a tagged candidate should be removed from the page.
pub fn should_remove(candidate: &OverlayCandidate, viewport_width: f64) -> bool {
    let selector_hit = candidate.source == CandidateSource::Selector
        && (candidate.height < BANNER_MAX_HEIGHT
            || (candidate.width - viewport_width).abs() < 0.5
            || candidate.inline_position == "fixed");

    let fixed_overlay = candidate.computed_position == "fixed"
        && (candidate.z_index.map_or(false, |z| z > OVERLAY_Z_INDEX)
            || candidate.class_name.contains("modal")
            || candidate.class_name.contains("overlay"));

    selector_hit || fixed_overlay
}

/// Removes the tagged elements whose markers are listed and untags the rest.
pub fn removal_script(markers: &[String]) -> String {
    let list = serde_json::to_string(markers).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"((markers) => {{
  const MARK = '{mark}';
  let removed = 0;
  document.querySelectorAll('[' + MARK + ']').forEach((el) => {{
    if (markers.includes(el.getAttribute(MARK))) {{
      el.remove();
      removed += 1;
    }} else {{
      el.removeAttribute(MARK);
    }}
  }});
  return String(removed);
}})({list})"#,
        mark = MARKER_ATTRIBUTE,
        list = list
    )
}

/// Run one cleanup pass. Returns how many elements were removed.
pub async fn remove_overlays(page: &dyn PagePort) -> Result<usize> {
    let raw = page.evaluate(COLLECT_SCRIPT).await?;
    let scan: OverlayScan = serde_json::from_str(&raw)?;

    let doomed: Vec<String> = scan
        .candidates
        .iter()
        .filter(|c| should_remove(c, scan.viewport_width))
        .map(|c| c.marker.clone())
        .collect();

    debug!(
        candidates = scan.candidates.len(),
        removing = doomed.len(),
        "Overlay scan complete"
    );

    let removed = page.evaluate(&removal_script(&doomed)).await?;
    Ok(removed.trim().parse().unwrap_or(doomed.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: CandidateSource, width: f64, height: f64) -> OverlayCandidate {
        OverlayCandidate {
            marker: "0".to_string(),
            source,
            width,
            height,
            inline_position: String::new(),
            computed_position: "static".to_string(),
            z_index: None,
            class_name: String::new(),
        }
    }

    #[test]
    fn short_selector_matches_are_banners() {
        assert!(should_remove(&candidate(CandidateSource::Selector, 600.0, 120.0), 1280.0));
        assert!(!should_remove(&candidate(CandidateSource::Selector, 600.0, 900.0), 1280.0));
    }

    #[test]
    fn full_width_or_inline_fixed_selector_matches_go() {
        assert!(should_remove(&candidate(CandidateSource::Selector, 1280.0, 900.0), 1280.0));

        let mut fixed = candidate(CandidateSource::Selector, 500.0, 900.0);
        fixed.inline_position = "fixed".to_string();
        assert!(should_remove(&fixed, 1280.0));
    }

    #[test]
    fn sweep_needs_fixed_position_and_overlay_traits() {
        let mut tall = candidate(CandidateSource::Sweep, 400.0, 900.0);
        tall.computed_position = "fixed".to_string();
        assert!(!should_remove(&tall, 1280.0), "fixed nav bars stay");

        tall.z_index = Some(9999);
        assert!(should_remove(&tall, 1280.0));

        let mut modal = candidate(CandidateSource::Sweep, 400.0, 900.0);
        modal.computed_position = "fixed".to_string();
        modal.class_name = "signup-modal open".to_string();
        assert!(should_remove(&modal, 1280.0));

        // Short sweep finds are not banners by size alone.
        let mut short = candidate(CandidateSource::Sweep, 100.0, 40.0);
        short.computed_position = "fixed".to_string();
        assert!(!should_remove(&short, 1280.0));
    }

    #[test]
    fn removal_script_embeds_markers() {
        let script = removal_script(&["1".to_string(), "7".to_string()]);
        assert!(script.ends_with(r#"})(["1","7"])"#));
        assert!(script.contains(MARKER_ATTRIBUTE));
    }

    #[test]
    fn scan_payload_decodes() {
        let raw = r#"{"viewportWidth":1280,"candidates":[{"marker":"0","source":"sweep","width":1280,"height":80,"inlinePosition":"","computedPosition":"fixed","zIndex":null,"className":"cookie-bar"}]}"#;
        let scan: OverlayScan = serde_json::from_str(raw).unwrap();
        assert_eq!(scan.candidates[0].source, CandidateSource::Sweep);
        assert!(!should_remove(&scan.candidates[0], scan.viewport_width));
    }
}
