// src/services/parser.rs

//! Slot listing parser.
//!
//! Turns the booking page into an ordered list of [`ScheduleEntry`]. The page
//! groups slots by day; traversal is days → slots in document order. A page
//! showing the "no slots" notice, or lacking the listing container entirely,
//! is a normal empty result. A container that yields nothing is an error.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{RawSlot, ScheduleEntry, SelectorConfig};
use crate::utils::collapse_whitespace;

/// Parser with pre-compiled selectors for one page layout.
#[derive(Debug)]
pub struct SlotParser {
    base_url: Url,
    no_slots_marker: String,
    container: Selector,
    day: Selector,
    date: Selector,
    slot: Selector,
    time: Selector,
    instructor: Selector,
    link: Selector,
    link_attr: String,
}

impl SlotParser {
    /// Compile the configured selectors. `base_url` resolves relative links.
    pub fn from_config(config: &SelectorConfig, base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            no_slots_marker: collapse_whitespace(&config.no_slots_marker),
            container: Self::parse_selector(&config.container)?,
            day: Self::parse_selector(&config.day)?,
            date: Self::parse_selector(&config.date)?,
            slot: Self::parse_selector(&config.slot)?,
            time: Self::parse_selector(&config.time)?,
            instructor: Self::parse_selector(&config.instructor)?,
            link: Self::parse_selector(&config.link)?,
            link_attr: config.link_attr.clone(),
        })
    }

    /// Parse a page into entries, preserving document order.
    pub fn parse(&self, html: &str) -> Result<Vec<ScheduleEntry>> {
        let document = Html::parse_document(html);

        if self.shows_no_slots(&document) {
            log::info!("Page reports no published slots");
            return Ok(Vec::new());
        }

        let Some(container) = document.select(&self.container).next() else {
            log::info!("Listing container not present, treating as no slots");
            return Ok(Vec::new());
        };

        let day_count = container.select(&self.day).count();
        if day_count == 0 {
            return Err(AppError::parse("listing container has no day groups"));
        }

        let entries: Vec<ScheduleEntry> = self
            .raw_slots(container)
            .map(|raw| ScheduleEntry::from_fragments(&raw, &self.base_url))
            .collect();

        if entries.is_empty() {
            return Err(AppError::parse(format!(
                "{day_count} day groups but no slots"
            )));
        }

        log::debug!("Parsed {} slots across {} days", entries.len(), day_count);
        Ok(entries)
    }

    fn shows_no_slots(&self, document: &Html) -> bool {
        if self.no_slots_marker.is_empty() {
            return false;
        }
        let text: String = document.root_element().text().collect();
        collapse_whitespace(&text).contains(&self.no_slots_marker)
    }

    /// Days, then slots within each day, flattened lazily.
    fn raw_slots<'a>(&'a self, container: ElementRef<'a>) -> impl Iterator<Item = RawSlot> + 'a {
        container.select(&self.day).flat_map(move |day| {
            let date = first_text(day, &self.date);
            day.select(&self.slot).map(move |slot| RawSlot {
                date: date.clone(),
                time: first_text(slot, &self.time),
                instructor: first_text(slot, &self.instructor),
                href: self.link_href(slot),
            })
        })
    }

    fn link_href(&self, slot: ElementRef<'_>) -> String {
        slot.select(&self.link)
            .find_map(|el| el.value().attr(&self.link_attr))
            .or_else(|| slot.value().attr(&self.link_attr))
            .unwrap_or("")
            .to_string()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Text of the first match, or empty when nothing matches.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.rezervujsi.sk/autino";

    fn parser() -> SlotParser {
        SlotParser::from_config(&SelectorConfig::default(), BASE).unwrap()
    }

    const TWO_DAYS: &str = r#"
        <html><body>
          <div class="terms">
            <div class="day">
              <h3 class="day-title">Pondelok 3. 3.</h3>
              <div class="term">
                <span class="term-time"><b>08:00</b><b>09:30</b></span>
                <span class="term-instructor">Ján Novák</span>
                <a href="/autino/rezervacia/101">Rezervovať</a>
              </div>
              <div class="term">
                <span class="term-time"><b>10:00</b><b>11:30</b></span>
                <span class="term-instructor">Eva Malá</span>
                <a href="/autino/rezervacia/102">Rezervovať</a>
              </div>
            </div>
            <div class="day">
              <h3 class="day-title">Utorok 4. 3.</h3>
              <a class="term" href="/autino/rezervacia/201">
                <span class="term-time">14:00 - 15:30</span>
                <span class="term-instructor">Ján Novák</span>
              </a>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_days_and_slots_in_order() {
        let entries = parser().parse(TWO_DAYS).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].date, "Pondelok 3. 3.");
        assert_eq!(entries[0].time_range, "08:00 - 09:30");
        assert_eq!(entries[0].instructor, "Ján Novák");
        assert_eq!(entries[0].link, "https://www.rezervujsi.sk/autino/rezervacia/101");

        assert_eq!(entries[1].time_range, "10:00 - 11:30");
        assert_eq!(entries[1].instructor, "Eva Malá");

        assert_eq!(entries[2].date, "Utorok 4. 3.");
        assert_eq!(entries[2].time_range, "14:00 - 15:30");
        assert_eq!(entries[2].link, "https://www.rezervujsi.sk/autino/rezervacia/201");
    }

    #[test]
    fn test_whitespace_variants_share_ids() {
        let reformatted = TWO_DAYS
            .replace("<h3 class=\"day-title\">Pondelok 3. 3.</h3>", "<h3 class=\"day-title\">\n  Pondelok\n  3. 3.\n</h3>")
            .replace("<b>08:00</b><b>09:30</b>", "\n <b>08:00</b>\n <b>09:30</b>\n");

        let a = parser().parse(TWO_DAYS).unwrap();
        let b = parser().parse(&reformatted).unwrap();
        let ids_a: Vec<_> = a.iter().map(|e| &e.id).collect();
        let ids_b: Vec<_> = b.iter().map(|e| &e.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_no_slots_marker_yields_empty() {
        let html = r#"
            <html><body><div class="content"><p>
              V najbližšom období nie sú zverejnené ďalšie termíny,
              v prípade potreby nás prosím kontaktujte.
            </p></div></body></html>
        "#;
        assert!(parser().parse(html).unwrap().is_empty());
    }

    #[test]
    fn test_no_slots_marker_wins_over_empty_container() {
        let html = r#"<div class="terms"><p>V najbližšom období nie sú
            zverejnené ďalšie termíny</p></div>"#;
        assert!(parser().parse(html).unwrap().is_empty());
    }

    #[test]
    fn test_missing_container_yields_empty() {
        let html = "<html><body><h1>Autoškola</h1></body></html>";
        assert!(parser().parse(html).unwrap().is_empty());
    }

    #[test]
    fn test_container_without_days_is_parse_error() {
        let html = r#"<div class="terms"><table><tr><td>??</td></tr></table></div>"#;
        let err = parser().parse(html).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)), "got {err}");
    }

    #[test]
    fn test_days_without_slots_is_parse_error() {
        let html = r#"<div class="terms"><div class="day"><h3 class="day-title">Po</h3></div></div>"#;
        let err = parser().parse(html).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_slot_missing_fields_is_best_effort() {
        let html = r#"
            <div class="terms"><div class="day">
              <h3 class="day-title">Streda</h3>
              <div class="term"><span class="term-time">dohodou</span></div>
            </div></div>
        "#;
        let entries = parser().parse(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time_range, "dohodou");
        assert_eq!(entries[0].instructor, "");
        assert_eq!(entries[0].link, BASE);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = SelectorConfig {
            slot: "[[invalid".into(),
            ..SelectorConfig::default()
        };
        let err = SlotParser::from_config(&config, BASE).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_custom_layout() {
        let config = SelectorConfig {
            container: "table#terminy".into(),
            day: "tbody".into(),
            date: "th".into(),
            slot: "tr.slot".into(),
            time: "td.cas".into(),
            instructor: "td.lektor".into(),
            ..SelectorConfig::default()
        };
        let html = r#"
            <table id="terminy">
              <tbody>
                <tr><th>Piatok 7. 3.</th></tr>
                <tr class="slot"><td class="cas">07:0008:30</td><td class="lektor">Milan</td>
                  <td><a href="rezervacia/9">x</a></td></tr>
              </tbody>
            </table>
        "#;
        let parser = SlotParser::from_config(&config, BASE).unwrap();
        let entries = parser.parse(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, "Piatok 7. 3.");
        assert_eq!(entries[0].time_range, "07:00 - 08:30");
        assert_eq!(entries[0].link, "https://www.rezervujsi.sk/rezervacia/9");
    }
}
