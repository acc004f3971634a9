//! Structural extraction from archive and report pages.
//!
//! All functions here are pure over an HTML string, so the site-specific
//! selector contract is testable without touching the network. Selectors
//! mirror the archive's markup classes; when the site changes its markup
//! these degrade to empty results, not errors — extraction is best-effort.

use scraper::{ElementRef, Html, Node, Selector};

use crate::models::ArticleRecord;

/// District prefixes used to reclassify a leading sub-heading as the
/// report's `bezirk` when the time/place block did not name one.
const DISTRICT_PREFIXES: [&str; 12] = [
    "Treptow",
    "Mitte",
    "Neukölln",
    "Tempelhof",
    "Marzahn",
    "Spandau",
    "Steglitz",
    "Reinickendorf",
    "Charlottenburg",
    "Pankow",
    "Lichtenberg",
    "Friedrichshain",
];

/// Extract year-archive paths from the archive index page.
pub fn parse_year_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(".html5-section.article .modul-text_bild .body .textile a").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Read the last-page number from a year page's pagination control.
///
/// Returns `None` when the pagination marker is missing or unreadable;
/// callers treat that as "exactly one page".
pub fn parse_last_page(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("li.pager-item.last a").unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|element| element.text().collect::<String>().trim().parse().ok())
}

/// Extract report paths from one listing page.
pub fn parse_article_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div[class*='cell'] > a").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Extract one [`ArticleRecord`] from a fetched report page.
///
/// `url` is the absolute URL the page was fetched from and `status` the HTTP
/// status received; both are carried into the record unchanged.
pub fn extract_record(html: &str, url: &str, status: u16) -> ArticleRecord {
    let document = Html::parse_document(html);
    let headline_selector = Selector::parse("h1.title").unwrap();
    let time_place_selector = Selector::parse("div.polizeimeldung").unwrap();
    let subhead_selector = Selector::parse("div.textile > p > strong").unwrap();
    let paragraph_selector = Selector::parse("div.textile > p").unwrap();

    let headline = document
        .select(&headline_selector)
        .flat_map(|element| element.text())
        .collect::<String>();

    // Direct text nodes of the time/place block: entry 0 is the publication
    // line, entry 1 (when present) the district.
    let time_place: Vec<String> = document
        .select(&time_place_selector)
        .flat_map(direct_text_nodes)
        .filter(|text| !text.is_empty())
        .collect();
    let published = time_place.first().cloned().unwrap_or_default();
    let mut bezirk = time_place.get(1).cloned().unwrap_or_default();

    let mut subheads: Vec<String> = document
        .select(&subhead_selector)
        .map(|element| element.text().collect::<String>())
        .collect();
    if subheads.is_empty() {
        subheads = vec![" ".to_string()];
    }

    if bezirk.is_empty()
        && DISTRICT_PREFIXES
            .iter()
            .any(|prefix| subheads[0].starts_with(prefix))
    {
        bezirk = subheads.remove(0);
    }

    let article = normalize_whitespace(&body_text(&document, &paragraph_selector));

    ArticleRecord {
        response: status,
        headline,
        published,
        bezirk,
        subheads,
        article,
        url: url.to_string(),
    }
}

/// Trimmed direct child text nodes of an element, skipping nested markup.
fn direct_text_nodes(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            _ => None,
        })
        .collect()
}

/// Body text: direct text of each body paragraph plus inline `span.caps`
/// content, in document order.
fn body_text(document: &Html, paragraph_selector: &Selector) -> String {
    let mut out = String::new();
    for paragraph in document.select(paragraph_selector) {
        for child in paragraph.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(element)
                    if element.name() == "span"
                        && element.attr("class").is_some_and(|c| c.contains("caps")) =>
                {
                    if let Some(span) = ElementRef::wrap(child) {
                        out.extend(span.text());
                    }
                }
                _ => {}
            }
        }
        // Paragraph boundary, collapsed to a single space later.
        out.push(' ');
    }
    out
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT_URL: &str = "https://www.berlin.de/polizei/polizeimeldungen/2020/a1";

    #[test]
    fn test_parse_year_links() {
        let html = r#"
            <div class="html5-section article">
              <div class="html5-section block modul-text_bild">
                <div class="html5-section body">
                  <div class="textile">
                    <a href="/polizei/polizeimeldungen/archiv/2020/">2020</a>
                    <a href="/polizei/polizeimeldungen/archiv/2019/">2019</a>
                  </div>
                </div>
              </div>
            </div>"#;

        assert_eq!(
            parse_year_links(html),
            vec![
                "/polizei/polizeimeldungen/archiv/2020/",
                "/polizei/polizeimeldungen/archiv/2019/"
            ]
        );
    }

    #[test]
    fn test_parse_last_page() {
        let html = r#"
            <ul>
              <li class="pager-item"><a>2</a></li>
              <li class="pager-item last"><a>47</a></li>
            </ul>"#;

        assert_eq!(parse_last_page(html), Some(47));
    }

    #[test]
    fn test_parse_last_page_missing_pagination() {
        assert_eq!(parse_last_page("<ul><li>no pager here</li></ul>"), None);
    }

    #[test]
    fn test_parse_article_links() {
        let html = r#"
            <div class="cell text"><a href="/a1">Report 1</a></div>
            <div class="grid-cell"><a href="/a2">Report 2</a></div>
            <div class="other"><a href="/nope">Not a report</a></div>"#;

        assert_eq!(parse_article_links(html), vec!["/a1", "/a2"]);
    }

    #[test]
    fn test_extract_record_full_page() {
        let html = r#"
            <h1 class="title">Festnahme nach Raub</h1>
            <div class="polizeimeldung">
              Polizeimeldung vom 24.12.2019
              <span>Ereignisort:</span>
              Neukölln
            </div>
            <div class="textile">
              <p><strong>Erster Abschnitt</strong>
                 Gestern Abend   nahmen
                 Polizisten einen Mann der <span class="caps">GSG</span> fest.</p>
              <p>Er wurde   heute dem Haftrichter vorgeführt.</p>
            </div>"#;

        let record = extract_record(html, REPORT_URL, 200);

        assert_eq!(record.response, 200);
        assert_eq!(record.headline, "Festnahme nach Raub");
        assert_eq!(record.published, "Polizeimeldung vom 24.12.2019");
        assert_eq!(record.bezirk, "Neukölln");
        assert_eq!(record.subheads, vec!["Erster Abschnitt"]);
        assert_eq!(
            record.article,
            "Gestern Abend nahmen Polizisten einen Mann der GSG fest. Er wurde heute dem Haftrichter vorgeführt."
        );
        assert_eq!(record.url, REPORT_URL);
    }

    #[test]
    fn test_extract_record_missing_subheads_gets_placeholder() {
        let html = r#"
            <h1 class="title">Kurzmeldung</h1>
            <div class="textile"><p>Text ohne fette Überschrift.</p></div>"#;

        let record = extract_record(html, REPORT_URL, 200);
        assert_eq!(record.subheads, vec![" "]);
        assert_eq!(record.bezirk, "");
    }

    #[test]
    fn test_district_fallback_reassigns_leading_subhead() {
        let html = r#"
            <div class="polizeimeldung">Polizeimeldung vom 01.02.2020</div>
            <div class="textile">
              <p><strong>Pankow: weitere Angaben</strong></p>
              <p><strong>Zeugen gesucht</strong></p>
            </div>"#;

        let record = extract_record(html, REPORT_URL, 200);
        assert_eq!(record.bezirk, "Pankow: weitere Angaben");
        assert_eq!(record.subheads, vec!["Zeugen gesucht"]);
    }

    #[test]
    fn test_district_fallback_skipped_when_bezirk_present() {
        let html = r#"
            <div class="polizeimeldung">
              Polizeimeldung vom 01.02.2020
              <span></span>
              Mitte
            </div>
            <div class="textile">
              <p><strong>Pankow: weitere Angaben</strong></p>
            </div>"#;

        let record = extract_record(html, REPORT_URL, 200);
        assert_eq!(record.bezirk, "Mitte");
        assert_eq!(record.subheads, vec!["Pankow: weitere Angaben"]);
    }

    #[test]
    fn test_extract_record_carries_non_200_status() {
        let record = extract_record("<html><body>Not found</body></html>", REPORT_URL, 404);
        assert_eq!(record.response, 404);
        assert_eq!(record.headline, "");
        assert_eq!(record.article, "");
    }

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(
            normalize_whitespace("  ein\n\tzwei   drei \n"),
            "ein zwei drei"
        );
    }
}
