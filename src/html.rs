use scraper::{ElementRef, Selector};

/// Parses a selector literal. Only ever called with constants.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid selector {css:?}: {err:?}"))
}

/// Text content with runs of whitespace (tabs, newlines, nbsp) collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first_href(el: ElementRef<'_>, links: &Selector) -> Option<String> {
    el.select(links)
        .find_map(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// True when `href` has all of `segments` as whole path segments, the way
/// entity links are told apart from navigation.
pub fn href_has_segments(href: &str, segments: &[&str]) -> bool {
    let parts: Vec<&str> = href.split('/').collect();
    segments.iter().all(|seg| parts.contains(seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_handles_nbsp_and_tabs() {
        assert_eq!(collapse_whitespace("\t 12.10.2022,\n\u{a0}17:30 "), "12.10.2022, 17:30");
    }

    #[test]
    fn segments_must_be_whole() {
        assert!(href_has_segments("/players/tour/2022/id/5.html", &["players", "id"]));
        assert!(!href_has_segments("/playersx/id/5.html", &["players", "id"]));
    }
}
