// src/extract/selector.rs
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::{Document, ExtractContext, ExtractionStrategy};
use crate::ingest::types::CandidateItem;

static HEADING_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4").expect("heading selector"));
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector"));

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow!("invalid CSS selector {s:?}: {e:?}"))
}

pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Own href, or the first descendant `a[href]`.
pub(crate) fn element_link<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.select(&LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| el.value().attr("href"))
}

/// CSS-selector strategy: class substrings (`[class*="news"]`), tag sets,
/// href patterns (`a[href*="/news/"]`).
pub struct SelectorStrategy {
    label: String,
    selector: Selector,
    max_len: Option<usize>,
}

impl SelectorStrategy {
    pub fn new(selector: &str, max_len: Option<usize>) -> Result<Self> {
        Ok(Self {
            label: format!("selector:{selector}"),
            selector: parse_selector(selector)?,
            max_len,
        })
    }

    fn item_from(&self, el: ElementRef<'_>, ctx: &ExtractContext) -> Option<CandidateItem> {
        // heading → first anchor → the element itself
        let title_el = el
            .select(&HEADING_SEL)
            .next()
            .or_else(|| el.select(&ANCHOR_SEL).next())
            .unwrap_or(el);
        let title = element_text(&title_el);
        let content = element_text(&el);
        ctx.finish(&title, element_link(&el), &content, self.max_len)
    }
}

impl ExtractionStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, doc: &Document<'_>, ctx: &ExtractContext) -> Vec<CandidateItem> {
        doc.html()
            .select(&self.selector)
            .filter_map(|el| self.item_from(el, ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn ctx() -> ExtractContext {
        ExtractContext::new(Url::parse("https://bolshoi.ru").unwrap())
    }

    #[test]
    fn heading_is_preferred_as_title() {
        let html = r#"
            <div class="news-item">
              <span class="date">12.03</span>
              <h3>Доступный Большой: новые показы</h3>
              <a href="/about/press/x">Подробнее</a>
            </div>"#;
        let s = SelectorStrategy::new(".news-item", None).unwrap();
        let items = s.extract(&Document::new(html), &ctx());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Доступный Большой: новые показы");
        assert_eq!(items[0].link, "https://bolshoi.ru/about/press/x");
        assert!(items[0].content.contains("12.03"));
    }

    #[test]
    fn anchor_matches_use_own_href_and_text() {
        let html = r#"<ul><li><a href="/news/42">Премьера сезона объявлена</a></li>
                      <li><a href="/news/43">Кратко</a></li></ul>"#;
        let s = SelectorStrategy::new(r#"a[href*="/news/"]"#, None).unwrap();
        let items = s.extract(&Document::new(html), &ctx());
        assert_eq!(items.len(), 1, "short anchor text must be rejected");
        assert_eq!(items[0].link, "https://bolshoi.ru/news/42");
    }

    #[test]
    fn coarse_ceiling_drops_page_chrome() {
        let long = "навигация ".repeat(80);
        let html = format!(
            r#"<div class="news-wrapper">{long}<div class="news-card">Новость о балете сегодня</div></div>"#
        );
        let s = SelectorStrategy::new(r#"[class*="news"]"#, Some(300)).unwrap();
        let items = s.extract(&Document::new(&html), &ctx());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Новость о балете сегодня");
    }
}
