// src/extract/container.rs
use anyhow::Result;
use scraper::Selector;

use super::selector::{element_link, element_text, parse_selector};
use super::{Document, ExtractContext, ExtractionStrategy};
use crate::ingest::types::CandidateItem;

/// Last-resort strategy over generic containers (div/span/p/li).
/// Stricter than `SelectorStrategy`: innermost containers only, hard length
/// ceiling, and anything mentioning a skip word is dropped.
pub struct ContainerStrategy {
    label: String,
    selector: Selector,
    max_len: usize,
}

impl ContainerStrategy {
    pub fn new(selector: &str, max_len: usize) -> Result<Self> {
        Ok(Self {
            label: format!("container:{selector}"),
            selector: parse_selector(selector)?,
            max_len,
        })
    }
}

impl ExtractionStrategy for ContainerStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, doc: &Document<'_>, ctx: &ExtractContext) -> Vec<CandidateItem> {
        let mut out = Vec::new();
        for el in doc.html().select(&self.selector) {
            // outer wrappers repeat their children's text
            if el.select(&self.selector).next().is_some() {
                continue;
            }
            let text = element_text(&el);
            if ctx.has_skip_word(&text) {
                continue;
            }
            if let Some(item) = ctx.finish(&text, element_link(&el), &text, Some(self.max_len)) {
                out.push(item);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn innermost_containers_without_skip_words() {
        let html = r#"
            <body>
              <div class="wrap">
                <div>Главное меню театра и поиск</div>
                <div><p>Спектакль для детей от 6 лет <a href="kids/1">билеты</a></p></div>
                <span>ok</span>
              </div>
            </body>"#;
        let mut ctx = ExtractContext::new(Url::parse("https://bolshoi.ru").unwrap());
        ctx.skip_words = vec!["меню".into(), "поиск".into()];
        let s = ContainerStrategy::new("div, p, span", 300).unwrap();
        let items = s.extract(&Document::new(html), &ctx);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Спектакль для детей от 6 лет билеты");
        assert_eq!(items[0].link, "https://bolshoi.ru/kids/1");
    }
}
