// src/extract/rss.rs
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::{Document, ExtractContext, ExtractionStrategy};
use crate::ingest::types::CandidateItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

static RE_NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

/// Feeds often carry HTML named entities (`&nbsp;`, `&hellip;`, `&copy;`) that XML
/// does not define. Decode them to text; unknown names become literal `&name;`.
fn scrub_html_entities_for_xml(s: &str) -> Cow<'_, str> {
    RE_NAMED_ENTITY.replace_all(s, |caps: &Captures<'_>| {
        let whole = &caps[0];
        match &caps[1] {
            "amp" | "lt" | "gt" | "quot" | "apos" => whole.to_string(),
            _ => {
                let decoded = html_escape::decode_html_entities(whole);
                if decoded == whole {
                    format!("&amp;{}", &whole[1..])
                } else {
                    html_escape::encode_text(&decoded).into_owned()
                }
            }
        }
    })
}

/// RSS 2.0 channel feed. Non-feed documents simply yield nothing.
pub struct RssStrategy;

impl ExtractionStrategy for RssStrategy {
    fn name(&self) -> &str {
        "rss"
    }

    fn extract(&self, doc: &Document<'_>, ctx: &ExtractContext) -> Vec<CandidateItem> {
        let raw = doc.raw();
        if !raw.contains("<rss") || !raw.contains("<channel") {
            return Vec::new();
        }
        let xml_clean = scrub_html_entities_for_xml(raw);
        let rss: Rss = match from_str(&xml_clean) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "document looks like rss but does not parse");
                return Vec::new();
            }
        };

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.as_deref().unwrap_or_default();
            let description = it.description.as_deref().unwrap_or_default();
            let Some(mut item) = ctx.finish(title, it.link.as_deref(), description, None) else {
                continue;
            };
            item.published_at = it.pub_date.as_deref().and_then(parse_rfc2822_to_unix);
            out.push(item);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn parses_items_and_pub_date() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel><title>Театр</title>
              <item>
                <title>Доступный Большой &ndash; специальные показы</title>
                <link>/about/press/x</link>
                <description><![CDATA[<p>Для зрителей с особыми потребностями</p>]]></description>
                <pubDate>Tue, 10 Jun 2025 09:30:00 +0300</pubDate>
              </item>
              <item><title>Кратко</title></item>
            </channel></rss>"#;
        let ctx = ExtractContext::new(Url::parse("https://bolshoi.ru").unwrap());
        let items = RssStrategy.extract(&Document::new(xml), &ctx);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Доступный Большой \u{2013} специальные показы");
        assert_eq!(items[0].link, "https://bolshoi.ru/about/press/x");
        assert_eq!(items[0].content, "Для зрителей с особыми потребностями");
        assert_eq!(items[0].published_at, Some(1_749_537_000));
    }

    #[test]
    fn any_html_named_entity_keeps_the_feed_parseable() {
        let xml = r#"<rss version="2.0"><channel>
              <item><title>Сезон&nbsp;2025&hellip; &copy; Большой</title><link>/a</link></item>
              <item><title>Балет &foo; и опера &amp; хор</title><link>/b</link></item>
            </channel></rss>"#;
        let ctx = ExtractContext::new(Url::parse("https://bolshoi.ru").unwrap());
        let items = RssStrategy.extract(&Document::new(xml), &ctx);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Сезон 2025\u{2026} \u{a9} Большой");
        assert_eq!(items[1].title, "Балет &foo; и опера & хор");
    }

    #[test]
    fn html_pages_yield_nothing() {
        let ctx = ExtractContext::new(Url::parse("https://bolshoi.ru").unwrap());
        let items = RssStrategy.extract(&Document::new("<html><body>x</body></html>"), &ctx);
        assert!(items.is_empty());
    }
}
