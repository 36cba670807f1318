//! Minimal RSS 2.0 / Atom feed parser shared by the feed-shaped adapters.
//!
//! The forge only needs five things from a feed entry (title, link,
//! summary, publish date, authors), so this is a small single-pass state
//! machine over `quick-xml` events rather than a full feed model. It accepts
//! both RSS (`<item>`, `<description>`, `<pubDate>`, text `<link>`) and Atom
//! (`<entry>`, `<summary>`, `<published>`/`<updated>`, `<link href=...>`)
//! in the same pass, which covers Google News, site feeds, and arXiv.

use crate::utils::format_bucket;
use chrono::{DateTime, NaiveDate};
use std::error::Error;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

/// One feed entry with the fields the adapters consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    /// Entry title.
    pub title: String,
    /// Entry link (RSS text link, or the first usable Atom `href`).
    pub link: String,
    /// Entry summary/description, HTML left as-is.
    pub summary: String,
    /// Raw publish date string, exactly as the feed carried it.
    pub published: Option<String>,
    /// Author names, Atom only.
    pub authors: Vec<String>,
}

/// Which text field the cursor is inside, within the current entry.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Summary,
    Link,
    Published,
    AuthorName,
}

/// Parse a feed document into entries, in document order.
///
/// Elements outside `<item>`/`<entry>` (channel titles and the like) are
/// ignored. Text split by entity references is reassembled.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<FeedEntry> = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;
    let mut author_buf = String::new();
    let mut published_buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                match name {
                    b"item" | b"entry" => {
                        current = Some(FeedEntry::default());
                        field = None;
                        in_author = false;
                    }
                    _ if current.is_some() => match name {
                        b"title" => field = Some(Field::Title),
                        b"description" | b"summary" => field = Some(Field::Summary),
                        b"link" => {
                            if let Some(href) = link_href(&e)? {
                                assign_link(current.as_mut().unwrap(), href);
                                field = None;
                            } else {
                                field = Some(Field::Link);
                            }
                        }
                        b"pubDate" | b"published" | b"updated" => {
                            field = Some(Field::Published);
                            published_buf.clear();
                        }
                        b"author" => in_author = true,
                        b"name" if in_author => {
                            field = Some(Field::AuthorName);
                            author_buf.clear();
                        }
                        _ => field = None,
                    },
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if current.is_some() && e.local_name().as_ref() == b"link" {
                    if let Some(href) = link_href(&e)? {
                        assign_link(current.as_mut().unwrap(), href);
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let decoded = t.decode()?;
                    let text = quick_xml::escape::unescape(&decoded)?;
                    append_text(entry, f, &text, &mut author_buf, &mut published_buf);
                }
            }
            Event::GeneralRef(r) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let reference = format!("&{};", r.decode()?);
                    let text = quick_xml::escape::unescape(&reference)?;
                    append_text(entry, f, &text, &mut author_buf, &mut published_buf);
                }
            }
            Event::CData(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                    append_text(entry, f, &text, &mut author_buf, &mut published_buf);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    b"author" => in_author = false,
                    b"name" if in_author => {
                        if let Some(entry) = current.as_mut() {
                            let author = author_buf.trim().to_string();
                            if !author.is_empty() {
                                entry.authors.push(author);
                            }
                        }
                        field = None;
                    }
                    b"pubDate" | b"published" | b"updated" => {
                        if let Some(entry) = current.as_mut() {
                            let raw = published_buf.trim().to_string();
                            // `updated` must not clobber an earlier `published`.
                            if !raw.is_empty() && entry.published.is_none() {
                                entry.published = Some(raw);
                            }
                        }
                        field = None;
                    }
                    _ => field = None,
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!(entries = entries.len(), "Parsed feed");
    Ok(entries)
}

/// Day bucket (`MM/DD/YYYY`) for a raw feed date, or `None` when the string
/// matches none of the formats feeds actually use.
pub fn entry_bucket(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(format_bucket(dt.date_naive()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(format_bucket(dt.date_naive()));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(format_bucket(d));
    }
    None
}

fn link_href(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>, Box<dyn Error>> {
    let rel = match e.try_get_attribute("rel")? {
        Some(attr) => attr.unescape_value()?.into_owned(),
        None => String::new(),
    };
    if !rel.is_empty() && rel != "alternate" {
        return Ok(None);
    }
    match e.try_get_attribute("href")? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn assign_link(entry: &mut FeedEntry, href: String) {
    if entry.link.is_empty() {
        entry.link = href;
    }
}

fn append_text(
    entry: &mut FeedEntry,
    field: Field,
    text: &str,
    author_buf: &mut String,
    published_buf: &mut String,
) {
    match field {
        Field::Title => entry.title.push_str(text),
        Field::Summary => entry.summary.push_str(text),
        Field::Link => entry.link.push_str(text),
        Field::Published => published_buf.push_str(text),
        Field::AuthorName => author_buf.push_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rss_items() {
        let xml = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
            <title>Channel title is ignored</title>
            <item>
                <title>OpenClaw raises $50M</title>
                <link>https://example.com/raise</link>
                <description>Funding news.</description>
                <pubDate>Sat, 10 Jan 2026 08:00:00 GMT</pubDate>
            </item>
            <item>
                <title>Second story</title>
                <link>https://example.com/second</link>
                <description>More news.</description>
            </item>
        </channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "OpenClaw raises $50M");
        assert_eq!(entries[0].link, "https://example.com/raise");
        assert_eq!(entries[0].summary, "Funding news.");
        assert_eq!(
            entries[0].published.as_deref(),
            Some("Sat, 10 Jan 2026 08:00:00 GMT")
        );
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn test_parse_atom_entries() {
        let xml = r#"<?xml version="1.0"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
            <title>arXiv Query</title>
            <entry>
                <title>A Study of OpenClaw
 Internals</title>
                <link href="https://arxiv.org/abs/2601.00001" rel="alternate"/>
                <link href="https://arxiv.org/pdf/2601.00001" rel="related"/>
                <summary>We study the internals.</summary>
                <published>2026-01-05T12:34:56Z</published>
                <updated>2026-01-06T00:00:00Z</updated>
                <author><name>Ada Lovelace</name></author>
                <author><name>Alan Turing</name></author>
            </entry>
        </feed>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://arxiv.org/abs/2601.00001");
        assert_eq!(entries[0].summary, "We study the internals.");
        assert_eq!(entries[0].published.as_deref(), Some("2026-01-05T12:34:56Z"));
        assert_eq!(entries[0].authors, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_parse_reassembles_entity_split_text() {
        let xml = r#"<rss><channel><item>
            <title>AT&amp;T covers OpenClaw</title>
            <link>https://example.com/att</link>
        </item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].title, "AT&T covers OpenClaw");
    }

    #[test]
    fn test_parse_cdata_description() {
        let xml = r#"<rss><channel><item>
            <title>Story</title>
            <link>https://example.com/s</link>
            <description><![CDATA[<b>Bold</b> claim]]></description>
        </item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].summary, "<b>Bold</b> claim");
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<rss><channel><title>Nothing</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_broken_xml() {
        assert!(parse_feed("<rss><channel><item></rss>").is_err());
    }

    #[test]
    fn test_entry_bucket_rfc2822() {
        assert_eq!(
            entry_bucket("Sat, 10 Jan 2026 08:00:00 GMT").as_deref(),
            Some("01/10/2026")
        );
    }

    #[test]
    fn test_entry_bucket_rfc3339() {
        assert_eq!(
            entry_bucket("2026-01-05T12:34:56Z").as_deref(),
            Some("01/05/2026")
        );
    }

    #[test]
    fn test_entry_bucket_plain_date() {
        assert_eq!(entry_bucket("2026-01-05").as_deref(), Some("01/05/2026"));
    }

    #[test]
    fn test_entry_bucket_garbage() {
        assert!(entry_bucket("last tuesday").is_none());
    }
}
