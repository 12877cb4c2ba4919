use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// RFC 1123 with a numeric zone, as RSS `pubDate` requires.
const RFC1123_NUMERIC: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A fully assembled feed, ready to render.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Canonical URL of the feed itself; emitted as an `atom:link rel="self"`
    /// element when known.
    pub self_link: Option<String>,
    pub items: Vec<Item>,
}

/// One feed entry. Exists only for the duration of a render.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub link: String,
    /// `topicID:uuid`, assumed globally unique.
    pub guid: String,
    pub pub_date: DateTime<Utc>,
    pub summary: String,
}

/// Renders the feed as an RSS 2.0 document (UTF-8).
pub fn render(feed: &Feed) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    if feed.self_link.is_some() {
        rss.push_attribute(("xmlns:atom", ATOM_NS));
    }
    writer
        .write_event(Event::Start(rss))
        .context("write rss element")?;

    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("write channel element")?;

    if let Some(self_link) = &feed.self_link {
        let mut link = BytesStart::new("atom:link");
        link.push_attribute(("href", self_link.as_str()));
        link.push_attribute(("rel", "self"));
        link.push_attribute(("type", "application/rss+xml"));
        writer
            .write_event(Event::Empty(link))
            .context("write atom self link")?;
    }

    text_element(&mut writer, "title", &feed.title)?;
    text_element(&mut writer, "link", &feed.link)?;
    text_element(&mut writer, "description", &feed.description)?;

    for item in &feed.items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .context("write item element")?;

        text_element(&mut writer, "title", &item.title)?;
        text_element(&mut writer, "link", &item.link)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer
            .write_event(Event::Start(guid))
            .context("write guid element")?;
        writer
            .write_event(Event::Text(BytesText::new(&item.guid)))
            .context("write guid text")?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .context("write guid end")?;

        let pub_date = item.pub_date.format(RFC1123_NUMERIC).to_string();
        text_element(&mut writer, "pubDate", &pub_date)?;
        text_element(&mut writer, "description", &item.summary)?;

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .context("write item end")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("write rss end")?;

    Ok(writer.into_inner().into_inner())
}

fn text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .with_context(|| format!("write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("write {name} end"))?;
    Ok(())
}
