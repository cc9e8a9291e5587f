use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::app::{EstuaryError, Result};

/// Channel metadata plus items, in feed order. All fields default to empty
/// strings when the element is absent.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RawItem>,
}

/// One `<item>` as it appeared on the wire. `pub_date` is the raw string;
/// the ingester owns timestamp parsing.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Parse an RSS 2.0 document.
///
/// Entity handling matches the aggregator's long-standing behavior: the
/// channel title and description are HTML-entity decoded, item fields are
/// stored exactly as received.
pub fn parse(body: &[u8]) -> Result<Channel> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut channel = Channel::default();
    let mut current_item: Option<RawItem> = None;
    let mut saw_channel = false;
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "channel" {
                    saw_channel = true;
                }
                if name == "item" {
                    current_item = Some(RawItem::default());
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if path.last().map(String::as_str) == Some("item") {
                    if let Some(item) = current_item.take() {
                        channel.items.push(item);
                    }
                }
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| EstuaryError::FeedParse(e.to_string()))?
                    .to_string();
                assign_text(&path, &mut channel, &mut current_item, text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).to_string();
                assign_text(&path, &mut channel, &mut current_item, text);
            }
            Ok(Event::Eof) => {
                if !path.is_empty() {
                    return Err(EstuaryError::FeedParse("unexpected end of document".into()));
                }
                break;
            }
            Err(e) => return Err(EstuaryError::FeedParse(format!("XML parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(EstuaryError::FeedParse("no <channel> element".into()));
    }

    channel.title = html_escape::decode_html_entities(&channel.title).to_string();
    channel.description = html_escape::decode_html_entities(&channel.description).to_string();

    Ok(channel)
}

fn assign_text(
    path: &[String],
    channel: &mut Channel,
    current_item: &mut Option<RawItem>,
    text: String,
) {
    match path_tail(path) {
        Some(("item", field)) => {
            if let Some(item) = current_item {
                match field {
                    "title" => item.title = text,
                    "link" => item.link = text,
                    "description" => item.description = text,
                    "pubDate" => item.pub_date = text,
                    _ => {}
                }
            }
        }
        Some(("channel", field)) => match field {
            "title" => channel.title = text,
            "link" => channel.link = text,
            "description" => channel.description = text,
            _ => {}
        },
        _ => {}
    }
}

/// The parent and leaf of the current element path, e.g. ("item", "title").
fn path_tail(path: &[String]) -> Option<(&str, &str)> {
    if path.len() < 2 {
        return None;
    }
    Some((path[path.len() - 2].as_str(), path[path.len() - 1].as_str()))
}
