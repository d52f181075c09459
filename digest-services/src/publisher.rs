//! RSS publishing of cached items

use std::collections::BTreeMap;

use chrono::Utc;
use digest_core::{is_error_summary, CachedItem};
use regex::Regex;
use rss::{Channel, Guid, Item};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// Channel-level metadata of the published feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to render feed: {0}")]
    Render(#[from] rss::Error),

    #[error("Rendered feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render `items` as an RSS 2.0 document.
///
/// Items without a summary are skipped. Summaries go to `content:encoded`
/// after [`decorate_html`]; successful ones get a footer linking the
/// comments page, or the GUID when there is none.
pub fn publish_xml(meta: &FeedMeta, items: &[CachedItem]) -> Result<String, PublishError> {
    let rss_items: Vec<Item> = items
        .iter()
        .filter(|item| !item.summary.is_empty())
        .map(to_rss_item)
        .collect();

    let mut namespaces = BTreeMap::new();
    namespaces.insert("content".to_string(), CONTENT_NAMESPACE.to_string());

    let mut channel = Channel::default();
    channel.set_title(meta.title.clone());
    channel.set_link(meta.link.clone());
    channel.set_description(meta.description.clone());
    if !meta.email.is_empty() {
        channel.set_managing_editor(format!("{} ({})", meta.email, meta.author));
    }
    channel.set_last_build_date(Utc::now().to_rfc2822());
    channel.set_namespaces(namespaces);
    channel.set_items(rss_items);

    let bytes = channel.write_to(Vec::new())?;
    Ok(String::from_utf8(bytes)?)
}

fn to_rss_item(item: &CachedItem) -> Item {
    let mut content = decorate_html(&item.summary);
    if !is_error_summary(&item.summary) {
        if item.comments.is_empty() {
            content.push_str(&format!(
                "<br><br>GUID: <a href=\"{0}\">{0}</a>",
                item.guid
            ));
        } else {
            content.push_str(&format!(
                "<br><br>Comments: <a href=\"{0}\">{0}</a>",
                item.comments
            ));
        }
    }

    let mut guid = Guid::default();
    guid.set_value(item.guid.clone());
    guid.set_permalink(false);

    let mut rss_item = Item::default();
    rss_item.set_title(item.title.clone());
    rss_item.set_link(item.link.clone());
    rss_item.set_description(item.description.clone());
    rss_item.set_guid(guid);
    rss_item.set_pub_date(item.created_at.to_rfc2822());
    rss_item.set_content(content);
    if !item.author.is_empty() {
        rss_item.set_author(item.author.clone());
    }
    rss_item
}

/// Turn a summary body into HTML.
///
/// Generated summaries are escaped and their newlines become `<br>`; error
/// bodies already embed the original HTML description and are left as is.
/// Markdown bold becomes `<b>` in both cases.
pub fn decorate_html(body: &str) -> String {
    let body = if is_error_summary(body) {
        body.to_string()
    } else {
        html_escape::encode_text(body).replace('\n', "<br>")
    };

    match Regex::new(r"\*\*(.*?)\*\*") {
        Ok(re) => re.replace_all(&body, "<b>$1</b>").into_owned(),
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_core::ERROR_PREFIX_SUMMARY_FAILED;

    fn cached(guid: &str, summary: &str, comments: &str) -> CachedItem {
        let now = Utc::now();
        CachedItem {
            id: 1,
            title: format!("Title {}", guid),
            link: format!("https://example.com/{}", guid),
            comments: comments.to_string(),
            guid: guid.to_string(),
            author: String::new(),
            publish_date: String::new(),
            description: "<p>original</p>".to_string(),
            summary: summary.to_string(),
            marked_as_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn meta() -> FeedMeta {
        FeedMeta {
            title: "Summarized feeds".to_string(),
            link: "https://feeds.example.com".to_string(),
            description: "Summaries of my feeds".to_string(),
            author: "Feed Bot".to_string(),
            email: "bot@example.com".to_string(),
        }
    }

    #[test]
    fn test_decorate_html_newlines() {
        assert_eq!(
            decorate_html("line 1\nline 2\n\nlast line\n"),
            "line 1<br>line 2<br><br>last line<br>"
        );
    }

    #[test]
    fn test_decorate_html_bold() {
        assert_eq!(
            decorate_html("following **text** should be bolded! **"),
            "following <b>text</b> should be bolded! **"
        );
        assert_eq!(
            decorate_html("**bold text\nover multiple\nlines**"),
            "<b>bold text<br>over multiple<br>lines</b>"
        );
    }

    #[test]
    fn test_decorate_html_escapes_first() {
        assert_eq!(
            decorate_html("text with <html tags> should be **escaped** first"),
            "text with &lt;html tags&gt; should be <b>escaped</b> first"
        );
    }

    #[test]
    fn test_decorate_html_keeps_error_bodies() {
        let body = format!("{}: http error 404\n\n<p>**original**</p>", ERROR_PREFIX_SUMMARY_FAILED);
        let decorated = decorate_html(&body);

        assert!(decorated.contains("\n\n<p>"));
        assert!(decorated.contains("<b>original</b>"));
    }

    #[test]
    fn test_publish_xml() {
        let items = vec![
            cached("1", "Summary **one**", "https://news.example.com/1"),
            cached("2", "", ""),
            cached("3", "Summary three", ""),
            cached(
                "4",
                &format!("{}: timeout\n\n<p>desc</p>", ERROR_PREFIX_SUMMARY_FAILED),
                "https://news.example.com/4",
            ),
        ];

        let xml = publish_xml(&meta(), &items).unwrap();
        assert!(xml.contains(CONTENT_NAMESPACE));

        let channel = Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.title(), "Summarized feeds");
        assert_eq!(channel.items().len(), 3);

        let first = &channel.items()[0];
        assert_eq!(first.title(), Some("Title 1"));
        assert_eq!(first.guid().map(|g| g.value()), Some("1"));
        assert_eq!(
            first.content(),
            Some(
                "Summary <b>one</b><br><br>Comments: <a href=\"https://news.example.com/1\">https://news.example.com/1</a>"
            )
        );

        let second = &channel.items()[1];
        assert_eq!(
            second.content(),
            Some("Summary three<br><br>GUID: <a href=\"3\">3</a>")
        );

        let failed = &channel.items()[2];
        let content = failed.content().unwrap();
        assert!(content.starts_with(ERROR_PREFIX_SUMMARY_FAILED));
        assert!(!content.contains("Comments:"));
    }

    #[test]
    fn test_publish_xml_empty() {
        let xml = publish_xml(&meta(), &[]).unwrap();
        let channel = Channel::read_from(xml.as_bytes()).unwrap();
        assert!(channel.items().is_empty());
    }
}
