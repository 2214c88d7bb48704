use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// One fetched sitemap document, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SitemapNode {
    /// `<sitemapindex>`: each entry points at another sitemap document
    Index(Vec<String>),
    /// `<urlset>`: each entry is an indexable page
    UrlSet(Vec<String>),
    /// Anything we could not read as either of the above
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RootKind {
    SitemapIndex,
    UrlSet,
}

impl RootKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sitemapindex" => Some(RootKind::SitemapIndex),
            b"urlset" => Some(RootKind::UrlSet),
            _ => None,
        }
    }
}

impl SitemapNode {
    /// Parse a sitemap document. Never fails: unreadable input becomes `Malformed`.
    pub fn parse(xml: &[u8]) -> Self {
        parse_document(xml).unwrap_or(SitemapNode::Malformed)
    }

    pub fn is_index(&self) -> bool {
        matches!(self, SitemapNode::Index(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SitemapNode::Malformed)
    }

    /// The `<loc>` values carried by this node, children or leaves.
    pub fn locs(&self) -> &[String] {
        match self {
            SitemapNode::Index(children) => children,
            SitemapNode::UrlSet(locs) => locs,
            SitemapNode::Malformed => &[],
        }
    }
}

/// Shorthand for [`SitemapNode::parse`].
pub fn parse(xml: &[u8]) -> SitemapNode {
    SitemapNode::parse(xml)
}

fn parse_document(xml: &[u8]) -> Option<SitemapNode> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<RootKind> = None;
    // Local names of the currently open elements, root first
    let mut open: Vec<Vec<u8>> = Vec::new();
    // Text collected for the <loc> we are inside of, if any
    let mut loc: Option<String> = None;

    let mut sitemap_locs = Vec::new();
    let mut url_locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if open.is_empty() {
                    if root.is_some() {
                        // second top-level element
                        return None;
                    }
                    root = Some(RootKind::from_local_name(&name)?);
                }
                if open.len() == 2
                    && name == b"loc"
                    && matches!(open[1].as_slice(), b"sitemap" | b"url")
                {
                    loc = Some(String::new());
                }
                open.push(name);
            }
            Ok(Event::Empty(e)) => {
                if open.is_empty() {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(RootKind::from_local_name(e.local_name().as_ref())?);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&e.unescape().ok()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&reader.decoder().decode(&e).ok()?);
                }
            }
            Ok(Event::End(_)) => {
                let closed = open.pop()?;
                if closed == b"loc"
                    && open.len() == 2
                    && let Some(text) = loc.take()
                {
                    let text = text.trim();
                    if !text.is_empty() {
                        if open[1] == b"sitemap" {
                            sitemap_locs.push(text.to_string());
                        } else {
                            url_locs.push(text.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    if !open.is_empty() {
        return None;
    }

    // <sitemap> entries win over <url> entries when a document mixes both
    let node = if !sitemap_locs.is_empty() {
        SitemapNode::Index(sitemap_locs)
    } else if !url_locs.is_empty() {
        SitemapNode::UrlSet(url_locs)
    } else {
        match root? {
            RootKind::SitemapIndex => SitemapNode::Index(Vec::new()),
            RootKind::UrlSet => SitemapNode::UrlSet(Vec::new()),
        }
    };

    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sitemap_index() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>https://example.com/post-sitemap.xml</loc></sitemap>
                <sitemap>
                    <loc>https://example.com/page-sitemap.xml</loc>
                    <lastmod>2024-01-15T10:30:00+00:00</lastmod>
                </sitemap>
            </sitemapindex>"#;

        assert_eq!(
            parse(xml),
            SitemapNode::Index(vec![
                "https://example.com/post-sitemap.xml".to_string(),
                "https://example.com/page-sitemap.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_urlset() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/a</loc><priority>0.8</priority></url>
                <url><loc>https://example.com/b</loc></url>
            </urlset>"#;

        let node = parse(xml);
        assert!(!node.is_index());
        assert_eq!(
            node.locs(),
            &["https://example.com/a".to_string(), "https://example.com/b".to_string()]
        );
    }

    #[test]
    fn test_sitemap_children_take_precedence() {
        let xml = br#"<urlset>
                <url><loc>https://example.com/page</loc></url>
                <sitemap><loc>https://example.com/child.xml</loc></sitemap>
            </urlset>"#;

        assert_eq!(
            parse(xml),
            SitemapNode::Index(vec!["https://example.com/child.xml".to_string()])
        );
    }

    #[test]
    fn test_loc_text_is_trimmed_and_unescaped() {
        let xml = b"<urlset><url><loc>\n   https://example.com/?a=1&amp;b=2  \n</loc></url></urlset>";
        assert_eq!(
            parse(xml),
            SitemapNode::UrlSet(vec!["https://example.com/?a=1&b=2".to_string()])
        );
    }

    #[test]
    fn test_loc_in_cdata() {
        let xml = b"<urlset><url><loc><![CDATA[https://example.com/cdata]]></loc></url></urlset>";
        assert_eq!(
            parse(xml),
            SitemapNode::UrlSet(vec!["https://example.com/cdata".to_string()])
        );
    }

    #[test]
    fn test_no_normalization() {
        let xml = b"<urlset><url><loc>HTTPS://Example.com</loc></url></urlset>";
        assert_eq!(parse(xml).locs(), &["HTTPS://Example.com".to_string()]);
    }

    #[test]
    fn test_prefixed_namespace_root() {
        let xml = br#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sm:url><sm:loc>https://example.com/ns</sm:loc></sm:url>
            </sm:urlset>"#;
        assert_eq!(parse(xml).locs(), &["https://example.com/ns".to_string()]);
    }

    #[test]
    fn test_nested_loc_outside_entries_is_ignored() {
        let xml = b"<urlset><loc>https://example.com/stray</loc><url><image><loc>https://example.com/img.png</loc></image><loc>https://example.com/real</loc></url></urlset>";
        assert_eq!(parse(xml).locs(), &["https://example.com/real".to_string()]);
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(parse(b"<urlset/>"), SitemapNode::UrlSet(vec![]));
        assert_eq!(parse(b"<sitemapindex></sitemapindex>"), SitemapNode::Index(vec![]));
    }

    #[test]
    fn test_malformed_inputs() {
        let cases: &[&[u8]] = &[
            b"",
            b"not xml at all",
            b"<html><body>404 Not Found</body></html>",
            b"<urlset><url><loc>https://example.com/a</loc></url>",
            b"<urlset><url><loc>https://example.com/a</url></loc></urlset>",
            b"<urlset></urlset><urlset></urlset>",
            b"<urlset><url><loc>https://example.com/&bogus;</loc></url></urlset>",
            &[0x3c, 0xff, 0xfe],
        ];

        for case in cases {
            let node = parse(case);
            assert!(node.is_malformed(), "expected Malformed for {:?}", case);
            assert!(node.locs().is_empty());
        }
    }

    #[test]
    fn test_declared_latin1_encoding() {
        let mut xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><urlset><url><loc>https://example.com/caf".to_vec();
        xml.push(0xe9);
        xml.extend_from_slice(b"</loc></url><url><loc>https://example.com/b</loc></url></urlset>");

        assert_eq!(
            parse(&xml),
            SitemapNode::UrlSet(vec![
                "https://example.com/caf\u{e9}".to_string(),
                "https://example.com/b".to_string(),
            ])
        );
    }

    #[test]
    fn test_declared_latin1_cdata() {
        let mut xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><urlset><url><loc><![CDATA[https://example.com/ni".to_vec();
        xml.push(0xf1);
        xml.extend_from_slice(b"o]]></loc></url></urlset>");

        assert_eq!(parse(&xml).locs(), &["https://example.com/ni\u{f1}o".to_string()]);
    }
}
