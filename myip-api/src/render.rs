//! HTML rendering of a lookup response.

use std::fmt::Write;

use crate::dto::ApiResponse;

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the page for `body`.
///
/// The registry section is omitted when the record carries no data.
pub fn render_page(body: &ApiResponse) -> String {
    let mut page = String::with_capacity(1024);
    let ip = escape_html(&body.ip);

    // Writing to a String cannot fail.
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>My IP: {ip}</title>\n</head>\n<body>\n\
         <h1>{ip}</h1>\n<p>Requests seen from this address: {count}</p>\n",
        count = body.count_call,
    );

    let has_record = [&body.country, &body.handle, &body.ip_version, &body.name, &body.kind]
        .iter()
        .any(|field| !field.is_empty())
        || !body.events.is_empty();

    if has_record {
        page.push_str("<h2>Registry</h2>\n<table>\n");
        for (label, value) in [
            ("Country", &body.country),
            ("Handle", &body.handle),
            ("IP version", &body.ip_version),
            ("Name", &body.name),
            ("Type", &body.kind),
        ] {
            let _ = writeln!(page, "<tr><th>{label}</th><td>{}</td></tr>", escape_html(value));
        }
        page.push_str("</table>\n");

        if !body.events.is_empty() {
            page.push_str("<h2>Events</h2>\n<table>\n<tr><th>Action</th><th>Date</th></tr>\n");
            for event in &body.events {
                let _ = writeln!(
                    page,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape_html(&event.action),
                    escape_html(&event.date)
                );
            }
            page.push_str("</table>\n");
        }
    }

    page.push_str("</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use myip_core::types::{FetchResponse, RdapEvent, RdapInfo};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("192.0.2.1"), "192.0.2.1");
    }

    #[test]
    fn test_page_without_record() {
        let body = ApiResponse::from(FetchResponse::new("192.0.2.1", 3, RdapInfo::default()));
        let page = render_page(&body);

        assert!(page.contains("<h1>192.0.2.1</h1>"));
        assert!(page.contains("Requests seen from this address: 3"));
        assert!(!page.contains("Registry"));
    }

    #[test]
    fn test_page_escapes_registry_values() {
        let info = RdapInfo {
            name: "<script>alert(1)</script>".into(),
            events: vec![RdapEvent::new("registration", "1993 & later")],
            ..Default::default()
        };
        let page = render_page(&ApiResponse::from(FetchResponse::new("192.0.2.1", 1, info)));

        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("<td>1993 &amp; later</td>"));
    }
}
