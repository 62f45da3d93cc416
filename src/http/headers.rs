use std::fmt;

use anyhow::Context;

use super::{get_line, skip_line};

#[derive(Debug, Clone, PartialEq)]
pub enum HttpHeader {
    Custom { name: String, value: String },
    ContentLength(usize),
    ContentType { media_type: String },
    Date(httpdate::HttpDate),
}

impl HttpHeader {
    pub fn from_name_value(name: &str, value: &str) -> anyhow::Result<Self> {
        match name.to_lowercase().as_str() {
            "content-length" => Ok(Self::ContentLength(
                value.trim().parse().context("parse content length")?,
            )),
            "content-type" => Ok(Self::ContentType {
                media_type: value.trim().to_owned(),
            }),
            "date" => Ok(Self::Date(value.trim().parse().context("parse date")?)),
            _ => Ok(Self::Custom {
                name: name.to_owned(),
                value: value.trim().to_owned(),
            }),
        }
    }

    pub fn json() -> Self {
        Self::ContentType {
            media_type: "application/json".to_owned(),
        }
    }
}

impl fmt::Display for HttpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentLength(length) => write!(f, "Content-Length: {}", length),
            Self::ContentType { media_type } => write!(f, "Content-Type: {}", media_type),
            Self::Date(date) => write!(f, "Date: {}", date),
            Self::Custom { name, value } => write!(f, "{}: {}", name, value),
        }
    }
}

/// Walks the header block of a response. Lines that do not parse are
/// skipped.
#[derive(Debug)]
pub struct HeaderIter<'a> {
    cursor: &'a [u8],
}

impl<'a> Iterator for HeaderIter<'a> {
    type Item = HttpHeader;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.cursor.is_empty() {
            let line = self.cursor;
            self.cursor = skip_line(self.cursor);
            match parse_header(line) {
                Ok(header) => return Some(header),
                Err(e) => tracing::debug!("skip response header: {e:#}"),
            }
        }
        None
    }
}

impl<'a> HeaderIter<'a> {
    pub fn new(cursor: &'a [u8]) -> Self {
        Self { cursor }
    }
}

fn parse_header(line: &[u8]) -> anyhow::Result<HttpHeader> {
    let (name, value) = std::str::from_utf8(get_line(line))
        .context("parse header with non-UTF8")?
        .split_once(':')
        .ok_or_else(|| anyhow::Error::msg("colon ':' not found"))?;
    HttpHeader::from_name_value(name.trim(), value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn try_http_date() {
        let h = HttpHeader::from_name_value("Date", " Fri, 24 Nov 2023 06:58:19 GMT").unwrap();
        assert!(matches!(h, HttpHeader::Date(_)));
        assert_eq!(h.to_string(), "Date: Fri, 24 Nov 2023 06:58:19 GMT");
    }

    #[test]
    fn request_headers_render() {
        assert_eq!(HttpHeader::json().to_string(), "Content-Type: application/json");
        assert_eq!(HttpHeader::ContentLength(0).to_string(), "Content-Length: 0");
        let host = HttpHeader::from_name_value("Host", "127.0.0.1:8080").unwrap();
        assert_eq!(host.to_string(), "Host: 127.0.0.1:8080");
    }

    #[test]
    fn header_names_are_case_insensitive() {
        assert_eq!(
            HttpHeader::from_name_value("content-LENGTH", " 42 ").unwrap(),
            HttpHeader::ContentLength(42)
        );
        assert_eq!(
            HttpHeader::from_name_value("Content-type", "application/json").unwrap(),
            HttpHeader::json()
        );
    }

    #[test]
    fn iter_skips_garbage() {
        let block = b"Content-Length: 2\r\nServer: hyper\r\nnot a header\r\nX-Late: 1";
        let headers: Vec<_> = HeaderIter::new(block).collect();
        assert_eq!(
            headers,
            vec![
                HttpHeader::ContentLength(2),
                HttpHeader::Custom {
                    name: "Server".to_owned(),
                    value: "hyper".to_owned()
                },
                HttpHeader::Custom {
                    name: "X-Late".to_owned(),
                    value: "1".to_owned()
                },
            ]
        );
    }

    #[test]
    fn bad_date_does_not_hide_later_headers() {
        let block = b"Date: yesterday\r\nX-Bytes: \xff\xfe\r\nContent-Length: 2";
        let headers: Vec<_> = HeaderIter::new(block).collect();
        assert_eq!(headers, vec![HttpHeader::ContentLength(2)]);
    }
}
