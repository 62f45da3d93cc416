use anyhow::Context;

use super::get_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status<'a> {
    code: u16,
    reason_phrase: &'a str,
}

impl<'a> Status<'a> {
    pub fn new(meta: &'a [u8]) -> anyhow::Result<Self> {
        let status_line =
            std::str::from_utf8(get_line(meta)).context("status line contains non-UTF8 bytes")?;
        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            anyhow::bail!("status line does not start with an HTTP version: {status_line:?}");
        }
        let status_code = parts
            .next()
            .ok_or_else(|| anyhow::Error::msg("status line has no status code"))?;
        Ok(Self {
            code: status_code
                .trim()
                .parse()
                .context("status code is not a u16 integer")?,
            reason_phrase: parts.next().unwrap_or_default().trim(),
        })
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason_phrase(&self) -> &'a str {
        self.reason_phrase
    }

    /// Only a plain 200 counts; other 2xx codes are treated like failures.
    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}
