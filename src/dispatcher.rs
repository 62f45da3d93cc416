use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::debug;
use url::{Host, Url};

use crate::address::BaseUrl;
use crate::console::ConsoleSink;
use crate::error::RequestError;
use crate::http::{HttpContext, HttpHeader, Method};

/// Issues GETs against the door service and hands successful bodies to a
/// console sink.
#[derive(Debug, Clone)]
pub struct DoorClient<P, C> {
    base: P,
    console: C,
}

impl<P: BaseUrl, C: ConsoleSink> DoorClient<P, C> {
    pub fn new(base: P, console: C) -> Self {
        Self { base, console }
    }

    pub fn base(&self) -> &P {
        &self.base
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Plain concatenation, no slash handling.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base.base_url(), path)
    }

    /// Returns the raw body of a 200 answer.
    pub async fn get(&self, path: &str) -> Result<String, RequestError> {
        fetch(&self.url_for(path)).await
    }

    /// [`get`](Self::get), then logs the body to the console.
    pub async fn dispatch(&self, path: &str) -> Result<(), RequestError> {
        let body = self.get(path).await?;
        self.console.log(&body);
        Ok(())
    }

    pub fn fire(&self, path: &str) -> JoinHandle<()>
    where
        C: Clone + Send + 'static,
    {
        self.fire_to(path, self.console.clone())
    }

    /// Spawns the request and forgets about it: a 200 body goes to `sink`,
    /// anything else is dropped without touching the sink. The URL is built
    /// now, so later host edits do not affect this request. Dropping the
    /// handle does not cancel it.
    pub fn fire_to<S>(&self, path: &str, sink: S) -> JoinHandle<()>
    where
        S: ConsoleSink + Send + 'static,
    {
        let url = self.url_for(path);
        tokio::spawn(async move {
            match fetch(&url).await {
                Ok(body) => sink.log(&body),
                Err(error) => debug!(%url, %error, "response dropped"),
            }
        })
    }
}

/// GET `url` with an empty body and return the body of a 200 answer.
pub async fn fetch(url: &str) -> Result<String, RequestError> {
    let target = Target::parse(url)?;
    debug!(%url, "GET");
    let response = target.exchange().await?;
    debug!(%url, code = response.code, bytes = response.body.len(), "response");
    if response.ok {
        Ok(response.body)
    } else {
        Err(RequestError::Status {
            code: response.code,
            reason: response.reason,
            body: response.body,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Target {
    host: String,
    port: u16,
    authority: String,
    resource: String,
}

struct Response {
    ok: bool,
    code: u16,
    reason: String,
    body: String,
}

impl Target {
    fn parse(url: &str) -> Result<Self, RequestError> {
        let unsupported = |reason| RequestError::UnsupportedUrl {
            url: url.to_owned(),
            reason,
        };
        let parsed = Url::parse(url).map_err(|source| RequestError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        if parsed.scheme() != "http" {
            return Err(unsupported("only plain http is supported"));
        }
        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_owned(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(unsupported("url has no host")),
        };
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| unsupported("url has no port"))?;
        let authority = format!("{}:{}", parsed.host_str().unwrap_or(&host), port);
        let resource = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_owned(),
        };
        Ok(Self {
            host,
            port,
            authority,
            resource,
        })
    }

    async fn exchange(&self) -> anyhow::Result<Response> {
        let mut http = HttpContext::connect(&self.host, self.port).await?;
        if let Ok(peer) = http.peer() {
            tracing::trace!(%peer, "connected");
        }
        http.begin_request(Method::Get, &self.resource).await?;
        http.request_header(HttpHeader::from_name_value("Host", &self.authority)?)
            .await?;
        // meaningless on a GET, but the door service has always been sent it
        http.request_header(HttpHeader::json()).await?;
        http.request_header(HttpHeader::ContentLength(0)).await?;
        http.request_headers_end().await?;
        http.request_body_chunk(b"").await?;
        http.end_request().await?;

        http.response_begin().await?;
        let status = http.status().context("parse status line")?;
        let (ok, code, reason) = (
            status.is_ok(),
            status.code(),
            status.reason_phrase().to_owned(),
        );
        if let Some(date) = http.date() {
            debug!(server_date = %date, "response date");
        }
        let body = http.response_body().await?;
        Ok(Response {
            ok,
            code,
            reason,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::console::Console;

    #[test]
    fn target_from_resolved_url() {
        let target = Target::parse("http://127.0.0.1:8080/v1.0/door_status").unwrap();
        assert_eq!(
            target,
            Target {
                host: "127.0.0.1".to_owned(),
                port: 8080,
                authority: "127.0.0.1:8080".to_owned(),
                resource: "/v1.0/door_status".to_owned(),
            }
        );
    }

    #[test]
    fn target_keeps_query_and_brackets_ipv6_authority() {
        let target = Target::parse("http://[::1]:5000/v1.0/ping?x=1").unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.authority, "[::1]:5000");
        assert_eq!(target.resource, "/v1.0/ping?x=1");
    }

    #[test]
    fn malformed_urls_are_rejected() {
        for url in ["http://:8080/v1.0/ping", "http://a b:8080/", "http://::1:8080/"] {
            assert!(
                matches!(Target::parse(url), Err(RequestError::InvalidUrl { .. })),
                "{url}"
            );
        }
        assert!(matches!(
            Target::parse("https://door:8080/v1.0/ping"),
            Err(RequestError::UnsupportedUrl { .. })
        ));
    }

    #[test]
    fn url_is_plain_concatenation() {
        let client = DoorClient::new(|| "http://door:8080".to_owned(), Console::new());
        assert_eq!(client.url_for("/v1.0/ping"), "http://door:8080/v1.0/ping");
        assert_eq!(client.url_for("v1.0/ping"), "http://door:8080v1.0/ping");
    }

    #[tokio::test]
    async fn fired_request_to_malformed_url_logs_nothing() {
        let console = Console::new();
        let client = DoorClient::new(|| "http://:8080".to_owned(), console.clone());
        client.fire("/v1.0/ping").await.unwrap();
        assert!(console.is_empty());
    }
}
