use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::debug;

use super::{Locator, PageDriver, PageSession, SessionError, SessionFuture};

/// Script-free driver: fetches the page once over HTTP and queries the markup.
///
/// Pages that build the target element client-side will report
/// [`SessionErrorKind::NotFound`](super::SessionErrorKind::NotFound); use
/// [`ChromiumDriver`](super::ChromiumDriver) for those.
#[derive(Debug, Clone)]
pub struct StaticHtmlDriver {
    client: Arc<reqwest::Client>,
    timeout: Duration,
}

impl StaticHtmlDriver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("lowbang/", env!("CARGO_PKG_VERSION")))
                    .cookie_store(true)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
            timeout,
        }
    }
}

impl Default for StaticHtmlDriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl PageDriver for StaticHtmlDriver {
    fn name(&self) -> &'static str {
        "static"
    }

    fn open<'a>(&'a self) -> SessionFuture<'a, Box<dyn PageSession>> {
        Box::pin(async move {
            Ok(Box::new(StaticHtmlSession {
                client: Arc::clone(&self.client),
                timeout: self.timeout,
                document: None,
            }) as Box<dyn PageSession>)
        })
    }
}

struct StaticHtmlSession {
    client: Arc<reqwest::Client>,
    timeout: Duration,
    document: Option<String>,
}

impl PageSession for StaticHtmlSession {
    fn navigate<'a>(&'a mut self, url: &'a str) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        SessionError::navigation(format!("request timeout: {e}"))
                    } else if e.is_connect() {
                        SessionError::navigation(format!("connection failed: {e}"))
                    } else {
                        SessionError::navigation(format!("request failed: {e}"))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(SessionError::navigation(format!(
                    "{url} responded with HTTP {}",
                    status.as_u16()
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| SessionError::navigation(format!("failed to read response body: {e}")))?;
            debug!(bytes = body.len(), "static page loaded");
            self.document = Some(body);
            Ok(())
        })
    }

    fn probe_text<'a>(&'a mut self, locator: &'a Locator) -> SessionFuture<'a, Option<String>> {
        Box::pin(async move {
            let document = self
                .document
                .as_deref()
                .ok_or_else(|| SessionError::navigation("no page loaded"))?;
            select_text(document, locator).map(Some)
        })
    }

    fn close(self: Box<Self>) -> SessionFuture<'static, ()> {
        Box::pin(async move {
            drop(self);
            Ok(())
        })
    }
}

/// Text of the first element matching `locator`.
fn select_text(html: &str, locator: &Locator) -> Result<String, SessionError> {
    let css = locator.css_selector();
    let selector = Selector::parse(&css)
        .map_err(|e| SessionError::element(format!("invalid selector '{css}': {e}")))?;
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .ok_or_else(|| SessionError::not_found(format!("no element matches '{css}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SessionErrorKind;

    const PAGE: &str = r#"
        <html><body>
          <fin-streamer data-field="regularMarketPrice">230.10</fin-streamer>
          <fin-streamer data-field="regularMarketPreviousClose"> 1,227.48 </fin-streamer>
          <svg><text class="highcharts-text-outline">24.5%<tspan>IV</tspan></text></svg>
        </body></html>
    "#;

    #[test]
    fn selects_data_field_text() {
        let locator = Locator::data_field("fin-streamer", "regularMarketPreviousClose");
        assert_eq!(select_text(PAGE, &locator).expect("present"), " 1,227.48 ");
    }

    #[test]
    fn concatenates_nested_text_nodes() {
        let locator = Locator::class_name("highcharts-text-outline");
        assert_eq!(select_text(PAGE, &locator).expect("present"), "24.5%IV");
    }

    #[test]
    fn missing_element_is_not_found() {
        let err = select_text(PAGE, &Locator::css(".valuation-scenario-value")).expect_err("absent");
        assert_eq!(err.kind(), SessionErrorKind::NotFound);
    }

    #[test]
    fn malformed_selector_is_element_error() {
        let err = select_text(PAGE, &Locator::css("fin-streamer[")).expect_err("bad selector");
        assert_eq!(err.kind(), SessionErrorKind::Element);
    }

    #[tokio::test]
    async fn probing_before_navigation_fails() {
        let driver = StaticHtmlDriver::default();
        let mut session = driver.open().await.expect("open never fails");
        let err = session
            .probe_text(&Locator::css("body"))
            .await
            .expect_err("nothing loaded");
        assert_eq!(err.kind(), SessionErrorKind::Navigation);
        session.close().await.expect("close");
    }
}
