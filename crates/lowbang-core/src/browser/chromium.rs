use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Locator, PageDriver, PageSession, SessionError, SessionFuture};

/// Launch options for [`ChromiumDriver`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Show the browser window instead of running headless.
    pub headed: bool,
    /// Explicit Chrome/Chromium executable; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Pass `--no-sandbox`, required when running as root in containers.
    pub no_sandbox: bool,
    /// Upper bound for a single CDP request.
    pub request_timeout: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headed: false,
            executable: None,
            no_sandbox: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Production driver: one fresh Chrome process per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumDriver {
    options: ChromiumOptions,
}

impl ChromiumDriver {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder().request_timeout(self.options.request_timeout);
        if self.options.headed {
            builder = builder.with_head();
        }
        if self.options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|message| SessionError::launch(format!("invalid browser config: {message}")))
    }
}

impl PageDriver for ChromiumDriver {
    fn name(&self) -> &'static str {
        "chromium"
    }

    fn open<'a>(&'a self) -> SessionFuture<'a, Box<dyn PageSession>> {
        Box::pin(async move {
            let config = self.browser_config()?;
            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| SessionError::launch(format!("failed to launch browser: {e}")))?;

            // CDP events must be drained for the browser to make progress.
            let events = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let mut session = ChromiumSession {
                browser,
                events,
                page: None,
            };

            match session.browser.new_page("about:blank").await {
                Ok(page) => {
                    session.page = Some(page);
                    debug!("chromium session opened");
                    Ok(Box::new(session) as Box<dyn PageSession>)
                }
                Err(e) => {
                    let message = format!("failed to open page: {e}");
                    let _ = Box::new(session).close().await;
                    Err(SessionError::launch(message))
                }
            }
        })
    }
}

struct ChromiumSession {
    browser: Browser,
    events: JoinHandle<()>,
    page: Option<Page>,
}

impl PageSession for ChromiumSession {
    fn navigate<'a>(&'a mut self, url: &'a str) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            let page = self.page.as_ref().ok_or_else(SessionError::closed)?;
            page.goto(url)
                .await
                .map_err(|e| SessionError::navigation(format!("failed to load {url}: {e}")))?;
            Ok(())
        })
    }

    fn probe_text<'a>(&'a mut self, locator: &'a Locator) -> SessionFuture<'a, Option<String>> {
        Box::pin(async move {
            let page = self.page.as_ref().ok_or_else(SessionError::closed)?;
            // The page may still be rendering; a failed lookup means "not yet".
            let Ok(element) = page.find_element(locator.css_selector()).await else {
                return Ok(None);
            };
            let text = element
                .inner_text()
                .await
                .map_err(|e| SessionError::element(format!("failed to read '{locator}': {e}")))?;
            Ok(Some(text.unwrap_or_default()))
        })
    }

    fn close(self: Box<Self>) -> SessionFuture<'static, ()> {
        Box::pin(async move {
            let mut this = *self;
            this.page = None;
            let closed = this.browser.close().await;
            let _ = this.browser.wait().await;
            this.events.abort();
            debug!("chromium session closed");
            closed
                .map(|_| ())
                .map_err(|e| SessionError::shutdown(format!("failed to close browser: {e}")))
        })
    }
}
