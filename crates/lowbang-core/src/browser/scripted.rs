use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Locator, PageDriver, PageSession, SessionError, SessionFuture};

/// What a scripted page answers when probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementScript {
    /// Present with this text from the first probe.
    Text(String),
    /// Reported as "not yet present" for `polls` probes, then present.
    AppearsAfter { polls: usize, text: String },
    /// Never appears; the caller's wait runs out.
    Never,
    /// Definitively absent from a fully loaded page.
    Missing,
    /// Present but unreadable.
    Unreadable(String),
}

/// Canned behaviour for every URL containing a given fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScript {
    pub element: ElementScript,
    pub navigation_error: Option<String>,
    pub navigation_delay: Option<Duration>,
}

impl PageScript {
    pub fn new(element: ElementScript) -> Self {
        Self {
            element,
            navigation_error: None,
            navigation_delay: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ElementScript::Text(text.into()))
    }

    pub fn failing_navigation(message: impl Into<String>) -> Self {
        Self {
            navigation_error: Some(message.into()),
            ..Self::new(ElementScript::Never)
        }
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }
}

/// Session accounting shared between a [`ScriptedDriver`] and its sessions.
#[derive(Debug, Default)]
pub struct DriverStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

impl DriverStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sessions acquired but not yet released.
    pub fn open_sessions(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_visit(&self, url: &str) {
        self.visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_owned());
    }
}

/// Deterministic offline driver for mock mode and tests.
///
/// Pages are matched by URL fragment in registration order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    pages: Arc<Vec<(String, PageScript)>>,
    launch_error: Option<String>,
    stats: Arc<DriverStats>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned pages for the three default source sites.
    pub fn fixtures() -> Self {
        Self::new()
            .with_page("optioncharts.io", PageScript::text("24.5%IV"))
            .with_page("alphaspread.com", PageScript::text("182.40 USD"))
            .with_page("finance.yahoo.com", PageScript::text("227.48"))
    }

    pub fn with_page(mut self, url_fragment: impl Into<String>, script: PageScript) -> Self {
        Arc::make_mut(&mut self.pages).push((url_fragment.into(), script));
        self
    }

    /// Every `open` fails with this message.
    pub fn failing_launch(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }
}

impl PageDriver for ScriptedDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open<'a>(&'a self) -> SessionFuture<'a, Box<dyn PageSession>> {
        Box::pin(async move {
            if let Some(message) = &self.launch_error {
                return Err(SessionError::launch(message.clone()));
            }
            self.stats.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                pages: Arc::clone(&self.pages),
                stats: Arc::clone(&self.stats),
                current: None,
                probes: 0,
            }) as Box<dyn PageSession>)
        })
    }
}

struct ScriptedSession {
    pages: Arc<Vec<(String, PageScript)>>,
    stats: Arc<DriverStats>,
    current: Option<ElementScript>,
    probes: usize,
}

impl PageSession for ScriptedSession {
    fn navigate<'a>(&'a mut self, url: &'a str) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            self.stats.record_visit(url);
            let script = self
                .pages
                .iter()
                .find(|(fragment, _)| url.contains(fragment.as_str()))
                .map(|(_, script)| script.clone())
                .ok_or_else(|| SessionError::navigation(format!("no scripted page for {url}")))?;

            if let Some(delay) = script.navigation_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = script.navigation_error {
                return Err(SessionError::navigation(message));
            }

            self.current = Some(script.element);
            self.probes = 0;
            Ok(())
        })
    }

    fn probe_text<'a>(&'a mut self, locator: &'a Locator) -> SessionFuture<'a, Option<String>> {
        Box::pin(async move {
            self.probes += 1;
            let probes = self.probes;
            let element = self
                .current
                .as_ref()
                .ok_or_else(|| SessionError::navigation("no page loaded"))?;
            match element {
                ElementScript::Text(text) => Ok(Some(text.clone())),
                ElementScript::AppearsAfter { polls, text } => {
                    if probes > *polls {
                        Ok(Some(text.clone()))
                    } else {
                        Ok(None)
                    }
                }
                ElementScript::Never => Ok(None),
                ElementScript::Missing => Err(SessionError::not_found(format!(
                    "no element matches '{locator}'"
                ))),
                ElementScript::Unreadable(message) => Err(SessionError::element(message.clone())),
            }
        })
    }

    fn close(self: Box<Self>) -> SessionFuture<'static, ()> {
        Box::pin(async move {
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
