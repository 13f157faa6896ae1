//! Browser driver seam.
//!
//! The extractor only needs four primitives from a page engine: open an
//! exclusive session, navigate, probe for an element's text, and close. They
//! are expressed as object-safe traits so the production Chromium engine, the
//! plain-HTML engine and the scripted offline engine are interchangeable.
//!
//! | Driver | Engine | Renders JavaScript |
//! |--------|--------|--------------------|
//! | [`ChromiumDriver`] | headless Chrome via CDP | yes |
//! | [`StaticHtmlDriver`] | reqwest + scraper | no |
//! | [`ScriptedDriver`] | canned responses | n/a |

mod chromium;
mod scripted;
mod static_html;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub use chromium::{ChromiumDriver, ChromiumOptions};
pub use scripted::{DriverStats, ElementScript, PageScript, ScriptedDriver};
pub use static_html::StaticHtmlDriver;

pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + Send + 'a>>;

/// How the target element is found on a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Single CSS class name, without the leading dot.
    ClassName { name: String },
    /// Arbitrary CSS selector.
    Css { selector: String },
    /// Element of `tag` carrying `data-field="<field>"`.
    DataField { tag: String, field: String },
}

impl Locator {
    pub fn class_name(name: impl Into<String>) -> Self {
        Self::ClassName { name: name.into() }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn data_field(tag: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DataField {
            tag: tag.into(),
            field: field.into(),
        }
    }

    /// CSS selector understood by every driver.
    pub fn css_selector(&self) -> String {
        match self {
            Self::ClassName { name } => format!(".{}", name.trim()),
            Self::Css { selector } => selector.trim().to_owned(),
            Self::DataField { tag, field } => format!("{}[data-field='{}']", tag.trim(), field.trim()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::ClassName { name } => name.trim().is_empty(),
            Self::Css { selector } => selector.trim().is_empty(),
            Self::DataField { tag, field } => tag.trim().is_empty() || field.trim().is_empty(),
        }
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.css_selector())
    }
}

/// Session-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The engine could not be started.
    Launch,
    /// The page could not be loaded.
    Navigation,
    /// The page is fully loaded and the element will never appear.
    NotFound,
    /// The element exists but its text could not be read.
    Element,
    /// The session was used after it was closed.
    Closed,
    /// Resources could not be released cleanly.
    Shutdown,
}

/// Structured driver error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    kind: SessionErrorKind,
    message: String,
}

impl SessionError {
    pub fn launch(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Launch, message)
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Navigation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::NotFound, message)
    }

    pub fn element(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Element, message)
    }

    pub fn closed() -> Self {
        Self::new(SessionErrorKind::Closed, "session already closed")
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Shutdown, message)
    }

    fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SessionErrorKind {
        self.kind
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SessionError {}

/// One exclusive page session. Never shared between extractions.
pub trait PageSession: Send {
    /// Load `url`, replacing whatever the session showed before.
    fn navigate<'a>(&'a mut self, url: &'a str) -> SessionFuture<'a, ()>;

    /// Look for the element once without blocking.
    ///
    /// `Ok(None)` means "not present yet"; the caller decides whether to poll
    /// again. Engines that cannot change the page after load report a missing
    /// element as [`SessionErrorKind::NotFound`] instead.
    fn probe_text<'a>(&'a mut self, locator: &'a Locator) -> SessionFuture<'a, Option<String>>;

    /// Release every resource held by the session.
    fn close(self: Box<Self>) -> SessionFuture<'static, ()>;
}

/// Page engine that hands out sessions.
pub trait PageDriver: Send + Sync {
    /// Short engine name used in logs and reports.
    fn name(&self) -> &'static str;

    fn open<'a>(&'a self) -> SessionFuture<'a, Box<dyn PageSession>>;
}
