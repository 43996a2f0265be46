//! Thin query layer over `scraper`.
//!
//! `scraper::Html` is not `Send`, so documents are parsed, queried and dropped
//! inside synchronous functions. Extractors copy out what they need before the
//! next `.await`.

use crate::core::error::{Result, VideoError};
use scraper::{ElementRef, Html, Selector};

pub struct Document {
    html: Html,
}

#[derive(Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    pub fn text(&self) -> String {
        self.inner.text().collect::<String>().trim().to_string()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| VideoError::malformed(format!("selector {}: {}", css, e)))
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn select_all(&self, css: &str) -> Result<Vec<Element<'_>>> {
        let selector = selector(css)?;
        Ok(self
            .html
            .select(&selector)
            .map(|inner| Element { inner })
            .collect())
    }

    pub fn first_attr(&self, css: &str, attr: &str) -> Result<Option<String>> {
        Ok(self
            .select_all(css)?
            .into_iter()
            .find_map(|el| el.attr(attr))
            .map(|value| value.trim().to_string()))
    }

    pub fn first_text(&self, css: &str) -> Result<Option<String>> {
        Ok(self
            .select_all(css)?
            .into_iter()
            .map(|el| el.text())
            .find(|text| !text.is_empty()))
    }

    /// Content of `<meta property=..>` or `<meta name=..>`.
    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        let css = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
        self.first_attr(&css, "content")
    }

    /// Like [`Document::meta`] but a missing tag is a malformed page.
    pub fn require_meta(&self, key: &str) -> Result<String> {
        self.meta(key)?
            .ok_or_else(|| VideoError::malformed(format!("missing meta {}", key)))
    }
}
