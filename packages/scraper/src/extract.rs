//! Named extraction rules.
//!
//! A [`FieldRule`] names one field of a record and says where to find it on
//! the page. [`extract`] runs a rule set against a parsed document and
//! returns an [`Extraction`]: the matched text per field plus one
//! [`FieldError`] per field that could not be located. Callers then parse
//! the text with [`Extraction::parse_first`] and friends, which record
//! malformed values as field errors instead of aborting.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// A problem with a single extracted field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The rule's selector does not parse.
    #[error("{field}: invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// Field name.
        field: String,
        /// Selector text.
        selector: String,
        /// Parser message.
        message: String,
    },

    /// Nothing on the page matched a required field.
    #[error("{field}: not found on page")]
    Missing {
        /// Field name.
        field: String,
    },

    /// The field was found but its text could not be interpreted.
    #[error("{field}: cannot parse '{value}': {message}")]
    Malformed {
        /// Field name.
        field: String,
        /// Extracted text.
        value: String,
        /// Why it was rejected.
        message: String,
    },
}

impl FieldError {
    /// Name of the field this error is about.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidSelector { field, .. }
            | Self::Missing { field }
            | Self::Malformed { field, .. } => field,
        }
    }
}

/// Where a field lives on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Every element matching a CSS selector, in document order.
    Css(String),
    /// Values sitting next to a text label:
    /// `<div><h5>Saving Throws</h5><span>Dex +5</span></div>`.
    ///
    /// Finds the first `label_selector` element whose text equals `label`
    /// (ignoring ASCII case), then returns the direct children of its parent
    /// that match `value_selector`.
    Labelled {
        /// Selector for candidate label elements (e.g. `h5`).
        label_selector: String,
        /// Label text to look for.
        label: String,
        /// Selector for the value siblings (e.g. `span`).
        value_selector: String,
    },
}

/// One named field and how to locate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Field name used in errors and as the extraction key.
    pub name: String,
    /// Where the field lives.
    pub locator: Locator,
    /// Whether a missing field is an error.
    pub required: bool,
}

impl FieldRule {
    /// An optional field located by a CSS selector.
    #[must_use]
    pub fn css(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_owned(),
            locator: Locator::Css(selector.to_owned()),
            required: false,
        }
    }

    /// An optional field located next to a text label.
    #[must_use]
    pub fn labelled(name: &str, label_selector: &str, label: &str, value_selector: &str) -> Self {
        Self {
            name: name.to_owned(),
            locator: Locator::Labelled {
                label_selector: label_selector.to_owned(),
                label: label.to_owned(),
                value_selector: value_selector.to_owned(),
            },
            required: false,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the elements this rule matches in `document`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidSelector`] if a selector does not parse.
    pub fn select<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, FieldError> {
        let parse = |selector: &str| {
            parse_selector(selector).map_err(|e| FieldError::InvalidSelector {
                field: self.name.clone(),
                selector: selector.to_owned(),
                message: e.to_string(),
            })
        };

        match &self.locator {
            Locator::Css(selector) => Ok(document.select(&parse(selector)?).collect()),
            Locator::Labelled {
                label_selector,
                label,
                value_selector,
            } => {
                let label_sel = parse(label_selector)?;
                let value_sel = parse(value_selector)?;
                let Some(label_el) = document
                    .select(&label_sel)
                    .find(|el| element_text(*el).eq_ignore_ascii_case(label))
                else {
                    return Ok(Vec::new());
                };
                let Some(parent) = label_el.parent().and_then(ElementRef::wrap) else {
                    return Ok(Vec::new());
                };
                Ok(parent
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| value_sel.matches(child))
                    .collect())
            }
        }
    }
}

/// Parses a CSS selector.
///
/// # Errors
///
/// Returns [`ScrapeError::Selector`] if `selector` does not parse.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_owned(),
        message: e.to_string(),
    })
}

/// All text under `element`, with runs of whitespace collapsed to single
/// spaces and the ends trimmed.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The text extracted by a rule set, plus per-field errors.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    values: BTreeMap<String, Vec<String>>,
    required: BTreeSet<String>,
    errors: Vec<FieldError>,
}

impl Extraction {
    /// First matched text for `field`.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every matched text for `field`, in document order.
    #[must_use]
    pub fn all(&self, field: &str) -> &[String] {
        self.values.get(field).map_or(&[], Vec::as_slice)
    }

    /// Parses the first matched text for `field` with `parse`.
    ///
    /// Returns `None` when the field is absent or malformed; a malformed
    /// value is recorded as a [`FieldError::Malformed`].
    pub fn parse_first<T, E, F>(&mut self, field: &str, parse: F) -> Option<T>
    where
        E: Display,
        F: FnOnce(&str) -> Result<T, E>,
    {
        let value = self.first(field)?.to_owned();
        match parse(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.reject(field, &value, e);
                None
            }
        }
    }

    /// Parses every matched text for `field` together with `parse`.
    pub fn parse_all<T, E, F>(&mut self, field: &str, parse: F) -> Option<T>
    where
        E: Display,
        F: FnOnce(&[String]) -> Result<T, E>,
    {
        let values = self.values.get(field)?.clone();
        match parse(&values) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.reject(field, &values.join(" | "), e);
                None
            }
        }
    }

    /// Records a malformed value for `field`.
    pub fn reject(&mut self, field: &str, value: &str, reason: impl Display) {
        self.errors.push(FieldError::Malformed {
            field: field.to_owned(),
            value: value.to_owned(),
            message: reason.to_string(),
        });
    }

    /// Every recorded field error.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors on required fields.
    pub fn fatal_errors(&self) -> impl Iterator<Item = &FieldError> {
        self.errors
            .iter()
            .filter(|e| self.required.contains(e.field()))
    }

    /// Errors on optional fields.
    pub fn warnings(&self) -> impl Iterator<Item = &FieldError> {
        self.errors
            .iter()
            .filter(|e| !self.required.contains(e.field()))
    }
}

/// Runs every rule against `document`.
///
/// Rules never abort each other: each failure is recorded against its own
/// field.
#[must_use]
pub fn extract(document: &Html, rules: &[FieldRule]) -> Extraction {
    let mut extraction = Extraction::default();

    for rule in rules {
        if rule.required {
            extraction.required.insert(rule.name.clone());
        }
        match rule.select(document) {
            Ok(elements) => {
                let texts: Vec<String> = elements
                    .into_iter()
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect();
                if texts.is_empty() {
                    if rule.required {
                        extraction.errors.push(FieldError::Missing {
                            field: rule.name.clone(),
                        });
                    } else {
                        log::trace!("Optional field '{}' not present", rule.name);
                    }
                } else {
                    extraction.values.insert(rule.name.clone(), texts);
                }
            }
            Err(e) => extraction.errors.push(e),
        }
    }

    extraction
}
