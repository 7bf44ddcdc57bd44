// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamps and the overall timing window of a merged run.

use crate::errors::{MergeErrorKind, TimestampParseError};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use quick_trx::Element;
use std::fmt;

pub(crate) static TIMES_TAG: &str = "Times";

static CREATION_ATTR: &str = "creation";
static QUEUING_ATTR: &str = "queuing";
static START_ATTR: &str = "start";
static FINISH_ATTR: &str = "finish";

// Timestamps without an offset are interpreted as UTC.
static NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp read from a TRX document.
///
/// Comparisons use the parsed instant, but the text is kept verbatim so that it is written back
/// exactly as it was read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrxTimestamp {
    raw: String,
    value: DateTime<FixedOffset>,
}

impl TrxTimestamp {
    /// Parses a timestamp.
    ///
    /// RFC 3339 is accepted (with any number of fractional digits, as written by vstest), as is
    /// the same shape without an offset.
    pub fn parse(input: &str) -> Result<Self, TimestampParseError> {
        let trimmed = input.trim();
        let value = match DateTime::parse_from_rfc3339(trimmed) {
            Ok(value) => value,
            Err(err) => NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|naive| naive.and_utc().fixed_offset())
                .ok_or_else(|| TimestampParseError::new(input, err))?,
        };

        Ok(Self {
            raw: input.to_owned(),
            value,
        })
    }

    /// Returns the timestamp exactly as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant.
    pub fn value(&self) -> DateTime<FixedOffset> {
        self.value
    }

    pub(crate) fn from_attribute(
        element: &Element,
        element_name: &'static str,
        attribute: &'static str,
    ) -> Result<Option<Self>, MergeErrorKind> {
        element
            .attribute(attribute)
            .map(|raw| {
                Self::parse(raw).map_err(|err| MergeErrorKind::InvalidTimestamp {
                    element: element_name,
                    attribute,
                    err,
                })
            })
            .transpose()
    }
}

impl fmt::Display for TrxTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One document's `Times` block. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimesObservation {
    /// When the run was created.
    pub creation: Option<TrxTimestamp>,

    /// When the run was queued.
    pub queuing: Option<TrxTimestamp>,

    /// When the run started.
    pub start: Option<TrxTimestamp>,

    /// When the run finished.
    pub finish: Option<TrxTimestamp>,
}

impl TimesObservation {
    /// Reads the attributes of a `Times` element.
    ///
    /// Absent attributes are `None`; present but unparseable ones are an error.
    pub fn from_element(element: &Element) -> Result<Self, MergeErrorKind> {
        Ok(Self {
            creation: TrxTimestamp::from_attribute(element, TIMES_TAG, CREATION_ATTR)?,
            queuing: TrxTimestamp::from_attribute(element, TIMES_TAG, QUEUING_ATTR)?,
            start: TrxTimestamp::from_attribute(element, TIMES_TAG, START_ATTR)?,
            finish: TrxTimestamp::from_attribute(element, TIMES_TAG, FINISH_ATTR)?,
        })
    }
}

/// The widest timing window seen across every merged document.
///
/// `creation`, `queuing` and `start` keep the earliest value observed, `finish` the latest.
/// Fields that were never observed stay empty and are left out of the output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeEnvelope {
    creation: Option<TrxTimestamp>,
    queuing: Option<TrxTimestamp>,
    start: Option<TrxTimestamp>,
    finish: Option<TrxTimestamp>,
}

impl TimeEnvelope {
    /// Creates an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one document's `Times` block into the envelope.
    pub fn observe(&mut self, observation: TimesObservation) {
        let TimesObservation {
            creation,
            queuing,
            start,
            finish,
        } = observation;

        keep_if(&mut self.creation, creation, |new, held| new < held);
        keep_if(&mut self.queuing, queuing, |new, held| new < held);
        keep_if(&mut self.start, start, |new, held| new < held);
        keep_if(&mut self.finish, finish, |new, held| new > held);
    }

    /// The earliest creation time.
    pub fn creation(&self) -> Option<&TrxTimestamp> {
        self.creation.as_ref()
    }

    /// The earliest queuing time.
    pub fn queuing(&self) -> Option<&TrxTimestamp> {
        self.queuing.as_ref()
    }

    /// The earliest start time.
    pub fn start(&self) -> Option<&TrxTimestamp> {
        self.start.as_ref()
    }

    /// The latest finish time.
    pub fn finish(&self) -> Option<&TrxTimestamp> {
        self.finish.as_ref()
    }

    /// Returns true if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.creation.is_none()
            && self.queuing.is_none()
            && self.start.is_none()
            && self.finish.is_none()
    }

    /// Builds a `Times` element, or `None` if nothing was observed.
    pub fn to_element(&self, namespace: Option<&str>) -> Option<Element> {
        if self.is_empty() {
            return None;
        }

        let mut times = Element::new(TIMES_TAG);
        times.set_namespace(namespace);
        for (name, value) in [
            (CREATION_ATTR, &self.creation),
            (QUEUING_ATTR, &self.queuing),
            (START_ATTR, &self.start),
            (FINISH_ATTR, &self.finish),
        ] {
            if let Some(value) = value {
                times.set_attribute(name, value.as_str());
            }
        }
        Some(times)
    }
}

fn keep_if(
    held: &mut Option<TrxTimestamp>,
    new: Option<TrxTimestamp>,
    replaces: impl Fn(DateTime<FixedOffset>, DateTime<FixedOffset>) -> bool,
) {
    let Some(new) = new else {
        return;
    };
    let replace = match held {
        Some(current) => replaces(new.value, current.value),
        None => true,
    };
    if replace {
        *held = Some(new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn ts(input: &str) -> TrxTimestamp {
        TrxTimestamp::parse(input).expect("valid timestamp")
    }

    fn observation(
        creation: Option<&str>,
        queuing: Option<&str>,
        start: Option<&str>,
        finish: Option<&str>,
    ) -> TimesObservation {
        TimesObservation {
            creation: creation.map(ts),
            queuing: queuing.map(ts),
            start: start.map(ts),
            finish: finish.map(ts),
        }
    }

    #[test_case("2023-05-10T14:22:31.1234567+02:00" ; "vstest seven fractional digits")]
    #[test_case("2023-05-10T12:22:31Z" ; "utc designator")]
    #[test_case("2023-05-10T12:22:31.5" ; "no offset")]
    #[test_case("2023-05-10 12:22:31" ; "space separator")]
    fn parses(input: &str) {
        let parsed = ts(input);
        assert_eq!(parsed.as_str(), input, "text is preserved verbatim");
    }

    #[test_case("" ; "empty")]
    #[test_case("yesterday" ; "words")]
    #[test_case("2023-13-10T12:22:31Z" ; "bad month")]
    fn rejects(input: &str) {
        let error = TrxTimestamp::parse(input).expect_err("invalid timestamp");
        assert_eq!(error.input(), input);
    }

    #[test]
    fn compares_instants_not_text() {
        // 10:00 at +02:00 is earlier than 09:00 UTC.
        let earlier = ts("2023-05-10T10:00:00+02:00");
        let later = ts("2023-05-10T09:00:00Z");
        assert!(earlier.value() < later.value());

        let mut envelope = TimeEnvelope::new();
        envelope.observe(observation(None, None, Some(later.as_str()), None));
        envelope.observe(observation(None, None, Some(earlier.as_str()), None));
        assert_eq!(envelope.start(), Some(&earlier));
    }

    #[test]
    fn widest_window_across_observations() {
        let mut envelope = TimeEnvelope::new();
        envelope.observe(observation(
            Some("2023-01-01T10:00:00Z"),
            Some("2023-01-01T10:00:01Z"),
            Some("2023-01-01T10:00:02Z"),
            Some("2023-01-01T10:05:00Z"),
        ));
        envelope.observe(observation(
            Some("2023-01-01T09:00:00Z"),
            None,
            Some("2023-01-01T11:00:00Z"),
            Some("2023-01-01T11:30:00Z"),
        ));

        assert_eq!(envelope.creation().map(|t| t.as_str()), Some("2023-01-01T09:00:00Z"));
        assert_eq!(envelope.queuing().map(|t| t.as_str()), Some("2023-01-01T10:00:01Z"));
        assert_eq!(envelope.start().map(|t| t.as_str()), Some("2023-01-01T10:00:02Z"));
        assert_eq!(envelope.finish().map(|t| t.as_str()), Some("2023-01-01T11:30:00Z"));
    }

    #[test]
    fn equal_instants_keep_first_text() {
        let mut envelope = TimeEnvelope::new();
        envelope.observe(observation(None, None, None, Some("2023-01-01T10:00:00Z")));
        envelope.observe(observation(None, None, None, Some("2023-01-01T12:00:00+02:00")));
        assert_eq!(envelope.finish().map(|t| t.as_str()), Some("2023-01-01T10:00:00Z"));
    }

    #[test]
    fn unobserved_fields_are_omitted() {
        let mut envelope = TimeEnvelope::new();
        assert_eq!(envelope.to_element(None), None);

        envelope.observe(TimesObservation::default());
        assert!(envelope.is_empty(), "an empty Times block observes nothing");

        envelope.observe(observation(None, None, Some("2023-01-01T10:00:00Z"), None));
        let element = envelope.to_element(Some("urn:trx")).expect("start was observed");
        assert_eq!(element.name, "Times");
        assert_eq!(element.namespace.as_deref(), Some("urn:trx"));
        let attributes: Vec<_> = element.attributes.keys().map(String::as_str).collect();
        assert_eq!(attributes, vec!["start"]);
    }

    #[test]
    fn invalid_times_attribute() {
        let mut element = Element::new(TIMES_TAG);
        element
            .set_attribute("start", "2023-01-01T10:00:00Z")
            .set_attribute("finish", "not a time");

        let error = TimesObservation::from_element(&element).expect_err("finish is invalid");
        assert!(
            matches!(
                error,
                MergeErrorKind::InvalidTimestamp {
                    element: "Times",
                    attribute: "finish",
                    ..
                }
            ),
            "unexpected error: {error:?}"
        );
    }
}
