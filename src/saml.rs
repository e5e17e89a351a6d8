use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

/// Validity window taken from an assertion's `<Conditions>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionsWindow {
    pub not_before: DateTime<Utc>,
    pub not_on_or_after: DateTime<Utc>,
}

impl ConditionsWindow {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now < self.not_on_or_after
    }
}

/// Whether a cached SAML assertion can still be handed to STS at `now`.
///
/// The document must be well-formed XML from start to end and carry a `Conditions`
/// element whose window covers `now`. Anything else, including no document, is invalid.
pub fn is_valid_saml_assertion(xml: Option<&[u8]>, now: DateTime<Utc>) -> bool {
    let Some(xml) = xml else {
        return false;
    };

    match conditions_window(xml) {
        Ok(window) => window.contains(now),
        Err(e) => {
            debug!("Rejecting SAML assertion: {:#}", e);
            false
        }
    }
}

/// Scan the whole document and return the first `Conditions` window.
pub fn conditions_window(xml: &[u8]) -> Result<ConditionsWindow> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut window = None;
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                saw_root = true;
                if window.is_none() && is_conditions(e) {
                    window = Some(read_window(e)?);
                }
            }
            Ok(Event::Empty(ref e)) => {
                saw_root = true;
                if window.is_none() && is_conditions(e) {
                    window = Some(read_window(e)?);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .context("Unexpected closing tag in SAML assertion")?;
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("Error parsing SAML assertion: {}", e),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        bail!("SAML assertion has no root element");
    }
    if depth != 0 {
        bail!("SAML assertion ends with {} unclosed element(s)", depth);
    }

    window.context("SAML assertion has no Conditions element")
}

/// `Conditions`, `saml:Conditions` and `saml2:Conditions` all match
fn is_conditions(e: &BytesStart) -> bool {
    e.local_name().as_ref() == b"Conditions"
}

fn read_window(e: &BytesStart) -> Result<ConditionsWindow> {
    let not_before = attribute(e, b"NotBefore").context("Conditions missing NotBefore")?;
    let not_on_or_after =
        attribute(e, b"NotOnOrAfter").context("Conditions missing NotOnOrAfter")?;

    Ok(ConditionsWindow {
        not_before: parse_instant(&not_before)
            .with_context(|| format!("Invalid NotBefore: {not_before}"))?,
        not_on_or_after: parse_instant(&not_on_or_after)
            .with_context(|| format!("Invalid NotOnOrAfter: {not_on_or_after}"))?,
    })
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// SAML instants are UTC; accept an explicit offset or a bare timestamp
fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(naive.and_utc())
}
