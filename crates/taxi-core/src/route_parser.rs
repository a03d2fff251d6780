//! Route string normalization.
//!
//! Turns loosely formatted clearances such as `RW27-C3-C-F5-F` into the ordered
//! taxiway codes `[C, F]`. Codes are not checked against the graph here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RouteError;
use crate::models::TaxiwayCode;

/// `RW` followed by one or two digits and an optional parallel-runway side.
static RUNWAY_DESIGNATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^RW\d{1,2}[LCR]?$").expect("valid runway regex"));

/// Leading letters, optional numeric connector suffix.
static TAXIWAY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)\d*$").expect("valid taxiway regex"));

const SEPARATORS: [char; 2] = ['-', ','];

/// Whether an (uppercased) token names a runway entry or exit.
pub fn is_runway_designator(token: &str) -> bool {
    RUNWAY_DESIGNATOR.is_match(token)
}

/// Canonical taxiway code of a token: its leading letters, numeric suffix dropped.
///
/// Returns `None` for runway designators and tokens of any other shape.
pub fn canonical_code(token: &str) -> Option<TaxiwayCode> {
    let upper = token.trim().to_ascii_uppercase();
    if is_runway_designator(&upper) {
        return None;
    }
    TAXIWAY_TOKEN
        .captures(&upper)
        .and_then(|caps| caps.get(1))
        .map(|m| TaxiwayCode::new(m.as_str()))
}

/// Parse a route string into its ordered, de-duplicated taxiway codes.
pub fn parse_route(raw: &str) -> Result<Vec<TaxiwayCode>, RouteError> {
    if raw.trim().is_empty() {
        return Err(RouteError::InvalidRoute("route is empty".to_string()));
    }

    if let Some((pos, ch)) = raw
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || SEPARATORS.contains(c) || c.is_ascii_whitespace()))
    {
        return Err(RouteError::InvalidRoute(format!(
            "unexpected character '{ch}' at position {pos}"
        )));
    }

    let mut codes: Vec<TaxiwayCode> = Vec::new();
    for token in raw.split(SEPARATORS).map(str::trim) {
        if token.is_empty() {
            continue;
        }
        if token.contains(|c: char| c.is_ascii_whitespace()) {
            return Err(RouteError::InvalidRoute(format!(
                "token '{token}' contains whitespace"
            )));
        }

        let upper = token.to_ascii_uppercase();
        if is_runway_designator(&upper) {
            tracing::debug!("Skipping runway designator {}", upper);
            continue;
        }

        let code = canonical_code(&upper).ok_or_else(|| {
            RouteError::InvalidRoute(format!(
                "token '{token}' is neither a taxiway nor a runway designator"
            ))
        })?;

        if codes.last() != Some(&code) {
            codes.push(code);
        }
    }

    if codes.is_empty() {
        return Err(RouteError::InvalidRoute(
            "route contains no taxiway codes".to_string(),
        ));
    }

    Ok(codes)
}
