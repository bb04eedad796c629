#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::scenario::Scenario;

const CODE_DOMAIN: &str = "park";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded scenario payload.
pub(crate) const CODE_HEADER: &str = "park:v1";
/// Delimiter used to separate the prefix, the summary and the payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a scenario into a single line that can be pasted into a terminal.
///
/// The line reads `park:v1:<rides>x<guest groups>:<payload>`; the summary lets
/// a reader see what the code holds without decoding it.
pub(crate) fn encode(scenario: &Scenario) -> Result<String, ShareCodeError> {
    let json = serde_json::to_vec(scenario).map_err(ShareCodeError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{CODE_HEADER}:{}x{}:{encoded}",
        scenario.rides.len(),
        scenario.guests.len()
    ))
}

/// Decodes a scenario from its share code.
pub(crate) fn decode(value: &str) -> Result<Scenario, ShareCodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareCodeError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(ShareCodeError::MissingPrefix)?;
    let version = parts.next().ok_or(ShareCodeError::MissingVersion)?;
    let summary = parts.next().ok_or(ShareCodeError::MissingSummary)?;
    let payload = parts.next().ok_or(ShareCodeError::MissingPayload)?;

    if domain != CODE_DOMAIN {
        return Err(ShareCodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(ShareCodeError::UnsupportedVersion(version.to_owned()));
    }

    let (rides, guests) = parse_summary(summary)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ShareCodeError::InvalidEncoding)?;
    let scenario: Scenario =
        serde_json::from_slice(&bytes).map_err(ShareCodeError::InvalidPayload)?;

    if scenario.rides.len() != rides || scenario.guests.len() != guests {
        return Err(ShareCodeError::InvalidSummary(summary.to_owned()));
    }
    Ok(scenario)
}

/// Errors that can occur while decoding share codes.
#[derive(Debug)]
pub(crate) enum ShareCodeError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The version segment was missing.
    MissingVersion,
    /// The ride and guest counts were missing.
    MissingSummary,
    /// The payload segment was missing.
    MissingPayload,
    /// The code used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The counts could not be parsed or disagree with the payload.
    InvalidSummary(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for ShareCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share code was empty"),
            Self::MissingPrefix => write!(f, "share code is missing the prefix"),
            Self::MissingVersion => write!(f, "share code is missing the version"),
            Self::MissingSummary => write!(f, "share code is missing the ride and guest counts"),
            Self::MissingPayload => write!(f, "share code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share code prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share code version '{version}' is not supported")
            }
            Self::InvalidSummary(summary) => {
                write!(f, "share code counts '{summary}' do not match its payload")
            }
            Self::InvalidEncoding(error) => write!(f, "could not decode share code: {error}"),
            Self::InvalidPayload(error) => write!(f, "could not read scenario payload: {error}"),
        }
    }
}

impl Error for ShareCodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_summary(summary: &str) -> Result<(usize, usize), ShareCodeError> {
    let invalid = || ShareCodeError::InvalidSummary(summary.to_owned());
    let (rides, guests) = summary.split_once(['x', 'X']).ok_or_else(invalid)?;
    let rides = rides.trim().parse::<usize>().map_err(|_| invalid())?;
    let guests = guests.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((rides, guests))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = include_str!("../scenarios/demo.toml");

    #[test]
    fn demo_scenario_survives_sharing() {
        let scenario = Scenario::parse(DEMO).expect("demo parses");
        let code = encode(&scenario).expect("encodes");
        let expected = format!(
            "{CODE_HEADER}:{}x{}:",
            scenario.rides.len(),
            scenario.guests.len()
        );
        assert!(code.starts_with(&expected));

        let decoded = decode(&format!("  {code}\n")).expect("decodes");
        assert_eq!(decoded, scenario);
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let error = decode("maze:v1:0x0:e30").expect_err("foreign prefix");
        assert!(matches!(error, ShareCodeError::InvalidPrefix(prefix) if prefix == "maze"));
    }

    #[test]
    fn future_versions_are_rejected() {
        let error = decode("park:v9:0x0:e30").expect_err("unknown version");
        assert!(matches!(error, ShareCodeError::UnsupportedVersion(version) if version == "v9"));
    }

    #[test]
    fn counts_must_match_the_payload() {
        // "{}" decodes to an empty scenario.
        assert!(decode("park:v1:0x0:e30").is_ok());
        let error = decode("park:v1:2x1:e30").expect_err("counts disagree");
        assert!(matches!(error, ShareCodeError::InvalidSummary(_)));
        assert!(matches!(decode(""), Err(ShareCodeError::EmptyPayload)));
    }
}
