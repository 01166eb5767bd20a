//! Lenient decoder for stored datalogger payloads.
//!
//! The logger firmware writes JSON-like text with single quotes and, on some
//! firmware versions, bare keys. Two repair rules turn the known shapes into
//! strict JSON before decoding:
//!
//! 1. every single quote becomes a double quote;
//! 2. a bare identifier in key position (right after `{` or `,`, followed by
//!    a colon) is wrapped in double quotes.
//!
//! Payloads that still fail to decode are skipped with a warning carrying the
//! original text; a bad row never aborts a report.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One sensor reading decoded from a payload `data` array.
///
/// Measured fields use a uniform missing sentinel: a value that is absent,
/// non-numeric, or a string that fails to parse is `None`, never a silent
/// zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSample {
    /// Epoch seconds as reported by the device
    pub datetime: i64,
    pub ph: Option<f64>,
    pub cod: Option<f64>,
    pub tss: Option<f64>,
    pub nh3n: Option<f64>,
    pub debit: Option<f64>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<SampleRecord>,
}

#[derive(Deserialize)]
struct SampleRecord {
    #[serde(default)]
    datetime: Option<Value>,
    #[serde(default, rename = "pH")]
    ph: Option<Value>,
    #[serde(default)]
    cod: Option<Value>,
    #[serde(default)]
    tss: Option<Value>,
    #[serde(default)]
    nh3n: Option<Value>,
    #[serde(default)]
    debit: Option<Value>,
}

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap());

/// Applies the two repair rules. Already-strict JSON passes through intact.
pub fn repair(raw: &str) -> String {
    let double_quoted = raw.replace('\'', "\"");
    BARE_KEY
        .replace_all(&double_quoted, "${1}\"${2}\":")
        .into_owned()
}

/// Decodes one stored message into its samples.
///
/// Returns an empty vec for blank messages, payloads without a `data` array,
/// and payloads that fail to decode even after repair. Samples lacking a
/// usable `datetime` are dropped; they cannot be bucketed.
pub fn decode_message(raw: &str) -> Vec<ParsedSample> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let envelope: Envelope = match serde_json::from_str(&repair(raw)) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("undecodable message ({e}), raw: {raw}");
            return Vec::new();
        }
    };

    envelope
        .data
        .into_iter()
        .filter_map(|record| {
            let datetime = record.datetime.as_ref().and_then(coerce_epoch)?;
            Some(ParsedSample {
                datetime,
                ph: record.ph.as_ref().and_then(coerce_f64),
                cod: record.cod.as_ref().and_then(coerce_f64),
                tss: record.tss.as_ref().and_then(coerce_f64),
                nh3n: record.nh3n.as_ref().and_then(coerce_f64),
                debit: record.debit.as_ref().and_then(coerce_f64),
            })
        })
        .collect()
}

/// JSON number or numeric string; anything else is missing.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// JSON integer or all-digits string.
fn coerce_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_single_quotes() {
        let raw = "{'data':[{'datetime':100,'debit':'5'}]}";
        assert_eq!(repair(raw), r#"{"data":[{"datetime":100,"debit":"5"}]}"#);
    }

    #[test]
    fn repairs_bare_keys() {
        let raw = "{data:[{datetime:100, pH:6.8}]}";
        assert_eq!(repair(raw), r#"{"data":[{"datetime":100, "pH":6.8}]}"#);
    }

    #[test]
    fn repair_leaves_strict_json_alone() {
        let raw = r#"{"data":[{"datetime":100,"debit":5}]}"#;
        assert_eq!(repair(raw), raw);
    }

    #[test]
    fn decodes_single_quoted_payload() {
        let samples = decode_message("{'data':[{'datetime':100,'debit':'5'}]}");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].datetime, 100);
        assert_eq!(samples[0].debit, Some(5.0));
        assert_eq!(samples[0].ph, None);
    }

    #[test]
    fn decodes_bare_key_payload() {
        let samples = decode_message("{data:[{datetime:100,pH:'6.8',cod:12}]}");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].ph, Some(6.8));
        assert_eq!(samples[0].cod, Some(12.0));
    }

    #[test]
    fn malformed_payload_is_empty() {
        assert!(decode_message("{not json").is_empty());
    }

    #[test]
    fn blank_message_is_empty() {
        assert!(decode_message("").is_empty());
        assert!(decode_message("   ").is_empty());
    }

    #[test]
    fn missing_data_array_is_empty() {
        assert!(decode_message("{'status':'ok'}").is_empty());
    }

    #[test]
    fn wrong_data_type_is_empty() {
        assert!(decode_message("{'data':5}").is_empty());
    }

    #[test]
    fn non_numeric_measurement_is_missing() {
        let samples = decode_message("{'data':[{'datetime':100,'pH':'err','tss':null}]}");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].ph, None);
        assert_eq!(samples[0].tss, None);
    }

    #[test]
    fn numeric_string_with_trailing_junk_is_missing() {
        let samples = decode_message("{'data':[{'datetime':100,'debit':'7.2 lps'}]}");
        assert_eq!(samples[0].debit, None);
    }

    #[test]
    fn string_datetime_is_accepted() {
        let samples = decode_message("{'data':[{'datetime':'100','debit':1}]}");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].datetime, 100);
    }

    #[test]
    fn sample_without_datetime_is_dropped() {
        let samples =
            decode_message("{'data':[{'debit':1},{'datetime':'later','debit':2},{'datetime':100,'debit':3}]}");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].debit, Some(3.0));
    }
}
