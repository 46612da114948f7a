use crate::pipeline::{Envelope, PipelineError, RawMessage, Transform};
use telemetry_client::Reading;
use time::OffsetDateTime;

/// Turn a raw transport message into a `Reading` stamped with `received_at`.
///
/// Accepted payloads:
/// - a JSON object with a `state` field holding a number or a numeric string;
/// - a plain decimal numeral (a bare JSON number parses the same way).
///
/// Non-finite values are rejected.
pub fn normalize(source: &str, payload: &str, received_at: OffsetDateTime) -> Result<Reading, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedSample {
        topic: source.to_string(),
        reason,
    };

    if source.trim().is_empty() {
        return Err(malformed("empty source".to_string()));
    }

    let value = match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(obj)) if obj.contains_key("state") => state_value(&obj["state"]),
        _ => parse_numeral(payload),
    }
    .map_err(malformed)?;

    Ok(Reading::new(source, value, received_at))
}

fn state_value(state: &serde_json::Value) -> Result<f64, String> {
    match state {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("state '{n}' is not representable as f64")),
        serde_json::Value::String(s) => parse_numeral(s),
        other => Err(format!("state field is not numeric: {other}")),
    }
}

fn parse_numeral(s: &str) -> Result<f64, String> {
    let trimmed = s.trim();
    let v: f64 = trimmed
        .parse()
        .map_err(|e| format!("payload '{trimmed}' is not a decimal numeral: {e}"))?;

    if !v.is_finite() {
        return Err(format!("payload '{trimmed}' is not a finite value"));
    }

    Ok(v)
}

#[derive(Clone, Copy, Default)]
pub struct Normalizer;

#[async_trait::async_trait]
impl Transform<RawMessage, Reading> for Normalizer {
    async fn apply(&self, input: Envelope<RawMessage>) -> Result<Envelope<Reading>, PipelineError> {
        let received_at = OffsetDateTime::from(input.received_at);

        match normalize(&input.payload.source, &input.payload.payload, received_at) {
            Ok(reading) => {
                metrics::counter!("ingest_samples_total").increment(1);
                Ok(Envelope {
                    payload: reading,
                    received_at: input.received_at,
                })
            }
            Err(e) => {
                metrics::counter!("ingest_malformed_samples_total").increment(1);
                Err(e)
            }
        }
    }
}
