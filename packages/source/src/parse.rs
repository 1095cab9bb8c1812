//! Payload validation.
//!
//! Bodies are checked in two steps: the `success` flag first, so an
//! unsuccessful analysis is reported as [`SourceError::Rejected`] even when
//! the rest of the envelope is missing, then the full category schema.

use location_insight_metrics_models::MetricCategory;
use location_insight_source_models::SourcePayload;
use serde::Deserialize;

use crate::SourceError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
}

/// Parses a backend response body into a typed payload.
///
/// # Errors
///
/// Returns [`SourceError::Rejected`] if the body reports `success: false`
/// (or omits the flag), and [`SourceError::MalformedPayload`] if the body
/// is not JSON or does not match the category schema.
pub fn parse_payload(category: MetricCategory, body: &str) -> Result<SourcePayload, SourceError> {
    let malformed = |e: serde_json::Error| SourceError::MalformedPayload {
        category,
        message: e.to_string(),
    };

    let envelope: Envelope = serde_json::from_str(body).map_err(malformed)?;
    if !envelope.success {
        return Err(SourceError::Rejected { category });
    }

    let payload = match category {
        MetricCategory::Education => serde_json::from_str(body).map(SourcePayload::Education),
        MetricCategory::Living => serde_json::from_str(body).map(SourcePayload::Living),
        MetricCategory::Access => serde_json::from_str(body).map(SourcePayload::Access),
    }
    .map_err(malformed)?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_living_payload() {
        let body = json!({
            "success": true,
            "living_quality": {
                "overall_score": 68.0,
                "components": { "dining_entertainment": { "score": 72 } }
            }
        })
        .to_string();

        let payload = parse_payload(MetricCategory::Living, &body).unwrap();
        let SourcePayload::Living(living) = payload else {
            panic!("expected living payload");
        };
        assert_eq!(
            living.living_quality.components.dining_entertainment.unwrap().score,
            Some(72.0)
        );
    }

    #[test]
    fn unsuccessful_payload_is_rejected() {
        let body = json!({ "success": false, "error": "no data for region" }).to_string();
        assert!(matches!(
            parse_payload(MetricCategory::Education, &body),
            Err(SourceError::Rejected {
                category: MetricCategory::Education
            })
        ));
    }

    #[test]
    fn missing_success_flag_is_rejected() {
        let body = json!({ "data": { "components": {} } }).to_string();
        assert!(matches!(
            parse_payload(MetricCategory::Access, &body),
            Err(SourceError::Rejected { .. })
        ));
    }

    #[test]
    fn wrong_envelope_is_malformed() {
        // A living body sent to the access parser has no `data` section.
        let body = json!({
            "success": true,
            "living_quality": { "components": {} }
        })
        .to_string();
        assert!(matches!(
            parse_payload(MetricCategory::Access, &body),
            Err(SourceError::MalformedPayload {
                category: MetricCategory::Access,
                ..
            })
        ));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let body = json!({
            "success": true,
            "living_quality": { "components": { "walkability": { "score": "high" } } }
        })
        .to_string();
        assert!(matches!(
            parse_payload(MetricCategory::Living, &body),
            Err(SourceError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_payload(MetricCategory::Living, "Internal Server Error"),
            Err(SourceError::MalformedPayload { .. })
        ));
    }
}
