//! Static tag overlay and correlation id lift.

use tracing::debug;

use crate::types::{EnrichedRecord, FieldMap, ParsedRecord};

/// Merges parser-extracted fields with infrastructure-owned static tags.
///
/// Static tags (source identity, deployment labels) are authoritative: a
/// parser field with the same name is overwritten, so log content can never
/// spoof a field the infrastructure owns. The correlation field is lifted
/// into [`EnrichedRecord::correlation_id`] when present — and never
/// invented when absent.
#[derive(Debug, Clone)]
pub struct Enricher {
    tags: FieldMap,
    correlation_field: String,
}

impl Enricher {
    /// Creates an enricher with the given static tags and correlation
    /// field name.
    #[must_use]
    pub fn new(tags: FieldMap, correlation_field: impl Into<String>) -> Self {
        Self {
            tags,
            correlation_field: correlation_field.into(),
        }
    }

    /// Returns the configured static tags.
    #[must_use]
    pub const fn tags(&self) -> &FieldMap {
        &self.tags
    }

    /// Returns the configured correlation field name.
    #[must_use]
    pub fn correlation_field(&self) -> &str {
        &self.correlation_field
    }

    /// Converts a parsed record into the final dispatch unit.
    #[must_use]
    pub fn enrich(&self, parsed: ParsedRecord) -> EnrichedRecord {
        let ParsedRecord {
            record,
            parser,
            mut fields,
        } = parsed;

        for (key, value) in &self.tags {
            if let Some(previous) = fields.insert(key.clone(), value.clone()) {
                debug!(
                    stream = %record.stream,
                    field = %key,
                    parser_value = %previous,
                    "static tag overrode parser field"
                );
            }
        }

        let correlation_id = fields
            .get(&self.correlation_field)
            .map(ToString::to_string);

        EnrichedRecord {
            timestamp: record.received_at,
            stream: record.stream,
            parser,
            fields,
            correlation_id,
            raw_text: record.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, LogicalRecord, StreamId};

    fn parsed_with(fields: FieldMap) -> ParsedRecord {
        ParsedRecord {
            record: LogicalRecord::from_text(StreamId::from("s1"), 1, "raw line"),
            parser: Some("json".to_string()),
            fields,
        }
    }

    fn tags(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), FieldValue::from(*v)))
            .collect()
    }

    #[test]
    fn static_tags_are_applied() {
        let enricher = Enricher::new(tags(&[("host", "node-1"), ("env", "prod")]), "correlation_id");
        let enriched = enricher.enrich(parsed_with(FieldMap::new()));

        assert_eq!(enriched.fields.get("host"), Some(&FieldValue::from("node-1")));
        assert_eq!(enriched.fields.get("env"), Some(&FieldValue::from("prod")));
    }

    #[test]
    fn static_tag_wins_on_collision() {
        let enricher = Enricher::new(tags(&[("host", "node-1")]), "correlation_id");
        let mut fields = FieldMap::new();
        fields.insert("host".to_string(), FieldValue::from("spoofed"));
        fields.insert("level".to_string(), FieldValue::from("error"));

        let enriched = enricher.enrich(parsed_with(fields));

        assert_eq!(enriched.fields.get("host"), Some(&FieldValue::from("node-1")));
        assert_eq!(enriched.fields.get("level"), Some(&FieldValue::from("error")));
    }

    #[test]
    fn correlation_id_is_lifted_when_present() {
        let enricher = Enricher::new(FieldMap::new(), "correlation_id");
        let mut fields = FieldMap::new();
        fields.insert("correlation_id".to_string(), FieldValue::from("req-9"));

        let enriched = enricher.enrich(parsed_with(fields));

        assert_eq!(enriched.correlation_id.as_deref(), Some("req-9"));
        // The field also stays in the map for downstream serialization.
        assert!(enriched.fields.contains_key("correlation_id"));
    }

    #[test]
    fn correlation_id_is_never_invented() {
        let enricher = Enricher::new(FieldMap::new(), "correlation_id");
        let enriched = enricher.enrich(parsed_with(FieldMap::new()));
        assert!(enriched.correlation_id.is_none());
    }

    #[test]
    fn correlation_field_name_is_configurable() {
        let enricher = Enricher::new(FieldMap::new(), "request_id");
        let mut fields = FieldMap::new();
        fields.insert("request_id".to_string(), FieldValue::from("abc"));
        fields.insert("correlation_id".to_string(), FieldValue::from("ignored"));

        let enriched = enricher.enrich(parsed_with(fields));
        assert_eq!(enriched.correlation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn timestamp_and_raw_text_come_from_the_record() {
        let record = LogicalRecord::from_text(StreamId::from("s1"), 1, "line one\nline two");
        let expected_ts = record.received_at;
        let parsed = ParsedRecord::unparsed(record);

        let enricher = Enricher::new(FieldMap::new(), "correlation_id");
        let enriched = enricher.enrich(parsed);

        assert_eq!(enriched.timestamp, expected_ts);
        assert_eq!(enriched.raw_text, "line one\nline two");
        assert!(enriched.parser.is_none());
        assert!(enriched.fields.is_empty());
    }
}
