//! Synthesized summary documents.
//!
//! A summary is either four narrative paragraphs (company profile) or an
//! ordered list of titled sections of content blocks (target market).
//! Stored forms differ: the company summary persists as the paragraphs
//! joined by blank lines, the market summary as canonical JSON. Stored
//! JSON is never trusted as already-typed; it re-enters through
//! [`SectionedSummary::from_stored_json`], which validates before decoding.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shape::{validate, Shape, ShapeViolation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    H1,
    H2,
    H3,
    Paragraph,
    List,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::Paragraph => "paragraph",
            Self::List => "list",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionedSummary {
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSummary {
    pub overview: String,
    pub target_market: String,
    pub market_position: String,
    pub brand_communication: String,
}

/// A decoded summary of either kind.
#[derive(Clone, Debug, PartialEq)]
pub enum SummaryDocument {
    Paragraphs(NarrativeSummary),
    Sections(SectionedSummary),
}

impl SummaryDocument {
    /// The canonical persisted form: blank-line-joined text for the
    /// paragraph kind, canonical JSON for the sectioned kind.
    pub fn stored_form(&self) -> String {
        match self {
            Self::Paragraphs(narrative) => narrative.composed_text(),
            Self::Sections(document) => document.to_stored_json(),
        }
    }
}

impl NarrativeSummary {
    /// Shape accepted from the generator: the four narrative fields must be
    /// present as strings, anything extra passes.
    pub fn shape() -> Shape {
        Shape::object(vec![
            ("overview", Shape::Text),
            ("targetMarket", Shape::Text),
            ("marketPosition", Shape::Text),
            ("brandCommunication", Shape::Text),
        ])
    }

    /// JSON schema sent to the provider as the response constraint.
    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "overview": {
                    "type": "string",
                    "description": "Company overview paragraph introducing the company, its core business, industry position, and key differentiators"
                },
                "targetMarket": {
                    "type": "string",
                    "description": "Detailed paragraph about target audience, their needs, and comprehensive list of products/services with value propositions"
                },
                "marketPosition": {
                    "type": "string",
                    "description": "Analysis of competitive landscape, key advantages, and market differentiation strategy"
                },
                "brandCommunication": {
                    "type": "string",
                    "description": "Description of brand voice, company values, culture, and approach to customer relationships"
                }
            },
            "required": ["overview", "targetMarket", "marketPosition", "brandCommunication"]
        })
    }

    pub fn from_response(value: &Value) -> Result<Self, ShapeViolation> {
        validate(value, &Self::shape())?;
        serde_json::from_value(value.clone()).map_err(|error| ShapeViolation {
            path: "$".to_string(),
            constraint: format!("narrative summary did not decode: {error}"),
        })
    }

    /// The persisted form: the four paragraphs joined by blank lines.
    pub fn composed_text(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\n{}",
            self.overview, self.target_market, self.market_position, self.brand_communication
        )
    }
}

impl SectionedSummary {
    pub fn shape() -> Shape {
        Shape::object(vec![(
            "sections",
            Shape::Array(Box::new(Shape::object(vec![
                ("title", Shape::Text),
                ("content", Shape::Blocks),
            ]))),
        )])
    }

    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "sections": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "content": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "type": { "type": "string", "enum": ["h1", "h2", "h3", "paragraph", "list"] },
                                        "text": { "type": "string" },
                                        "items": {
                                            "type": "array",
                                            "items": { "type": "string" }
                                        }
                                    },
                                    "required": ["type", "text"]
                                }
                            }
                        },
                        "required": ["title", "content"]
                    }
                }
            },
            "required": ["sections"]
        })
    }

    pub fn from_response(value: &Value) -> Result<Self, ShapeViolation> {
        validate(value, &Self::shape())?;
        serde_json::from_value(value.clone()).map_err(|error| ShapeViolation {
            path: "$".to_string(),
            constraint: format!("sectioned summary did not decode: {error}"),
        })
    }

    /// Decode a summary previously stored as JSON text, validating first.
    pub fn from_stored_json(raw: &str) -> Result<Self, ShapeViolation> {
        let value: Value = serde_json::from_str(raw).map_err(|error| ShapeViolation {
            path: "$".to_string(),
            constraint: format!("stored summary is not valid JSON: {error}"),
        })?;
        Self::from_response(&value)
    }

    /// The persisted form: canonical JSON.
    pub fn to_stored_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"sections\":[]}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BlockKind, NarrativeSummary, SectionedSummary};

    #[test]
    fn narrative_composition_joins_with_blank_lines() {
        let summary = NarrativeSummary {
            overview: "A".to_string(),
            target_market: "B".to_string(),
            market_position: "C".to_string(),
            brand_communication: "D".to_string(),
        };

        assert_eq!(summary.composed_text(), "A\n\nB\n\nC\n\nD");
    }

    #[test]
    fn narrative_decodes_from_generator_response() {
        let value = json!({
            "overview": "Acme makes anvils.",
            "targetMarket": "Coyotes with disposable income.",
            "marketPosition": "Category leader.",
            "brandCommunication": "Playful but reliable."
        });

        let summary = NarrativeSummary::from_response(&value).expect("valid response");
        assert_eq!(summary.overview, "Acme makes anvils.");
        assert_eq!(summary.brand_communication, "Playful but reliable.");
    }

    #[test]
    fn narrative_rejects_missing_paragraph() {
        let value = json!({
            "overview": "Acme makes anvils.",
            "targetMarket": "Coyotes.",
            "marketPosition": "Leader."
        });

        let violation = NarrativeSummary::from_response(&value).expect_err("field missing");
        assert!(violation.constraint.contains("brandCommunication"));
    }

    #[test]
    fn sections_round_trip_through_stored_json() {
        let value = json!({
            "sections": [{
                "title": "Market Opportunity",
                "content": [
                    { "type": "h1", "text": "Opportunity" },
                    { "type": "list", "text": "Signals", "items": ["20% annual growth"] }
                ]
            }]
        });

        let summary = SectionedSummary::from_response(&value).expect("valid sections");
        let stored = summary.to_stored_json();
        let decoded = SectionedSummary::from_stored_json(&stored).expect("stored form decodes");

        assert_eq!(decoded, summary);
        assert_eq!(decoded.sections[0].content[0].kind, BlockKind::H1);
        assert_eq!(decoded.sections[0].content[1].items, vec!["20% annual growth"]);
    }

    #[test]
    fn stored_junk_is_rejected_at_the_read_boundary() {
        assert!(SectionedSummary::from_stored_json("not json").is_err());
        assert!(SectionedSummary::from_stored_json("{\"sections\": \"oops\"}").is_err());
    }

    #[test]
    fn stored_forms_differ_by_kind() {
        let paragraphs = super::SummaryDocument::Paragraphs(NarrativeSummary {
            overview: "A".to_string(),
            target_market: "B".to_string(),
            market_position: "C".to_string(),
            brand_communication: "D".to_string(),
        });
        assert_eq!(paragraphs.stored_form(), "A\n\nB\n\nC\n\nD");

        let sections = super::SummaryDocument::Sections(SectionedSummary { sections: Vec::new() });
        assert_eq!(sections.stored_form(), "{\"sections\":[]}");
    }

    #[test]
    fn block_kind_names_match_wire_values() {
        for (kind, expected) in [
            (BlockKind::H1, "h1"),
            (BlockKind::H2, "h2"),
            (BlockKind::H3, "h3"),
            (BlockKind::Paragraph, "paragraph"),
            (BlockKind::List, "list"),
        ] {
            assert_eq!(kind.as_str(), expected);
            let encoded = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(encoded, format!("\"{expected}\""));
        }
    }
}
