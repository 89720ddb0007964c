//! The synthesized ideal-customer persona.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shape::{validate, Shape, ShapeViolation};

/// A fictional individual representing the ideal customer, generated from
/// the target-market summary. One current persona per tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub name: String,
    pub age: i64,
    pub position: String,
    pub company_size: String,
    pub industry: String,
    pub goals: Vec<String>,
    pub challenges: Vec<String>,
    pub interests: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub decision_factors: Vec<String>,
    pub budget_range: String,
    pub profile_description: String,
}

impl PersonaProfile {
    pub fn shape() -> Shape {
        Shape::object(vec![
            ("name", Shape::Text),
            ("age", Shape::Integer),
            ("position", Shape::Text),
            ("company_size", Shape::Text),
            ("industry", Shape::Text),
            ("goals", Shape::TextArray),
            ("challenges", Shape::TextArray),
            ("interests", Shape::TextArray),
            ("preferred_channels", Shape::TextArray),
            ("decision_factors", Shape::TextArray),
            ("budget_range", Shape::Text),
            ("profile_description", Shape::Text),
        ])
    }

    /// The generator wraps the persona in a `profile` envelope.
    pub fn response_shape() -> Shape {
        Shape::object(vec![("profile", Self::shape())])
    }

    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "profile": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "age": { "type": "number" },
                        "position": { "type": "string" },
                        "company_size": { "type": "string" },
                        "industry": { "type": "string" },
                        "goals": { "type": "array", "items": { "type": "string" } },
                        "challenges": { "type": "array", "items": { "type": "string" } },
                        "interests": { "type": "array", "items": { "type": "string" } },
                        "preferred_channels": { "type": "array", "items": { "type": "string" } },
                        "decision_factors": { "type": "array", "items": { "type": "string" } },
                        "budget_range": { "type": "string" },
                        "profile_description": { "type": "string" }
                    },
                    "required": [
                        "name", "age", "position", "company_size", "industry",
                        "goals", "challenges", "interests", "preferred_channels",
                        "decision_factors", "budget_range", "profile_description"
                    ]
                }
            },
            "required": ["profile"]
        })
    }

    pub fn from_response(value: &Value) -> Result<Self, ShapeViolation> {
        validate(value, &Self::response_shape())?;
        let profile = value.get("profile").cloned().unwrap_or(Value::Null);
        serde_json::from_value(profile).map_err(|error| ShapeViolation {
            path: "$.profile".to_string(),
            constraint: format!("persona did not decode: {error}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PersonaProfile;

    fn response() -> serde_json::Value {
        json!({
            "profile": {
                "name": "Maya Chen",
                "age": 34,
                "position": "Operations Director",
                "company_size": "50-200 employees",
                "industry": "Logistics",
                "goals": ["automate reporting", "cut fulfillment costs"],
                "challenges": ["legacy tooling", "hiring"],
                "interests": ["trail running", "podcasts"],
                "preferred_channels": ["LinkedIn", "email"],
                "decision_factors": ["ROI", "peer reviews"],
                "budget_range": "$10k-$50k annually",
                "profile_description": "Pragmatic, data-driven, short on time."
            }
        })
    }

    #[test]
    fn decodes_a_complete_profile() {
        let persona = PersonaProfile::from_response(&response()).expect("valid persona");
        assert_eq!(persona.name, "Maya Chen");
        assert_eq!(persona.age, 34);
        assert_eq!(persona.goals.len(), 2);
    }

    #[test]
    fn rejects_missing_profile_envelope() {
        let violation =
            PersonaProfile::from_response(&json!({ "name": "Maya" })).expect_err("no envelope");
        assert!(violation.constraint.contains("missing required field `profile`"));
    }

    #[test]
    fn rejects_non_numeric_age() {
        let mut value = response();
        value["profile"]["age"] = json!("thirty-four");

        let violation = PersonaProfile::from_response(&value).expect_err("age must be numeric");
        assert_eq!(violation.path, "$.profile.age");
    }

    #[test]
    fn rejects_scalar_array_field() {
        let mut value = response();
        value["profile"]["goals"] = json!("automate reporting");

        let violation = PersonaProfile::from_response(&value).expect_err("goals must be an array");
        assert_eq!(violation.path, "$.profile.goals");
    }
}
