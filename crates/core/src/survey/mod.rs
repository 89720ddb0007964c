//! Survey definitions and answer sheets.
//!
//! A survey is a fixed, ordered list of questions for one profile kind.
//! Definitions are static and never persisted; answers live in per-kind
//! sheets whose fields are reached through enumerated identifiers, not
//! runtime string keys.

mod session;

pub use session::{NextOutcome, SessionState, SurveySession};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurveyKind {
    Company,
    TargetMarket,
}

impl SurveyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::TargetMarket => "target-market",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "company" => Some(Self::Company),
            "target-market" => Some(Self::TargetMarket),
            _ => None,
        }
    }
}

impl std::fmt::Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    List,
}

#[derive(Clone, Copy, Debug)]
pub struct SurveyStep {
    pub field: &'static str,
    pub value_kind: ValueKind,
    pub question: &'static str,
    pub placeholder: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct SurveyDefinition {
    pub kind: SurveyKind,
    pub steps: &'static [SurveyStep],
}

impl SurveyDefinition {
    pub fn for_kind(kind: SurveyKind) -> &'static SurveyDefinition {
        match kind {
            SurveyKind::Company => &COMPANY_SURVEY,
            SurveyKind::TargetMarket => &TARGET_MARKET_SURVEY,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&'static SurveyStep> {
        self.steps.get(index)
    }
}

pub static COMPANY_SURVEY: SurveyDefinition = SurveyDefinition {
    kind: SurveyKind::Company,
    steps: &[
        SurveyStep {
            field: "business_type",
            value_kind: ValueKind::Text,
            question: "If someone asked you, \"What kind of business do you have?\" what would you say in just a sentence or two?",
            placeholder: "e.g., \"We are a mobile pet grooming service that brings professional care right to your doorstep.\"",
        },
        SurveyStep {
            field: "industry",
            value_kind: ValueKind::Text,
            question: "What field or area does your business belong to?",
            placeholder: "e.g., healthcare, home services, fashion, technology, etc.",
        },
        SurveyStep {
            field: "target_audience",
            value_kind: ValueKind::Text,
            question: "Imagine your absolute perfect customer\u{2014}the one you dream of meeting. What makes them so perfect? What are they looking for? How old are they? Tell me as much as you can about them!",
            placeholder: "Describe your ideal customer in detail...",
        },
        SurveyStep {
            field: "company_description",
            value_kind: ValueKind::Text,
            question: "If you met someone who had never heard of your business before, how would you explain it in a way that excites them?",
            placeholder: "Share what makes your business special...",
        },
        SurveyStep {
            field: "brand_voice",
            value_kind: ValueKind::Text,
            question: "If your business could talk, what kind of personality would it have? Would it be friendly and casual? Professional and serious? Playful and fun? Tell me how you would like people to feel when they hear from you!",
            placeholder: "Describe your brand's personality...",
        },
        SurveyStep {
            field: "key_products",
            value_kind: ValueKind::List,
            question: "What are the main things you sell or offer? If someone came to you for the first time, what would you want them to know about right away?",
            placeholder: "List your main products or services...",
        },
        SurveyStep {
            field: "competitors",
            value_kind: ValueKind::List,
            question: "Are there any businesses out there that offer something similar to what you do? They don't have to be exactly the same\u{2014}just anyone your customers might compare you to.",
            placeholder: "Name some similar businesses in your space...",
        },
    ],
};

pub static TARGET_MARKET_SURVEY: SurveyDefinition = SurveyDefinition {
    kind: SurveyKind::TargetMarket,
    steps: &[
        SurveyStep {
            field: "demographics",
            value_kind: ValueKind::Text,
            question: "Who are your ideal customers in terms of age, gender, income, education, occupation, and other demographic factors?",
            placeholder: "e.g., \"Our ideal customers are urban professionals aged 25-40, with college degrees and annual incomes over $75,000...\"",
        },
        SurveyStep {
            field: "psychographics",
            value_kind: ValueKind::Text,
            question: "What are your ideal customers' interests, values, lifestyle choices, and personality traits?",
            placeholder: "e.g., \"They are health-conscious individuals who value work-life balance, enjoy outdoor activities...\"",
        },
        SurveyStep {
            field: "pain_points",
            value_kind: ValueKind::Text,
            question: "What specific problems or challenges does your target market face that your business helps solve?",
            placeholder: "Describe the key problems or needs your customers have...",
        },
        SurveyStep {
            field: "buying_behavior",
            value_kind: ValueKind::Text,
            question: "How do your ideal customers typically make purchasing decisions? What factors influence their choices?",
            placeholder: "e.g., \"They research extensively online, value peer recommendations...\"",
        },
        SurveyStep {
            field: "market_size",
            value_kind: ValueKind::Text,
            question: "How large is your potential market? Can you estimate the number of potential customers in your target area?",
            placeholder: "Describe the size of your target market...",
        },
        SurveyStep {
            field: "growth_potential",
            value_kind: ValueKind::Text,
            question: "What trends or factors suggest growth potential in your target market?",
            placeholder: "e.g., \"The market is expected to grow by 20% annually due to increasing demand...\"",
        },
        SurveyStep {
            field: "geographic_focus",
            value_kind: ValueKind::Text,
            question: "What geographic areas do you target? Consider local, regional, or online presence.",
            placeholder: "Describe your geographic target areas...",
        },
    ],
};

/// One answered field: free text, or an ordered list for array fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Build a value from submitted text. List fields split on commas and
    /// trim each item. The split is deliberately lossy: an item that itself
    /// contains a comma becomes two items. Carried over as documented
    /// behavior, not fixed.
    pub fn from_submitted(kind: ValueKind, text: &str) -> Self {
        match kind {
            ValueKind::Text => Self::Text(text.trim().to_string()),
            ValueKind::List => Self::List(
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// Flatten to plain text for prompts: list items joined with ", ".
    pub fn as_plain_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

/// Ordered, enumerated access to one survey's answers. Implementations map
/// step indices through a fixed field table to typed accessors.
pub trait AnswerSheet: Clone {
    fn definition() -> &'static SurveyDefinition;

    fn value_at(&self, step: usize) -> Option<AnswerValue>;

    fn set_at(&mut self, step: usize, value: Option<AnswerValue>) -> Result<(), DomainError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompanyField {
    BusinessType,
    Industry,
    TargetAudience,
    CompanyDescription,
    BrandVoice,
    KeyProducts,
    Competitors,
}

impl CompanyField {
    /// Iteration order; matches [`COMPANY_SURVEY`].
    pub const ORDERED: [CompanyField; 7] = [
        Self::BusinessType,
        Self::Industry,
        Self::TargetAudience,
        Self::CompanyDescription,
        Self::BrandVoice,
        Self::KeyProducts,
        Self::Competitors,
    ];

    pub fn from_step(step: usize) -> Option<Self> {
        Self::ORDERED.get(step).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnswers {
    pub business_type: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub company_description: Option<String>,
    pub brand_voice: Option<String>,
    pub key_products: Option<Vec<String>>,
    pub competitors: Option<Vec<String>>,
}

impl CompanyAnswers {
    pub fn value(&self, field: CompanyField) -> Option<AnswerValue> {
        match field {
            CompanyField::BusinessType => self.business_type.clone().map(AnswerValue::Text),
            CompanyField::Industry => self.industry.clone().map(AnswerValue::Text),
            CompanyField::TargetAudience => self.target_audience.clone().map(AnswerValue::Text),
            CompanyField::CompanyDescription => {
                self.company_description.clone().map(AnswerValue::Text)
            }
            CompanyField::BrandVoice => self.brand_voice.clone().map(AnswerValue::Text),
            CompanyField::KeyProducts => self.key_products.clone().map(AnswerValue::List),
            CompanyField::Competitors => self.competitors.clone().map(AnswerValue::List),
        }
    }

    pub fn set(&mut self, field: CompanyField, value: Option<AnswerValue>) {
        let text = value.as_ref().map(AnswerValue::as_plain_text);
        let list = match &value {
            Some(AnswerValue::List(items)) => Some(items.clone()),
            Some(AnswerValue::Text(text)) => {
                match AnswerValue::from_submitted(ValueKind::List, text) {
                    AnswerValue::List(items) => Some(items),
                    AnswerValue::Text(_) => None,
                }
            }
            None => None,
        };

        match field {
            CompanyField::BusinessType => self.business_type = text,
            CompanyField::Industry => self.industry = text,
            CompanyField::TargetAudience => self.target_audience = text,
            CompanyField::CompanyDescription => self.company_description = text,
            CompanyField::BrandVoice => self.brand_voice = text,
            CompanyField::KeyProducts => self.key_products = list,
            CompanyField::Competitors => self.competitors = list,
        }
    }
}

impl AnswerSheet for CompanyAnswers {
    fn definition() -> &'static SurveyDefinition {
        &COMPANY_SURVEY
    }

    fn value_at(&self, step: usize) -> Option<AnswerValue> {
        CompanyField::from_step(step).and_then(|field| self.value(field))
    }

    fn set_at(&mut self, step: usize, value: Option<AnswerValue>) -> Result<(), DomainError> {
        let field = CompanyField::from_step(step)
            .ok_or(DomainError::StepOutOfRange { step, len: Self::definition().len() })?;
        self.set(field, value);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketField {
    Demographics,
    Psychographics,
    PainPoints,
    BuyingBehavior,
    MarketSize,
    GrowthPotential,
    GeographicFocus,
}

impl MarketField {
    /// Iteration order; matches [`TARGET_MARKET_SURVEY`].
    pub const ORDERED: [MarketField; 7] = [
        Self::Demographics,
        Self::Psychographics,
        Self::PainPoints,
        Self::BuyingBehavior,
        Self::MarketSize,
        Self::GrowthPotential,
        Self::GeographicFocus,
    ];

    pub fn from_step(step: usize) -> Option<Self> {
        Self::ORDERED.get(step).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnswers {
    pub demographics: Option<String>,
    pub psychographics: Option<String>,
    pub pain_points: Option<String>,
    pub buying_behavior: Option<String>,
    pub market_size: Option<String>,
    pub growth_potential: Option<String>,
    pub geographic_focus: Option<String>,
}

impl MarketAnswers {
    pub fn value(&self, field: MarketField) -> Option<AnswerValue> {
        let slot = match field {
            MarketField::Demographics => &self.demographics,
            MarketField::Psychographics => &self.psychographics,
            MarketField::PainPoints => &self.pain_points,
            MarketField::BuyingBehavior => &self.buying_behavior,
            MarketField::MarketSize => &self.market_size,
            MarketField::GrowthPotential => &self.growth_potential,
            MarketField::GeographicFocus => &self.geographic_focus,
        };
        slot.clone().map(AnswerValue::Text)
    }

    pub fn set(&mut self, field: MarketField, value: Option<AnswerValue>) {
        let text = value.map(|v| v.as_plain_text());
        let slot = match field {
            MarketField::Demographics => &mut self.demographics,
            MarketField::Psychographics => &mut self.psychographics,
            MarketField::PainPoints => &mut self.pain_points,
            MarketField::BuyingBehavior => &mut self.buying_behavior,
            MarketField::MarketSize => &mut self.market_size,
            MarketField::GrowthPotential => &mut self.growth_potential,
            MarketField::GeographicFocus => &mut self.geographic_focus,
        };
        *slot = text;
    }
}

impl AnswerSheet for MarketAnswers {
    fn definition() -> &'static SurveyDefinition {
        &TARGET_MARKET_SURVEY
    }

    fn value_at(&self, step: usize) -> Option<AnswerValue> {
        MarketField::from_step(step).and_then(|field| self.value(field))
    }

    fn set_at(&mut self, step: usize, value: Option<AnswerValue>) -> Result<(), DomainError> {
        let field = MarketField::from_step(step)
            .ok_or(DomainError::StepOutOfRange { step, len: Self::definition().len() })?;
        self.set(field, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AnswerSheet, AnswerValue, CompanyAnswers, CompanyField, MarketAnswers, SurveyDefinition,
        SurveyKind, ValueKind, COMPANY_SURVEY, TARGET_MARKET_SURVEY,
    };

    #[test]
    fn definitions_have_seven_ordered_steps() {
        assert_eq!(COMPANY_SURVEY.len(), 7);
        assert_eq!(TARGET_MARKET_SURVEY.len(), 7);
        assert_eq!(COMPANY_SURVEY.step(0).expect("first step").field, "business_type");
        assert_eq!(COMPANY_SURVEY.step(6).expect("last step").field, "competitors");
        assert_eq!(TARGET_MARKET_SURVEY.step(0).expect("first step").field, "demographics");
    }

    #[test]
    fn kind_parsing_round_trips() {
        for kind in [SurveyKind::Company, SurveyKind::TargetMarket] {
            assert_eq!(SurveyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SurveyKind::parse("campaigns"), None);
        assert_eq!(SurveyDefinition::for_kind(SurveyKind::Company).kind, SurveyKind::Company);
    }

    #[test]
    fn list_values_split_on_commas_and_trim() {
        let value = AnswerValue::from_submitted(ValueKind::List, " grooming, nail trims ,baths ");
        assert_eq!(
            value,
            AnswerValue::List(vec![
                "grooming".to_string(),
                "nail trims".to_string(),
                "baths".to_string()
            ])
        );
    }

    #[test]
    fn text_values_trim_whitespace() {
        let value = AnswerValue::from_submitted(ValueKind::Text, "  pet care  ");
        assert_eq!(value, AnswerValue::Text("pet care".to_string()));
    }

    #[test]
    fn company_sheet_maps_steps_through_the_field_table() {
        let mut answers = CompanyAnswers::default();
        answers
            .set_at(0, Some(AnswerValue::Text("mobile grooming".to_string())))
            .expect("in range");
        answers
            .set_at(5, Some(AnswerValue::Text("grooming, baths".to_string())))
            .expect("in range");

        assert_eq!(answers.business_type.as_deref(), Some("mobile grooming"));
        assert_eq!(
            answers.key_products,
            Some(vec!["grooming".to_string(), "baths".to_string()])
        );
        assert_eq!(
            answers.value(CompanyField::KeyProducts),
            Some(AnswerValue::List(vec!["grooming".to_string(), "baths".to_string()]))
        );
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let mut answers = MarketAnswers::default();
        let error = answers
            .set_at(7, Some(AnswerValue::Text("x".to_string())))
            .expect_err("step 7 does not exist");
        assert!(error.to_string().contains("out of range"));
    }

    #[test]
    fn answer_values_flatten_for_prompts() {
        let list = AnswerValue::List(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.as_plain_text(), "a, b");
        assert!(AnswerValue::Text("  ".to_string()).is_empty());
        assert!(AnswerValue::List(Vec::new()).is_empty());
    }
}
