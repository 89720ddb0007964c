//! Prompt templates for every generative call.
//!
//! Prompts embed the literal schema and answer data; the composition here
//! is deliberately plain string building so the exact provider input stays
//! auditable in one place.

use guidepost_core::survey::{CompanyAnswers, MarketAnswers};
use serde_json::Value;

/// Persona prompt for one-answer enhancement: professional rephrasing,
/// single paragraph, no schema constraint.
pub fn enhancement_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are a professional business writer. Your task is to enhance and rephrase the \
         given answer to be more professional, concise, and business-oriented. Keep the same \
         meaning but make it more polished and impactful. Avoid lengthy explanations or bullet \
         points. Focus on creating a single, powerful statement that captures the essence of \
         the business or answer.\n\n\
         Question: {question}\n\n\
         Original Answer: {answer}\n\n\
         Please provide a concise, professional enhancement of this answer in a single paragraph."
    )
}

/// Wrapper prompt for schema-constrained generation. The schema is embedded
/// verbatim so the model sees the exact structure the validator will hold
/// it to.
pub fn structured_generation_prompt(question: &str, input: &str, schema: &Value) -> String {
    let schema_text =
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "You are a specialized AI trained to generate structured content in JSON format.\n\
         Your task is to analyze the following input and generate a response that EXACTLY \
         matches this JSON schema:\n\n\
         {schema_text}\n\n\
         The response must be valid JSON and match the schema exactly. Each section must have \
         a title and properly formatted content array.\n\n\
         Question:\n{question}\n\n\
         Input:\n{input}\n\n\
         Remember:\n\
         1. Output must be valid JSON\n\
         2. Must include all required fields\n\
         3. Must follow the exact schema structure\n\
         4. Content types must be one of: \"h1\", \"h2\", \"h3\", \"paragraph\", or \"list\"\n\
         5. Lists must include the items array\n\n\
         Generate the JSON response now:"
    )
}

pub fn company_summary_instruction(company_name: Option<&str>) -> String {
    let for_name = company_name.map(|name| format!(" for {name}")).unwrap_or_default();
    let subject = company_name.unwrap_or("the company");
    let naming_note = company_name
        .map(|name| format!(" Use the name \"{name}\" naturally 2-3 times throughout the text."))
        .unwrap_or_default();

    format!(
        "Create a detailed company profile{for_name} that will serve as rich context for AI \
         systems. The profile must be structured in exactly four detailed paragraphs, following \
         this specific format:\n\n\
         1. Overview: Introduce {subject}, its core business focus, industry position, and key \
         differentiators.\n\
         2. Target Market & Services: Detail the target audience, their needs, and provide a \
         comprehensive list of products/services with their unique value propositions.\n\
         3. Market Position: Analyze the competitive landscape, key advantages over competitors, \
         and market differentiation strategy.\n\
         4. Brand & Communication: Describe the brand voice, company values, culture, and \
         approach to customer relationships.\n\n\
         Each paragraph must be detailed and thorough, incorporating specific information from \
         the provided data.{naming_note}"
    )
}

pub fn company_answer_block(company_name: Option<&str>, answers: &CompanyAnswers) -> String {
    let mut lines = Vec::new();
    if let Some(name) = company_name {
        lines.push(format!("Company Name: {name}"));
    }
    lines.push(format!("Business Type: {}", answers.business_type.clone().unwrap_or_default()));
    lines.push(format!("Industry: {}", answers.industry.clone().unwrap_or_default()));
    lines.push(format!(
        "Target Audience: {}",
        answers.target_audience.clone().unwrap_or_default()
    ));
    lines.push(format!(
        "Company Description: {}",
        answers.company_description.clone().unwrap_or_default()
    ));
    lines.push(format!("Brand Voice: {}", answers.brand_voice.clone().unwrap_or_default()));
    lines.push(format!(
        "Key Products/Services: {}",
        answers.key_products.clone().unwrap_or_default().join(", ")
    ));
    lines.push(format!(
        "Competitors: {}",
        answers.competitors.clone().unwrap_or_default().join(", ")
    ));
    lines.join("\n")
}

pub fn market_summary_instruction(company_name: Option<&str>) -> String {
    let for_name = company_name.map(|name| format!(" for {name}")).unwrap_or_default();
    let naming_note = company_name
        .map(|name| format!(" Use the name \"{name}\" naturally throughout the text."))
        .unwrap_or_default();

    format!(
        "Create a detailed target market profile{for_name} that will serve as rich context for \
         marketing strategy. The profile must be structured in exactly four sections with proper \
         formatting:\n\n\
         1. Ideal Customer Profile\n\
         - Create a vivid portrait of the ideal customer, including demographics, psychographics, \
         values, and lifestyle\n\
         - Use specific details and statistics where possible\n\
         - Format this with a main heading and supporting paragraphs\n\n\
         2. Customer Needs & Pain Points\n\
         - Analyze the specific problems and needs this market faces\n\
         - Explain how the business can address these needs\n\
         - Format with subheadings and bullet points for key pain points\n\n\
         3. Market Opportunity\n\
         - Assess the market size, growth potential, and geographic considerations\n\
         - Include specific numbers and trends where possible\n\
         - Use clear headings and structured paragraphs\n\n\
         4. Targeting Strategy\n\
         - Provide strategic recommendations for reaching and engaging this market\n\
         - Include specific channels and approaches\n\
         - Format with clear action items and recommendations\n\n\
         Each section should use proper formatting with headings and structured \
         content.{naming_note}"
    )
}

pub fn market_answer_block(company_name: Option<&str>, answers: &MarketAnswers) -> String {
    let mut lines = Vec::new();
    if let Some(name) = company_name {
        lines.push(format!("Company Name: {name}"));
    }
    lines.push(format!("Demographics: {}", answers.demographics.clone().unwrap_or_default()));
    lines.push(format!(
        "Psychographics: {}",
        answers.psychographics.clone().unwrap_or_default()
    ));
    lines.push(format!("Pain Points: {}", answers.pain_points.clone().unwrap_or_default()));
    lines.push(format!(
        "Buying Behavior: {}",
        answers.buying_behavior.clone().unwrap_or_default()
    ));
    lines.push(format!("Market Size: {}", answers.market_size.clone().unwrap_or_default()));
    lines.push(format!(
        "Growth Potential: {}",
        answers.growth_potential.clone().unwrap_or_default()
    ));
    lines.push(format!(
        "Geographic Focus: {}",
        answers.geographic_focus.clone().unwrap_or_default()
    ));
    lines.join("\n")
}

/// Persona synthesis prompt: one fictional individual grounded in the
/// market summary, every field required.
pub fn persona_instruction(market_summary_json: &str) -> String {
    format!(
        "You are a specialized AI trained to generate detailed target customer profiles in \
         JSON format.\n\n\
         Based on the following target market summary, create a detailed persona of a specific \
         individual who represents the ideal customer. This should be a realistic, relatable \
         person that embodies the key characteristics of the target market.\n\n\
         Market Summary:\n{market_summary_json}\n\n\
         Create a detailed customer profile that feels like a real person, with specific \
         traits, goals, and challenges. Make sure the profile is consistent with the market \
         summary but adds human details that make the persona feel authentic and relatable.\n\n\
         The profile should include:\n\
         1. A realistic full name\n\
         2. Specific age (not a range)\n\
         3. Current job position\n\
         4. Company size they work at\n\
         5. Industry they work in\n\
         6. 3-5 specific professional/personal goals\n\
         7. 3-5 key challenges they face\n\
         8. 2-4 personal interests or hobbies\n\
         9. Preferred communication/media channels\n\
         10. Key factors in their decision-making\n\
         11. Typical budget range for solutions\n\
         12. A brief narrative description of their daily life and priorities\n\n\
         Make the profile specific and believable, avoiding generic descriptions. Include small \
         details that make the persona feel real.\n\n\
         Remember:\n\
         1. Output must be valid JSON\n\
         2. Must include all required fields\n\
         3. Must follow the exact schema structure\n\
         4. Arrays must contain strings\n\
         5. Age must be a number, all other fields are strings\n\n\
         Generate the JSON response now:"
    )
}

/// Portrait prompt for the image provider, templated from the persona.
/// The appearance clause switches at age 35.
pub fn portrait_prompt(name: &str, age: i64, position: &str) -> String {
    let appearance = if age < 35 {
        "Young professional appearance"
    } else {
        "Experienced executive appearance"
    };
    format!(
        "Professional headshot portrait of {name}, a {age}-year-old {position}.\n\
         Key characteristics:\n\
         - Professional business attire\n\
         - {appearance}\n\
         - Confident, approachable smile\n\
         - Studio lighting with soft fill\n\
         - Neutral background\n\
         - Center-framed head and shoulders composition\n\
         - Sharp focus with shallow depth of field\n\
         - High-quality professional photo\n\
         - Realistic and natural appearance"
    )
}

#[cfg(test)]
mod tests {
    use guidepost_core::survey::{CompanyAnswers, MarketAnswers};
    use serde_json::json;

    use super::{
        company_answer_block, company_summary_instruction, enhancement_prompt,
        market_answer_block, market_summary_instruction, persona_instruction, portrait_prompt,
        structured_generation_prompt,
    };

    #[test]
    fn enhancement_prompt_embeds_question_and_answer() {
        let prompt = enhancement_prompt("What do you sell?", "we groom dogs");
        assert!(prompt.contains("professional business writer"));
        assert!(prompt.contains("Question: What do you sell?"));
        assert!(prompt.contains("Original Answer: we groom dogs"));
        assert!(prompt.contains("single paragraph"));
    }

    #[test]
    fn structured_prompt_embeds_the_schema_verbatim() {
        let schema = json!({ "type": "object", "required": ["sections"] });
        let prompt = structured_generation_prompt("Summarize", "data", &schema);
        assert!(prompt.contains("\"required\""));
        assert!(prompt.contains("Question:\nSummarize"));
        assert!(prompt.contains("Input:\ndata"));
        assert!(prompt.contains("\"h1\", \"h2\", \"h3\", \"paragraph\", or \"list\""));
    }

    #[test]
    fn company_instruction_weaves_the_name_in() {
        let named = company_summary_instruction(Some("Acme Anvils"));
        assert!(named.contains("for Acme Anvils"));
        assert!(named.contains("Use the name \"Acme Anvils\""));

        let anonymous = company_summary_instruction(None);
        assert!(anonymous.contains("Introduce the company"));
        assert!(!anonymous.contains("Use the name"));
    }

    #[test]
    fn company_answer_block_lists_every_field() {
        let answers = CompanyAnswers {
            business_type: Some("Anvil maker".to_string()),
            key_products: Some(vec!["anvils".to_string(), "hammers".to_string()]),
            ..CompanyAnswers::default()
        };
        let block = company_answer_block(Some("Acme"), &answers);

        assert!(block.contains("Company Name: Acme"));
        assert!(block.contains("Business Type: Anvil maker"));
        assert!(block.contains("Key Products/Services: anvils, hammers"));
        assert!(block.contains("Competitors: "));
    }

    #[test]
    fn market_prompts_cover_the_four_sections() {
        let instruction = market_summary_instruction(None);
        for heading in [
            "Ideal Customer Profile",
            "Customer Needs & Pain Points",
            "Market Opportunity",
            "Targeting Strategy",
        ] {
            assert!(instruction.contains(heading), "missing section heading {heading}");
        }

        let block = market_answer_block(
            None,
            &MarketAnswers {
                demographics: Some("urban professionals".to_string()),
                ..MarketAnswers::default()
            },
        );
        assert!(block.contains("Demographics: urban professionals"));
        assert!(block.contains("Geographic Focus: "));
    }

    #[test]
    fn persona_instruction_embeds_the_market_summary() {
        let prompt = persona_instruction("{\"sections\":[]}");
        assert!(prompt.contains("Market Summary:\n{\"sections\":[]}"));
        assert!(prompt.contains("Age must be a number"));
    }

    #[test]
    fn portrait_prompt_switches_appearance_at_35() {
        let young = portrait_prompt("Maya Chen", 29, "Designer");
        assert!(young.contains("Young professional appearance"));
        assert!(young.contains("29-year-old Designer"));

        let senior = portrait_prompt("Ray Osei", 52, "CFO");
        assert!(senior.contains("Experienced executive appearance"));
    }
}
