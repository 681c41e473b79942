use crate::domain::{
    CustomerBehavior, GenerationRequest, PromptSpec, ScenarioDefinition, VariationParameters,
};
use crate::validation::ValidationOutcome;

/// System message for every generation call.
pub const GENERATOR_SYSTEM_PROMPT: &str = "You are an expert at generating realistic debt collection conversations. Always respond with valid JSON format.";

/// Default agent name used by base prompts; replaced with the variation's
/// agent name during substitution.
const DEFAULT_AGENT_NAME: &str = "Salma";

/// Builds the full generation request for one attempt. Pure: identical inputs
/// produce an identical request.
///
/// On the first attempt `feedback` is `None`. On a retry it carries the prior
/// attempt's [`ValidationOutcome`], whose issues are restated verbatim in a
/// critical-requirements block. All issues are surfaced together; no priority
/// order between missing tags and quality failures.
pub fn compose(
    base_prompt: &str,
    scenario: &ScenarioDefinition,
    variation: &VariationParameters,
    feedback: Option<&ValidationOutcome>,
    attempt: u32,
) -> GenerationRequest {
    let mut prompt = substitute(base_prompt, variation);
    prompt.push_str(&scenario_block(scenario));

    if let Some(outcome) = feedback {
        prompt.push_str(&feedback_block(outcome));
    }

    GenerationRequest {
        scenario_id: scenario.id.clone(),
        variation_index: variation.variation_index,
        attempt,
        prompt: PromptSpec {
            system: Some(GENERATOR_SYSTEM_PROMPT.to_string()),
            user: task_preamble(&prompt),
        },
    }
}

fn substitute(base_prompt: &str, variation: &VariationParameters) -> String {
    base_prompt
        .replace("{FirstName}", variation.first_name())
        .replace("{LastName}", variation.last_name())
        .replace("{amount}", &variation.amount_phrase())
        .replace("{DueDate}", &variation.due_date_phrase())
        .replace(DEFAULT_AGENT_NAME, &variation.agent_name)
}

fn scenario_block(scenario: &ScenarioDefinition) -> String {
    let tags = scenario
        .required_tags
        .iter()
        .map(|t| t.token())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "\n\n## SCENARIO-SPECIFIC INSTRUCTIONS FOR THIS CONVERSATION:\n\n\
         **Scenario Type:** {name}\n\
         **Description:** {description}\n\
         **Customer Behavior:** {behavior}\n\
         **Expected Outcome:** {outcome}\n\
         **Required Special Tags:** {tags}\n\n\
         **Conversation Requirements:**\n\
         - The conversation MUST include at least one of these special tags: {tags}\n\
         - Customer should exhibit behavior consistent with: {behavior}\n\
         - The conversation should naturally lead to outcome: {outcome}\n\
         - Make the conversation realistic and natural, not scripted\n\
         - Include appropriate emotional responses and realistic dialogue\n\
         - Ensure the agent follows the guided conversation rules from the base prompt\n\n\
         **Special Instructions:**\n{special}\n",
        name = scenario.name,
        description = scenario.description,
        behavior = scenario.customer_behavior,
        outcome = scenario.outcome,
        tags = tags,
        special = special_instructions(scenario),
    )
}

fn special_instructions(scenario: &ScenarioDefinition) -> &'static str {
    match scenario.customer_behavior {
        CustomerBehavior::WrongPerson => {
            "- The person answering is NOT the debtor\n\
             - Agent must handle according to regulations\n\
             - May need to transfer or disconnect"
        }
        CustomerBehavior::Hostile => {
            "- Customer becomes aggressive or angry\n\
             - Agent must remain professional\n\
             - May need to disconnect if too hostile"
        }
        CustomerBehavior::Legal => {
            "- Customer raises legal issues\n\
             - Agent must follow legal protocols\n\
             - May require escalation or transfer"
        }
        CustomerBehavior::Cooperative => {
            "- Customer is cooperative and willing to pay\n\
             - Focus on securing specific payment date\n\
             - Use function_1 tag for payment processing"
        }
        CustomerBehavior::Technical => {
            "- Technical issues affect the call quality\n\
             - May need to disconnect and callback\n\
             - Handle technical problems professionally"
        }
        CustomerBehavior::Vulnerable => {
            "- Customer needs special handling\n\
             - Be extra careful and considerate\n\
             - May need to transfer to specialist"
        }
        _ => {
            "- Follow standard debt collection procedures\n\
             - Adapt to customer responses naturally\n\
             - Include required special tags appropriately"
        }
    }
}

fn feedback_block(outcome: &ValidationOutcome) -> String {
    let mut enhancements: Vec<String> = Vec::new();

    if !outcome.tags_missing.is_empty() {
        let tags = outcome
            .tags_missing
            .iter()
            .map(|t| t.token())
            .collect::<Vec<_>>()
            .join(", ");
        enhancements.push(format!(
            "CRITICAL: You MUST include these special tags in the conversation: {tags}"
        ));
    }

    for issue in &outcome.issues {
        enhancements.push(issue.message.clone());
    }

    if enhancements.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n\n## CRITICAL REQUIREMENTS FOR THIS RETRY:\n");
    for e in &enhancements {
        block.push_str("- ");
        block.push_str(e);
        block.push('\n');
    }
    block
}

fn task_preamble(prompt: &str) -> String {
    format!(
        "You are tasked with generating a realistic debt collection phone conversation based on the provided system prompt and scenario requirements.\n\n\
         Generate a complete conversation between the debt collection agent and the customer. The conversation should:\n\
         1. Follow the system prompt guidelines exactly\n\
         2. Include the required special tags naturally in the conversation\n\
         3. Be realistic and natural, not scripted\n\
         4. Show appropriate progression through the conversation states\n\
         5. Include realistic customer responses and agent handling\n\n\
         Format the output as a JSON array where each message has \"role\" (either \"assistant\" for agent or \"user\" for customer) and \"content\" (the message text).\n\n\
         The conversation should start with the agent's opening and continue until a natural conclusion.\n\n\
         System Prompt and Scenario:\n{prompt}\n\n\
         Generate the conversation now:"
    )
}
