//! Refinement meta-prompts.
//!
//! Prompt refinement routes a meta-prompt through a single configured
//! agent before the real fan-out, asking it to tighten the user's research
//! query. The templates live here so the orchestrator stays free of prompt
//! text.

/// Build the initial refinement meta-prompt for a raw query.
#[must_use]
pub fn refinement_prompt(query: &str) -> String {
    format!(
        "You are an expert research assistant. Please refine and improve the \
following research query to make it more specific, comprehensive, and likely \
to yield high-quality results from AI language models.\n\n\
Original query: \"{query}\"\n\n\
Please provide a refined version that:\n\
1. Is more specific and focused\n\
2. Includes relevant context and scope\n\
3. Suggests the type of analysis or perspective needed\n\
4. Is clear about the desired output format\n\n\
Respond with only the refined query, no explanations or additional text."
    )
}

/// Build the follow-up refinement meta-prompt incorporating user feedback.
#[must_use]
pub fn feedback_prompt(original: &str, current: &str, feedback: &str) -> String {
    format!(
        "You are an expert research assistant. I need you to further refine a \
research query based on user feedback.\n\n\
Original query: \"{original}\"\n\
Current refined version: \"{current}\"\n\
User feedback: \"{feedback}\"\n\n\
Please provide an improved version that addresses the user's feedback while \
maintaining the improvements from the current refinement.\n\n\
Respond with only the refined query, no explanations or additional text."
    )
}
