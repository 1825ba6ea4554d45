//! Prompt builder: fixed grounding instructions + labelled excerpts.

use rag_store::RetrievalHit;

/// Reply the model must give, verbatim, when the excerpts lack the answer.
pub const NOT_FOUND_REPLY: &str = "I couldn't find this in the provided documents.";

/// System instructions for grounded answers.
pub const SYSTEM_PROMPT: &str = "\
You answer questions about an organisation's documents.
Use ONLY the document excerpts supplied in the user message. Do not use outside knowledge.
If the excerpts do not contain the answer, reply exactly: I couldn't find this in the provided documents.
Keep the answer concise and factual.
Always end the answer with the sources you used, formatted as (Source, page N), for example (Leave Policy.pdf, page 3).";

/// Builds the user message: the question, then every hit labelled
/// `[chunk_id] (source, page N)` followed by its text, in ranking order.
///
/// # Example
/// ```
/// # use contextor::prompt::build_user_prompt;
/// let prompt = build_user_prompt("How many leave days?", &[]);
/// assert!(prompt.starts_with("Question: How many leave days?"));
/// ```
pub fn build_user_prompt(question: &str, hits: &[RetrievalHit]) -> String {
    let mut out = format!("Question: {}\n\nDocument excerpts:\n", question.trim());
    let blocks: Vec<String> = hits.iter().map(excerpt_block).collect();
    out.push_str(&blocks.join("\n\n"));
    out
}

fn excerpt_block(h: &RetrievalHit) -> String {
    format!(
        "[{}] ({}, page {})\n{}",
        h.chunk_id,
        h.metadata.source,
        h.metadata.page,
        h.text.trim()
    )
}
