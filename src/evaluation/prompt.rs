//! Prompt templates for the judge, question generator and answerer.
//!
//! Judge prompts ask for a JSON verdict object; the question prompt asks for
//! a JSON array of strings.

use std::fmt::Write;

/// Placeholder when a response carries no source context.
pub const NO_SOURCES: &str = "No source context provided";

/// Fixed query used to judge the relevancy of a bare chunk.
pub const CHUNK_RELEVANCY_QUERY: &str = "What are the main points discussed in this section?";

const VERDICT_FORMAT: &str = r#"Provide your evaluation in the following JSON format:
{
  "passing": boolean,
  "score": number between 0 and 1,
  "feedback": "detailed explanation of the evaluation"
}"#;

fn sources_block(sources: &[String]) -> String {
    if sources.is_empty() {
        NO_SOURCES.to_string()
    } else {
        sources.join("\n\n")
    }
}

/// Builds the faithfulness judge prompt for a response and its sources.
#[must_use]
pub fn build_faithfulness_prompt(response: &str, sources: &[String]) -> String {
    let mut prompt = String::from(
        "You are evaluating the faithfulness of an AI response. A faithful response should only \
         contain information that can be directly derived from or supported by the source \
         context. The response should not include any hallucinated or unsupported claims.\n\n",
    );
    let _ = write!(
        prompt,
        "Response to evaluate:\n{response}\n\nSource Context:\n{sources}\n\n",
        sources = sources_block(sources),
    );
    prompt.push_str(
        "Please evaluate the faithfulness of the response by answering the following questions:\n\
         1. Does the response contain any information not supported by the source context?\n\
         2. Are there any claims or statements that go beyond what can be reasonably inferred \
         from the context?\n\
         3. Is the response consistent with the information provided in the source context?\n\n",
    );
    prompt.push_str(VERDICT_FORMAT);
    prompt
}

/// Builds the relevancy judge prompt for a query, a response and its sources.
#[must_use]
pub fn build_relevancy_prompt(query: &str, response: &str, sources: &[String]) -> String {
    let mut prompt = String::from(
        "You are evaluating the relevancy of an AI response to a given query. A relevant \
         response should directly address the query and provide information that helps answer \
         the question or fulfill the request.\n\n",
    );
    let _ = write!(
        prompt,
        "Query:\n{query}\n\nResponse to evaluate:\n{response}\n\nSource Context:\n{sources}\n\n",
        sources = sources_block(sources),
    );
    prompt.push_str(
        "Please evaluate the relevancy of the response by answering the following questions:\n\
         1. Does the response directly address the main focus of the query?\n\
         2. Is the information provided in the response relevant to answering the question?\n\
         3. Does the response contain unnecessary or tangential information not related to the \
         query?\n\
         4. Is the level of detail appropriate for the query?\n\n",
    );
    prompt.push_str(VERDICT_FORMAT);
    prompt
}

/// Builds the prompt asking for `count` questions about `text`.
#[must_use]
pub fn build_questions_prompt(text: &str, count: usize) -> String {
    format!(
        "Given the following text, generate {count} diverse and specific questions that can be \
         answered using the information provided. The questions should cover different aspects \
         and topics from the text. Format your response as a JSON array of strings containing \
         only the questions.\n\n\
         Text:\n{text}\n\n\
         Generate {count} questions:"
    )
}

/// Builds the prompt answering `question` from retrieved `context`.
#[must_use]
pub fn build_answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer:"
    )
}
