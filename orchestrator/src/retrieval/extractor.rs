// Response Extractor: turns a legacy-format knowledge base reply into plain text
//
// Upstream providers have shipped several reply shapes over time. Each shape is
// tried in a fixed order and the first one that yields text wins.

use crate::error::RetrievalError;
use crate::models::LegacyRetrieveResponse;
use serde::Deserialize;
use serde_json::Value;

const SEPARATOR: &str = "\n\n";

/// One `{title, content, url}` record of an `answer` that is itself a JSON
/// array. Only the content is used.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageDocument {
    page_content: String,
}

pub struct ResponseExtractor;

impl ResponseExtractor {
    pub fn extract(response: &LegacyRetrieveResponse) -> Result<String, RetrievalError> {
        if let Some(answer) = response.answer.as_deref().filter(|a| !a.is_empty()) {
            return Ok(Self::from_answer(answer));
        }

        let data = match response.data.as_ref() {
            Some(Value::Null) | None => return Err(RetrievalError::NoAnswerFound),
            Some(data) => data,
        };

        let outputs = data.get("outputs");
        if let Some(text) = outputs.and_then(Self::from_documents) {
            return Ok(text);
        }
        if let Some(text) = outputs.and_then(Self::answer_or_text) {
            return Ok(text);
        }
        if let Some(text) = Self::answer_or_text(data) {
            return Ok(text);
        }

        Ok(data.to_string())
    }

    /// A record array joins its contents; anything else is plain text.
    fn from_answer(answer: &str) -> String {
        match serde_json::from_str::<Vec<DocumentRecord>>(answer) {
            Ok(records) => {
                let joined = Self::join(records.into_iter().filter_map(|r| r.content));
                if joined.is_empty() {
                    answer.to_string()
                } else {
                    joined
                }
            }
            Err(_) => answer.to_string(),
        }
    }

    fn from_documents(outputs: &Value) -> Option<String> {
        let documents = outputs.get("documents")?.as_array()?;
        let joined = Self::join(
            documents
                .iter()
                .filter_map(|doc| PageDocument::deserialize(doc).ok())
                .map(|doc| doc.page_content),
        );
        (!joined.is_empty()).then_some(joined)
    }

    fn answer_or_text(value: &Value) -> Option<String> {
        ["answer", "text"].iter().find_map(|key| {
            value
                .get(*key)
                .and_then(|v| String::deserialize(v).ok())
                .filter(|s| !s.is_empty())
        })
    }

    fn join(parts: impl Iterator<Item = String>) -> String {
        parts
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> LegacyRetrieveResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_answer_record_array_joins_content() {
        let response = parse(json!({
            "answer": "[{\"content\":\"A\"},{\"content\":\"B\"}]"
        }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "A\n\nB");
    }

    #[test]
    fn test_answer_records_skip_empty_content() {
        let response = parse(json!({
            "answer": "[{\"title\":\"t\",\"content\":\"\"},{\"content\":\"B\",\"url\":\"u\"}]"
        }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "B");
    }

    #[test]
    fn test_empty_answer_array_returned_verbatim() {
        let response = parse(json!({ "answer": "[]" }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "[]");
    }

    #[test]
    fn test_plain_answer_returned_verbatim() {
        let response = parse(json!({ "answer": "plain text" }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "plain text");
    }

    #[test]
    fn test_answer_wins_over_data() {
        let response = parse(json!({
            "answer": "from answer",
            "data": { "outputs": { "answer": "from data" } }
        }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "from answer");
    }

    #[test]
    fn test_output_documents_join_page_content() {
        let response = parse(json!({
            "answer": "",
            "data": { "outputs": {
                "documents": [
                    { "page_content": "one", "metadata": {} },
                    { "metadata": {} },
                    { "page_content": "two" }
                ],
                "answer": "ignored"
            }}
        }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "one\n\ntwo");
    }

    #[test]
    fn test_outputs_answer() {
        let response = parse(json!({ "data": { "outputs": { "answer": "X" } } }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "X");
    }

    #[test]
    fn test_outputs_text_when_documents_empty() {
        let response = parse(json!({
            "data": { "outputs": { "documents": [], "text": "T" } }
        }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "T");
    }

    #[test]
    fn test_data_answer_then_text() {
        let response = parse(json!({ "data": { "answer": "DA", "text": "DT" } }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "DA");

        let response = parse(json!({ "data": { "text": "DT" } }));
        assert_eq!(ResponseExtractor::extract(&response).unwrap(), "DT");
    }

    #[test]
    fn test_unknown_data_serialized() {
        let response = parse(json!({ "data": { "status": "ok" } }));
        assert_eq!(
            ResponseExtractor::extract(&response).unwrap(),
            r#"{"status":"ok"}"#
        );
    }

    #[test]
    fn test_empty_response_has_no_answer() {
        let response = parse(json!({}));
        assert!(matches!(
            ResponseExtractor::extract(&response),
            Err(RetrievalError::NoAnswerFound)
        ));

        let response = parse(json!({ "answer": "", "data": null }));
        assert!(matches!(
            ResponseExtractor::extract(&response),
            Err(RetrievalError::NoAnswerFound)
        ));
    }
}
