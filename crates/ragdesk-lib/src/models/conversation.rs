// Conversation models
// Question answering responses from the code and log QA endpoints

use serde::{Deserialize, Serialize};

/// Raw answer returned by a QA endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    /// Set when the backend answered in free conversation mode
    #[serde(default)]
    pub is_conversation: bool,
}

/// Answer ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    /// Source citations, empty when they should not be shown
    pub sources: Vec<String>,
    pub is_conversation: bool,
}

impl From<AskResponse> for ChatReply {
    fn from(response: AskResponse) -> Self {
        // Citations only make sense for grounded answers
        let sources = match response.sources {
            Some(sources) if !sources.is_empty() && !response.is_conversation => sources,
            _ => Vec::new(),
        };

        Self {
            answer: response.answer,
            sources,
            is_conversation: response.is_conversation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_shown_for_grounded_answer() {
        let reply = ChatReply::from(AskResponse {
            answer: "See the router".to_string(),
            sources: Some(vec!["app/router.py".to_string()]),
            is_conversation: false,
        });
        assert_eq!(reply.sources, vec!["app/router.py".to_string()]);
    }

    #[test]
    fn test_sources_hidden_for_conversation() {
        let reply = ChatReply::from(AskResponse {
            answer: "Hello!".to_string(),
            sources: Some(vec!["app/router.py".to_string()]),
            is_conversation: true,
        });
        assert!(reply.sources.is_empty());
        assert!(reply.is_conversation);
    }

    #[test]
    fn test_missing_fields_default() {
        let response: AskResponse = serde_json::from_str(r#"{"answer":"hi"}"#).unwrap();
        assert!(response.sources.is_none());
        assert!(!response.is_conversation);
        assert!(ChatReply::from(response).sources.is_empty());
    }
}
