//! Model name resolution and model listing.

use gembridge_types::protocol::gemini::ModelsResponse;
use gembridge_types::protocol::openai::{ModelEntry, ModelList};

const MODEL_PREFIX: &str = "models/";
const CHAT_FAMILIES: &[&str] = &["gemini-", "gemma-", "learnlm-"];
const EMBEDDING_FAMILIES: &[&str] = &["gemini-"];

/// Map a client-supplied chat model to a Gemini model id.
///
/// `models/<id>` is taken as an explicit Gemini id. Bare Gemini-family
/// names pass through; anything else (`gpt-4`, empty) gets `default`.
pub fn resolve_chat_model(requested: &str, default: &str) -> String {
    resolve(requested, CHAT_FAMILIES, default)
}

pub fn resolve_embeddings_model(requested: Option<&str>, default: &str) -> String {
    resolve(requested.unwrap_or_default(), EMBEDDING_FAMILIES, default)
}

fn resolve(requested: &str, families: &[&str], default: &str) -> String {
    let requested = requested.trim();
    if let Some(bare) = requested.strip_prefix(MODEL_PREFIX).filter(|b| !b.is_empty()) {
        return bare.to_string();
    }
    if families.iter().any(|f| requested.starts_with(f)) {
        return requested.to_string();
    }
    default.to_string()
}

pub fn transform_models_list(upstream: &ModelsResponse) -> ModelList {
    let data = upstream
        .models
        .iter()
        .map(|m| ModelEntry {
            id: m.name.strip_prefix(MODEL_PREFIX).unwrap_or(&m.name).to_string(),
            object: "model".to_string(),
            created: 0,
            owned_by: String::new(),
        })
        .collect();
    ModelList { object: "list".to_string(), data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gembridge_types::protocol::gemini::ModelInfo;

    #[test]
    fn test_resolve_chat_model() {
        let d = "gemini-2.5-flash";
        assert_eq!(resolve_chat_model("gpt-4", d), d);
        assert_eq!(resolve_chat_model("", d), d);
        assert_eq!(resolve_chat_model("gemini-2.5-pro", d), "gemini-2.5-pro");
        assert_eq!(resolve_chat_model("gemma-3-27b-it", d), "gemma-3-27b-it");
        assert_eq!(resolve_chat_model("learnlm-2.0-flash", d), "learnlm-2.0-flash");
        assert_eq!(resolve_chat_model("models/gemini-2.0-flash", d), "gemini-2.0-flash");
        assert_eq!(resolve_chat_model("models/tuned-123", d), "tuned-123");
        assert_eq!(resolve_chat_model("models/", d), d);
    }

    #[test]
    fn test_resolve_embeddings_model() {
        let d = "text-embedding-004";
        assert_eq!(resolve_embeddings_model(Some("text-embedding-3-small"), d), d);
        assert_eq!(resolve_embeddings_model(None, d), d);
        assert_eq!(resolve_embeddings_model(Some("gemini-embedding-001"), d), "gemini-embedding-001");
        assert_eq!(resolve_embeddings_model(Some("models/embedding-001"), d), "embedding-001");
    }

    #[test]
    fn test_transform_models_list() {
        let upstream = ModelsResponse {
            models: vec![
                ModelInfo { name: "models/gemini-2.5-flash".into() },
                ModelInfo { name: "models/text-embedding-004".into() },
            ],
            next_page_token: None,
        };
        let list = transform_models_list(&upstream);
        assert_eq!(list.object, "list");
        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].id, "gemini-2.5-flash");
        assert_eq!(list.data[0].object, "model");
        assert_eq!(list.data[0].created, 0);
        assert_eq!(list.data[1].owned_by, "");
    }
}
