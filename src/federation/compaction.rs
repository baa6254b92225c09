//! JSON-LD compaction seam
//!
//! Documents are normalized through a [`Compactor`] before they are
//! stored or written. The node treats compaction as an opaque, pure
//! function of `(document, context)`.

use serde_json::{Map, Value, json};
use thiserror::Error;

use super::negotiation::ACTIVITYSTREAMS_NS;

/// Security vocabulary, referenced by actor documents for `publicKey`
pub const SECURITY_NS: &str = "https://w3id.org/security/v1";

/// Compaction failure: the input is not structurally valid linked data
#[derive(Debug, Error)]
pub enum CompactionError {
    #[error("document must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("context must be an object with an @context member")]
    MissingContext,

    #[error("invalid @context entry: {0}")]
    InvalidContext(String),
}

/// `compact(document, context) -> document`
pub trait Compactor: Send + Sync {
    fn compact(&self, document: Value, context: &Value) -> Result<Value, CompactionError>;
}

/// Compactor that validates shapes and binds the context to the document
///
/// Terms are already emitted in compact form by this node, so compaction
/// reduces to checking the context and replacing the document's own
/// `@context` with it.
#[derive(Debug, Clone, Default)]
pub struct ContextCompactor;

impl Compactor for ContextCompactor {
    fn compact(&self, document: Value, context: &Value) -> Result<Value, CompactionError> {
        let Value::Object(mut document) = document else {
            return Err(CompactionError::NotAnObject(json_kind(&document)));
        };

        let active_context = context
            .get("@context")
            .ok_or(CompactionError::MissingContext)?;
        validate_context(active_context)?;

        if let Some(own_context) = document.get("@context") {
            validate_context(own_context)?;
        }

        document.remove("@context");
        let mut compacted = Map::with_capacity(document.len() + 1);
        compacted.insert("@context".to_string(), active_context.clone());
        compacted.extend(document);

        Ok(Value::Object(compacted))
    }
}

fn validate_context(context: &Value) -> Result<(), CompactionError> {
    match context {
        Value::String(iri) if !iri.is_empty() => Ok(()),
        Value::Object(_) => Ok(()),
        Value::Array(entries) => entries.iter().try_for_each(|entry| match entry {
            Value::String(iri) if !iri.is_empty() => Ok(()),
            Value::Object(_) => Ok(()),
            other => Err(CompactionError::InvalidContext(json_kind(other).to_string())),
        }),
        other => Err(CompactionError::InvalidContext(json_kind(other).to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Base ActivityStreams context
pub fn base_context() -> Value {
    json!({ "@context": [ACTIVITYSTREAMS_NS] })
}

/// Context for collection pages listing actor URIs
pub fn graph_page_context() -> Value {
    json!({
        "@context": [
            ACTIVITYSTREAMS_NS,
            { "orderedItems": { "@id": "as:orderedItems", "@type": "@id" } }
        ]
    })
}

/// Context for outbox pages
pub fn outbox_page_context() -> Value {
    json!({
        "@context": [
            ACTIVITYSTREAMS_NS,
            {
                "schema": "http://schema.org#",
                "PropertyValue": "schema:PropertyValue",
                "value": "schema:value",
                "orderedItems": { "@container": "@list", "@id": "as:orderedItems" }
            }
        ]
    })
}

/// Context for actor documents
pub fn actor_context() -> Value {
    json!({
        "@context": [
            ACTIVITYSTREAMS_NS,
            SECURITY_NS,
            {
                "featured": { "@id": "toot:featured", "@type": "@id" },
                "alsoKnownAs": { "@id": "as:alsoKnownAs", "@type": "@id" },
                "movedTo": { "@id": "as:movedTo", "@type": "@id" },
                "schema": "http://schema.org#",
                "PropertyValue": "schema:PropertyValue",
                "value": "schema:value",
                "IdentityProof": "toot:IdentityProof",
                "discoverable": "toot:discoverable",
                "focalPoint": { "@container": "@list", "@id": "toot:focalPoint" }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_context_first() {
        let compacted = ContextCompactor
            .compact(json!({"type": "Note", "content": "hi"}), &base_context())
            .unwrap();

        assert_eq!(compacted["@context"], json!([ACTIVITYSTREAMS_NS]));
        assert_eq!(compacted["type"], "Note");
        assert_eq!(compacted["content"], "hi");
    }

    #[test]
    fn replaces_document_context() {
        let compacted = ContextCompactor
            .compact(
                json!({"@context": "https://www.w3.org/ns/activitystreams", "type": "Note"}),
                &actor_context(),
            )
            .unwrap();

        assert_eq!(compacted["@context"], actor_context()["@context"]);
    }

    #[test]
    fn rejects_non_object_documents() {
        let error = ContextCompactor
            .compact(json!(["not", "a", "document"]), &base_context())
            .unwrap_err();
        assert!(matches!(error, CompactionError::NotAnObject("array")));
    }

    #[test]
    fn rejects_invalid_contexts() {
        assert!(matches!(
            ContextCompactor.compact(json!({}), &json!({})),
            Err(CompactionError::MissingContext)
        ));
        assert!(matches!(
            ContextCompactor.compact(json!({"@context": 42}), &base_context()),
            Err(CompactionError::InvalidContext(_))
        ));
        assert!(matches!(
            ContextCompactor.compact(json!({}), &json!({"@context": [null]})),
            Err(CompactionError::InvalidContext(_))
        ));
    }
}
