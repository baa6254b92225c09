//! WebFinger protocol implementation
//!
//! Maps `acct:user@domain` queries to local actor discovery documents.

use serde::{Deserialize, Serialize};

use super::identity::ActorUri;
use super::negotiation::ACTIVITY_JSON;
use crate::error::AppError;

/// WebFinger JRD response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerResponse {
    pub subject: String,
    pub aliases: Vec<String>,
    pub links: Vec<WebFingerLink>,
}

/// WebFinger link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerLink {
    pub rel: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub href: String,
}

/// A parsed `acct:` resource naming a local actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResource {
    pub user: String,
    pub domain: String,
}

/// Parse a webfinger `resource` value
///
/// Accepts `acct:user@domain` or bare `user@domain`. Empty segments
/// between `@`s are ignored, the domain must be `local_domain`, and the
/// user is trimmed of surrounding whitespace.
pub fn parse_resource(resource: &str, local_domain: &str) -> Result<AccountResource, AppError> {
    let account = resource.strip_prefix("acct:").unwrap_or(resource);
    let parts: Vec<&str> = account.split('@').filter(|part| !part.is_empty()).collect();

    let [user, domain] = parts.as_slice() else {
        return Err(AppError::MalformedResource(format!(
            "expected user@domain, got {resource}"
        )));
    };
    if *domain != local_domain {
        return Err(AppError::MalformedResource(format!(
            "domain {domain} is not served here"
        )));
    }

    let user = user.trim();
    if user.is_empty() {
        return Err(AppError::MalformedResource("empty user".to_string()));
    }

    Ok(AccountResource {
        user: user.to_string(),
        domain: local_domain.to_string(),
    })
}

/// Generate the discovery document for a local actor
pub fn generate_webfinger_response(user: &str, domain: &str) -> WebFingerResponse {
    let subject = format!("{}@{}", user, domain);

    WebFingerResponse {
        subject: subject.clone(),
        aliases: vec![subject],
        links: vec![WebFingerLink {
            rel: "self".to_string(),
            link_type: ACTIVITY_JSON.to_string(),
            href: ActorUri::new(user, domain).into(),
        }],
    }
}
