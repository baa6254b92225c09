//! Canonical identity URIs
//!
//! Every document this node emits names actors and their collections
//! through [`ActorUri`]. Peers compare these strings byte for byte, so
//! derivation is plain suffix appending with no normalization.

use std::fmt;

/// Canonical URI of a local actor: `https://{domain}/users/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorUri(String);

impl ActorUri {
    pub fn new(name: &str, domain: &str) -> Self {
        Self(format!("https://{}/users/{}", domain, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn followers(&self) -> String {
        format!("{}/followers", self.0)
    }

    pub fn followers_page(&self, page: u64) -> String {
        format!("{}/followers?page={}", self.0, page)
    }

    pub fn following(&self) -> String {
        format!("{}/following", self.0)
    }

    pub fn following_page(&self, page: u64) -> String {
        format!("{}/following?page={}", self.0, page)
    }

    pub fn outbox(&self) -> String {
        format!("{}/outbox", self.0)
    }

    pub fn outbox_page(&self, page: u64) -> String {
        format!("{}/outbox?page={}", self.0, page)
    }

    pub fn inbox(&self) -> String {
        format!("{}/inbox", self.0)
    }

    /// Key id published in the actor document
    pub fn main_key(&self) -> String {
        format!("{}#main-key", self.0)
    }
}

impl fmt::Display for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ActorUri> for String {
    fn from(uri: ActorUri) -> Self {
        uri.0
    }
}

/// Public URI of a stored activity
pub fn activity_uri(domain: &str, activity_id: &str) -> String {
    format!("https://{}/activity/{}", domain, activity_id)
}

/// Public URI of a stored object
pub fn object_uri(domain: &str, object_id: &str) -> String {
    format!("https://{}/object/{}", domain, object_id)
}
