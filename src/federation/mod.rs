//! ActivityPub protocol documents
//!
//! Handles:
//! - Actor identity URIs
//! - Content negotiation rules
//! - WebFinger discovery documents
//! - Paginated collections
//! - JSON-LD compaction
//! - Actor keypairs

mod collection;
mod compaction;
mod identity;
mod keys;
mod negotiation;
mod webfinger;

pub use collection::{
    Collection, CollectionKind, CollectionSource, OrderedCollection, OrderedCollectionPage,
    Paginator, parse_page_number,
};
pub use compaction::{
    CompactionError, Compactor, ContextCompactor, actor_context, base_context,
    graph_page_context, outbox_page_context,
};
pub use identity::{ActorUri, activity_uri, object_uri};
pub use keys::{KeyPair, KeyPairProvider, RSA_KEY_BITS, RsaKeyPairProvider};
pub use negotiation::{
    ACTIVITY_JSON, ACTIVITYSTREAMS_NS, JRD_JSON, LD_JSON, accepts_activity_json,
    is_activity_media_type,
};
pub use webfinger::{
    AccountResource, WebFingerLink, WebFingerResponse, generate_webfinger_response,
    parse_resource,
};
