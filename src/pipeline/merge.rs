//! Build output records from listed metadata plus fetched content.

use serde_json::{Map, Value};

use crate::engine::hashing::content_digest;
use crate::utils::config::OUTPUT_MEDIA_TYPE;
use crate::{InternalMeta, ItemContent, OutputRecord, PendingFetch};

/// Keys the record sets itself; dropped from both metadata and content before merging.
const RESERVED_KEYS: [&str; 5] = ["id", "campaignId", "parent", "children", "internal"];

fn strip_reserved(fields: &mut Map<String, Value>) {
    for key in RESERVED_KEYS {
        fields.remove(key);
    }
}

/// Merge `pending`'s metadata with `content` (content wins on collisions).
pub fn merge_record(pending: &PendingFetch, content: ItemContent, node_type: &str) -> OutputRecord {
    let mut fields = pending.campaign.fields.clone();
    fields.extend(content);
    strip_reserved(&mut fields);

    let fingerprint = pending.fingerprint.as_str();
    OutputRecord {
        fields,
        campaign_id: pending.campaign.id.clone(),
        id: pending.campaign.output_id(),
        parent: None,
        children: Vec::new(),
        internal: InternalMeta {
            node_type: node_type.to_string(),
            media_type: OUTPUT_MEDIA_TYPE.to_string(),
            content: fingerprint.to_string(),
            content_digest: content_digest(fingerprint.as_bytes()),
        },
    }
}
