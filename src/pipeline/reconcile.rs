//! Reconciler: decide per listed campaign whether to drop, touch, or fetch content.

use log::warn;

use crate::engine::client::content_url_for;
use crate::engine::hashing::{fingerprint_equals, fingerprint_of};
use crate::errors::{StoreError, SyncError};
use crate::{Disposition, Fingerprint, ParsedItem, PendingFetch};

/// Classify one parsed record.
///
/// `lookup(output_id)` reads the stored fingerprint. A lookup error is reported and handled as a
/// cache miss, so the campaign is fetched again rather than lost. Nothing is written here.
pub fn classify<L>(parsed: ParsedItem, campaigns_url: &str, lookup: L) -> Disposition
where
    L: FnOnce(&str) -> Result<Option<Fingerprint>, StoreError>,
{
    let campaign = match parsed {
        ParsedItem::Valid(campaign) => campaign,
        malformed @ ParsedItem::Malformed(_) => {
            let err = SyncError::ItemMissingId {
                subject: malformed.subject().map(str::to_string),
            };
            warn!("{}; dropped", err);
            return Disposition::Drop;
        }
    };

    let output_id = campaign.output_id();
    let fingerprint = fingerprint_of(&campaign);
    let cached = lookup(&output_id).unwrap_or_else(|e| {
        warn!("{} (looking up {})", SyncError::CacheUnavailable(e), output_id);
        None
    });

    if fingerprint_equals(&fingerprint, cached.as_ref()) {
        return Disposition::Skip { output_id };
    }

    let content_url = content_url_for(campaigns_url, &campaign.id);
    Disposition::Pending(PendingFetch {
        campaign,
        fingerprint,
        content_url,
    })
}
