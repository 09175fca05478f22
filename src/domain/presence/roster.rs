//! Live viewer sessions for one auction.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::foundation::{AuctionId, Timestamp, ViewerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSession {
    pub auction_id: AuctionId,
    pub viewer_id: ViewerId,
    pub joined_at: Timestamp,
    pub last_seen: Timestamp,
}

/// Sessions keyed by viewer. The count is always the number of live
/// sessions, never a running delta.
#[derive(Debug, Clone)]
pub struct PresenceRoster {
    auction_id: AuctionId,
    sessions: HashMap<ViewerId, ViewerSession>,
}

impl PresenceRoster {
    pub fn new(auction_id: AuctionId) -> Self {
        Self {
            auction_id,
            sessions: HashMap::new(),
        }
    }

    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, viewer_id: &ViewerId) -> bool {
        self.sessions.contains_key(viewer_id)
    }

    /// Adds a session. A repeat join refreshes it and returns false.
    pub fn join(&mut self, viewer_id: ViewerId, now: Timestamp) -> bool {
        match self.sessions.get_mut(&viewer_id) {
            Some(session) => {
                session.last_seen = now;
                false
            }
            None => {
                self.sessions.insert(
                    viewer_id.clone(),
                    ViewerSession {
                        auction_id: self.auction_id,
                        viewer_id,
                        joined_at: now,
                        last_seen: now,
                    },
                );
                true
            }
        }
    }

    /// Removes a session. Unknown viewers leave nothing to remove.
    pub fn leave(&mut self, viewer_id: &ViewerId) -> bool {
        self.sessions.remove(viewer_id).is_some()
    }

    /// Marks the viewer alive. A heartbeat from a swept session re-joins it
    /// and returns true.
    pub fn heartbeat(&mut self, viewer_id: ViewerId, now: Timestamp) -> bool {
        self.join(viewer_id, now)
    }

    /// Drops sessions last seen before `cutoff`.
    pub fn expire(&mut self, cutoff: Timestamp) -> Vec<ViewerId> {
        let expired: Vec<ViewerId> = self
            .sessions
            .values()
            .filter(|session| session.last_seen.is_before(&cutoff))
            .map(|session| session.viewer_id.clone())
            .collect();
        for viewer_id in &expired {
            self.sessions.remove(viewer_id);
        }
        expired
    }
}
