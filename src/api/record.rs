//! Scoped access to player records

use std::ops::Deref;

use super::types::{PlayerId, PlayerRecord};
use super::Host;

/// A player record borrowed from the host.
///
/// The host is told to release the record when the guard goes out of scope.
pub struct PlayerRecordGuard<'h, H: Host + ?Sized> {
    host: &'h H,
    record: PlayerRecord,
}

impl<'h, H: Host + ?Sized> PlayerRecordGuard<'h, H> {
    /// Look up a connected player; None if the id does not resolve
    pub fn acquire(host: &'h H, id: PlayerId) -> Option<Self> {
        host.acquire_player_record(id)
            .map(|record| Self { host, record })
    }
}

impl<H: Host + ?Sized> Deref for PlayerRecordGuard<'_, H> {
    type Target = PlayerRecord;

    fn deref(&self) -> &PlayerRecord {
        &self.record
    }
}

impl<H: Host + ?Sized> Drop for PlayerRecordGuard<'_, H> {
    fn drop(&mut self) {
        self.host.release_player_record(self.record.id);
    }
}
