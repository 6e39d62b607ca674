//! Roster of valid voter identities.

use ballot_types::Identity;

use crate::StoreError;

/// Authoritative membership set of regular identities ("owners").
///
/// The voting core only queries it. `DEVELOPER` is never a roster member;
/// callers treat it separately.
pub trait Roster: Send + Sync {
    fn exists(&self, identity: &Identity) -> Result<bool, StoreError>;
}

impl<R: Roster + ?Sized> Roster for &R {
    fn exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        (**self).exists(identity)
    }
}

impl<R: Roster + ?Sized> Roster for std::sync::Arc<R> {
    fn exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        (**self).exists(identity)
    }
}
