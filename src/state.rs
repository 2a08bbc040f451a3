//! Type-state markers for context progression.
//!
//! Markers encoding, at compile time, how far a request has come. The final
//! state carries the partner resolved for the caller.

use crate::authorization::PartnerId;

/// Marker for a context whose caller has not been checked.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

/// Marker for a context with an authenticated principal but no partner yet.
#[derive(Debug, Clone, Copy)]
pub struct Authed {
    _private: (),
}

/// Marker for a context whose principal has been mapped to a partner.
///
/// Only this state hands out a [`RequestLog`](crate::RequestLog).
#[derive(Debug, Clone)]
pub struct Authorized {
    pub(crate) partner: PartnerId,
}

impl Unauthed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Authed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_markers_are_zero_sized() {
        assert_eq!(std::mem::size_of::<Unauthed>(), 0);
        assert_eq!(std::mem::size_of::<Authed>(), 0);
    }

    #[test]
    fn state_markers_cannot_be_constructed_publicly() {
        // Outside this module these do not compile:
        // let fake = Authed { _private: () };
        // let fake = Authorized { partner: PartnerId::new("TargetBase") };
    }
}
