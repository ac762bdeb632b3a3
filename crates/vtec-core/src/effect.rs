//! How a failed call should be treated by whoever runs the engine.
//!
//! Classification and product parsing are pure, so their errors are always
//! `Permanent` with `Effect::None`. Only a storage backend can leave the
//! active table in an unknown state.

/// Would running the same call again, unchanged, give a different answer?
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// The inputs or stored table must change first.
    Permanent,
    /// A later attempt may go through (busy file, interrupted write).
    Retryable,
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// Whether the active table was touched before the call failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Nothing was written.
    None,
    /// Records were written.
    Some,
    /// A write was in flight; reopen the table before trusting it.
    Unknown,
}

impl Effect {
    pub fn is_clean(self) -> bool {
        matches!(self, Effect::None)
    }
}

crate::enum_str! {
    impl Transience {
        pub fn as_str(&self) -> &'static str;
        fn parse_str(raw: &str) -> Option<Self>;
        variants {
            Permanent => ["permanent"],
            Retryable => ["retryable"],
            Unknown => ["unknown"],
        }
    }
}

crate::enum_str! {
    impl Effect {
        pub fn as_str(&self) -> &'static str;
        fn parse_str(raw: &str) -> Option<Self>;
        variants {
            None => ["none"],
            Some => ["some"],
            Unknown => ["unknown"],
        }
    }
}
