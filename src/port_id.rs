//! Valid ranges of fixed port identifiers.
//!
//! Message types may carry a fixed subject ID, service types a fixed service ID.
//! Both ranges start at zero; the service range is much narrower.

use std::ops::RangeInclusive;

pub const MAX_SUBJECT_ID: u32 = 8191;
pub const MAX_SERVICE_ID: u32 = 511;

pub const SUBJECT_ID_RANGE: RangeInclusive<u32> = 0..=MAX_SUBJECT_ID;
pub const SERVICE_ID_RANGE: RangeInclusive<u32> = 0..=MAX_SERVICE_ID;

pub fn is_valid_subject_id(id: u32) -> bool {
    SUBJECT_ID_RANGE.contains(&id)
}

pub fn is_valid_service_id(id: u32) -> bool {
    SERVICE_ID_RANGE.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(is_valid_subject_id(0));
        assert!(is_valid_subject_id(MAX_SUBJECT_ID));
        assert!(!is_valid_subject_id(MAX_SUBJECT_ID + 1));
        assert!(is_valid_service_id(MAX_SERVICE_ID));
        assert!(!is_valid_service_id(MAX_SERVICE_ID + 1));
    }
}
