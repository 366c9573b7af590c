//! Process-wide counter of unexpected PDU runtime-value shapes. Must
//! survive across scrapes, so it's a lazily-initialized static rather than
//! scrape-local state.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

static UNEXPECTED_PDU_TYPE_TOTAL: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

pub fn increment_unexpected_pdu_type() {
    UNEXPECTED_PDU_TYPE_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn unexpected_pdu_type_total() -> u64 {
    UNEXPECTED_PDU_TYPE_TOTAL.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments_and_persists() {
        let before = unexpected_pdu_type_total();
        increment_unexpected_pdu_type();
        assert_eq!(unexpected_pdu_type_total(), before + 1);
    }
}
