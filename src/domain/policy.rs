/// Ceiling applied when no other value is configured
pub const DEFAULT_MAX_BALANCE: u64 = 2_000_000;

/// Rules deciding whether a charge or use request may be applied
///
/// All checks are pure: they only look at their arguments and the configured ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountPolicy {
    max_balance: u64,
}

impl AmountPolicy {
    pub fn new(max_balance: u64) -> Self {
        Self { max_balance }
    }

    pub fn max_balance(&self) -> u64 {
        self.max_balance
    }

    /// A charge must add at least one point
    pub fn is_chargeable(&self, requested: i64) -> bool {
        requested >= 1
    }

    /// Whether charging `requested` keeps the balance at or below the ceiling
    pub fn can_add_without_exceeding_ceiling(&self, current: u64, requested: i64) -> bool {
        if requested < 1 {
            return false;
        }

        current
            .checked_add(requested.unsigned_abs())
            .is_some_and(|total| total <= self.max_balance)
    }

    /// A use must remove at least one point, and never more than the ceiling
    ///
    /// Since balances are bounded by the ceiling, the upper bound never rejects a use that
    /// `has_sufficient_balance` would have accepted.
    pub fn is_usable(&self, requested: i64) -> bool {
        requested >= 1 && requested.unsigned_abs() <= self.max_balance
    }

    pub fn has_sufficient_balance(&self, current: u64, requested: i64) -> bool {
        match u64::try_from(requested) {
            Ok(requested) => current >= requested,
            // Negative requests never remove points
            Err(_) => true,
        }
    }
}

impl Default for AmountPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BALANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[fixture]
    fn policy() -> AmountPolicy {
        AmountPolicy::default()
    }

    #[rstest]
    #[case(1, true)]
    #[case(10_000, true)]
    #[case(DEFAULT_MAX_BALANCE as i64 + 1, true)]
    #[case(0, false)]
    #[case(-100, false)]
    #[case(i64::MIN, false)]
    fn test_is_chargeable(policy: AmountPolicy, #[case] requested: i64, #[case] expected: bool) {
        assert_that!(policy.is_chargeable(requested)).is_equal_to(expected);
    }

    #[rstest]
    #[case(0, 1, true)]
    #[case(0, 2_000_000, true)]
    #[case(1_999_999, 1, true)]
    #[case(2_000_000, 1, false)]
    #[case(0, 2_000_001, false)]
    #[case(1_000, 0, false)]
    #[case(1_000, -1, false)]
    #[case(u64::MAX, i64::MAX, false)]
    fn test_can_add_without_exceeding_ceiling(
        policy: AmountPolicy,
        #[case] current: u64,
        #[case] requested: i64,
        #[case] expected: bool,
    ) {
        assert_that!(policy.can_add_without_exceeding_ceiling(current, requested))
            .is_equal_to(expected);
    }

    #[rstest]
    #[case(1, true)]
    #[case(10_000, true)]
    #[case(2_000_000, true)]
    #[case(2_000_001, false)]
    #[case(0, false)]
    #[case(-100, false)]
    fn test_is_usable(policy: AmountPolicy, #[case] requested: i64, #[case] expected: bool) {
        assert_that!(policy.is_usable(requested)).is_equal_to(expected);
    }

    #[rstest]
    #[case(1_000, 500, true)]
    #[case(1_000, 1_000, true)]
    #[case(1_000, 1_500, false)]
    #[case(0, 1_000, false)]
    #[case(0, 0, true)]
    fn test_has_sufficient_balance(
        policy: AmountPolicy,
        #[case] current: u64,
        #[case] requested: i64,
        #[case] expected: bool,
    ) {
        assert_that!(policy.has_sufficient_balance(current, requested)).is_equal_to(expected);
    }

    #[test]
    fn test_custom_ceiling() {
        let policy = AmountPolicy::new(100);

        assert_that!(policy.can_add_without_exceeding_ceiling(50, 50)).is_true();
        assert_that!(policy.can_add_without_exceeding_ceiling(50, 51)).is_false();
        assert_that!(policy.is_usable(101)).is_false();
    }
}
