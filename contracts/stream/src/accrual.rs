use crate::Stream;

/// Amount the recipient of `stream` may withdraw at ledger time `now`.
pub fn withdrawable_amount(stream: &Stream, now: u64) -> i128 {
    calculate_withdrawable_amount(
        stream.start_time,
        stream.stop_time,
        stream.rate_per_second,
        stream.deposit,
        stream.remaining_balance,
        now,
    )
}

/// Linear vesting for the current window, minus what was already paid out of
/// it, capped at what is left in it.
///
/// - `now <= start_time`: nothing has vested.
/// - otherwise `vested = min((min(now, stop_time) - start_time) × rate, deposit)`
///   and the result is `vested - (deposit - remaining_balance)`, clamped to
///   `[0, remaining_balance]`.
///
/// With no withdrawal yet in the window this is exactly
/// `min(elapsed × rate, remaining_balance)`. Rounding dust left by the floor
/// division that produced `rate_per_second` is never reached. An overflowing
/// product is treated as fully vested.
pub fn calculate_withdrawable_amount(
    start_time: u64,
    stop_time: u64,
    rate_per_second: i128,
    deposit: i128,
    remaining_balance: i128,
    now: u64,
) -> i128 {
    if now <= start_time || remaining_balance <= 0 {
        return 0;
    }

    let effective_end = now.min(stop_time);
    let elapsed = effective_end.saturating_sub(start_time) as i128;

    let vested = elapsed
        .checked_mul(rate_per_second)
        .unwrap_or(deposit)
        .min(deposit);
    let withdrawn = deposit - remaining_balance;

    (vested - withdrawn).clamp(0, remaining_balance)
}

/// Floor-divided per-second rate for `deposit` spread over `[start_time, stop_time)`.
///
/// Returns 0 for an empty or inverted window.
pub fn rate_for(deposit: i128, start_time: u64, stop_time: u64) -> i128 {
    if stop_time <= start_time {
        return 0;
    }
    deposit / (stop_time - start_time) as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_vests_at_or_before_start() {
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 0), 0);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 99), 0);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 100), 0);
    }

    #[test]
    fn vests_linearly_inside_window() {
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 101), 10);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 150), 500);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 199), 990);
    }

    #[test]
    fn stops_vesting_at_stop_time() {
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 200), 1000);
        assert_eq!(
            calculate_withdrawable_amount(100, 200, 10, 1000, 1000, 10_000),
            1000
        );
    }

    #[test]
    fn capped_by_remaining_balance() {
        // 500 withdrawn at start + 50; at start + 150 the other 500 is due.
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 500, 250), 500);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 0, 250), 0);
    }

    #[test]
    fn already_withdrawn_is_not_paid_twice() {
        // 400 withdrawn at start + 40.
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 600, 140), 0);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 600, 141), 10);
        assert_eq!(calculate_withdrawable_amount(100, 200, 10, 1000, 600, 170), 300);
    }

    #[test]
    fn dust_is_never_reached_within_window() {
        // 1005 over 100s floors to 10/s; 5 units of dust stay behind.
        let rate = rate_for(1005, 0, 100);
        assert_eq!(rate, 10);
        assert_eq!(calculate_withdrawable_amount(0, 100, rate, 1005, 1005, 100), 1000);
        assert_eq!(calculate_withdrawable_amount(0, 100, rate, 1005, 5, 10_000), 0);
    }

    #[test]
    fn overflowing_product_is_fully_vested() {
        assert_eq!(
            calculate_withdrawable_amount(1, u64::MAX, i128::MAX, 77, 77, u64::MAX),
            77
        );
        assert_eq!(
            calculate_withdrawable_amount(1, u64::MAX, i128::MAX, 77, 30, u64::MAX),
            30
        );
    }

    #[test]
    fn matches_closed_form_across_timestamps() {
        let (start, stop, rate, deposit) = (1_000u64, 1_100u64, 7i128, 700i128);
        for withdrawn in [0i128, 35, 350, 699] {
            let remaining = deposit - withdrawn;
            for now in 900..1_300u64 {
                let elapsed = now.min(stop).saturating_sub(start) as i128;
                let expected = ((elapsed * rate).min(deposit) - withdrawn).clamp(0, remaining);
                assert_eq!(
                    calculate_withdrawable_amount(start, stop, rate, deposit, remaining, now),
                    expected,
                    "now = {}, withdrawn = {}",
                    now,
                    withdrawn
                );
                if withdrawn == 0 {
                    assert_eq!(expected, (elapsed * rate).min(remaining));
                }
            }
        }
    }

    #[test]
    fn rate_floors() {
        assert_eq!(rate_for(1000, 0, 100), 10);
        assert_eq!(rate_for(5, 0, 10), 0);
        assert_eq!(rate_for(999, 0, 100), 9);
        assert_eq!(rate_for(1000, 100, 100), 0);
    }
}
