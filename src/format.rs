use alloy_primitives::U256;

const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Render a wei amount in ether, keeping at least one fractional digit.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let fraction = (wei % unit).to_string();

    let fraction = format!("{fraction:0>18}");
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Human-readable countdown until the next claim.
pub fn format_time_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "Ready to claim".to_string();
    }

    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    // Leading zero units are dropped, inner ones kept.
    let units = [(days, "d"), (hours, "h"), (minutes, "m"), (secs, "s")];
    let first = units.iter().position(|(v, _)| *v > 0).unwrap_or(3);
    units[first..]
        .iter()
        .map(|(v, suffix)| format!("{v}{suffix}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ether_formatting() {
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(U256::from(WEI_PER_ETHER)), "1.0");
        assert_eq!(format_ether(U256::from(100_000_000_000_000_000u64)), "0.1");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_time_remaining(0), "Ready to claim");
        assert_eq!(format_time_remaining(45), "45s");
        assert_eq!(format_time_remaining(3_600), "1h 0m 0s");
        assert_eq!(format_time_remaining(90_061), "1d 1h 1m 1s");
    }
}
