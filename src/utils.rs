// Raffle Upkeep - Utility Functions
use crate::raffle_error::RaffleError;

/// Decimals of the native currency
pub const ETHER_DECIMALS: u32 = 18;
/// 1 ETH = 10^18 wei
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Convert a decimal ether amount ("0.01", "1", "2.5") to wei
pub fn parse_ether(value: &str) -> Result<u128, RaffleError> {
    let invalid = || RaffleError::InvalidAmount(value.to_string());

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > ETHER_DECIMALS as usize {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| invalid())?
            .checked_mul(WEI_PER_ETHER)
            .ok_or(RaffleError::Overflow)?
    };

    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        let scale = 10u128.pow(ETHER_DECIMALS - fraction.len() as u32);
        fraction.parse::<u128>().map_err(|_| invalid())? * scale
    };

    whole_wei.checked_add(fraction_wei).ok_or(RaffleError::Overflow)
}

/// Convert wei to a decimal ether string (for display purposes)
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return format!("{}.0", whole);
    }

    let digits = format!("{:018}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
