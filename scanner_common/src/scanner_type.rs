//! Ranking queries supported by the brokerage scanner.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Named ranking query the brokerage scanner can run.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
)]
#[value(rename_all = "PascalCase")]
#[strum(ascii_case_insensitive)]
pub enum ScannerType {
    /// Ranked by percentage change against the previous close.
    ChangePercentRank,
    /// Ranked by absolute price change against the previous close.
    ChangePriceRank,
    /// Ranked by intraday high/low range.
    DayRangeRank,
    /// Ranked by traded volume.
    VolumeRank,
    /// Ranked by traded amount.
    AmountRank,
    /// Ranked by number of ticks.
    TickCountRank,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            "changepercentrank".parse::<ScannerType>().unwrap(),
            ScannerType::ChangePercentRank
        );
        assert_eq!("VolumeRank".parse::<ScannerType>().unwrap(), ScannerType::VolumeRank);
        assert!("Momentum".parse::<ScannerType>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for scanner_type in ScannerType::iter() {
            assert_eq!(scanner_type.to_string().parse::<ScannerType>().unwrap(), scanner_type);
        }
    }
}
