// =============================================================================
// Volume Attribution — buy/sell split by bar direction
// =============================================================================
//
// Each bar's volume goes entirely to one bucket:
//
//   close >= open  => Buy_Volume
//   close <  open  => Sell_Volume
//
// Running totals of both buckets, an overall buyer/seller ratio and the
// Volume Power columns (see `power`) are produced alongside. A frame without
// Open, Close or Volume cannot be attributed; it gets zero-filled buckets and
// the neutral ratio instead of an error.
//
// A row whose open or close is non-numeric has no decidable direction and
// counts as selling. A row whose volume is non-numeric contributes to neither
// bucket.
// =============================================================================

pub mod power;

use serde::Serialize;
use tracing::{debug, warn};

use crate::frame::{Column, PriceFrame};

pub use power::VolumePower;

/// Ratio reported when there was no selling at all.
pub const ALL_BUY_RATIO: f64 = 5.0;
/// Ratio of the zero-filled fallback profile.
pub const NEUTRAL_RATIO: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeProfile {
    #[serde(rename = "Buy_Volume")]
    pub buy_volume: Vec<f64>,
    #[serde(rename = "Sell_Volume")]
    pub sell_volume: Vec<f64>,
    #[serde(rename = "Cumulative_Buy_Volume")]
    pub cum_buy_volume: Vec<f64>,
    #[serde(rename = "Cumulative_Sell_Volume")]
    pub cum_sell_volume: Vec<f64>,
    /// sum(Buy_Volume) / sum(Sell_Volume), see `buyer_seller_ratio`.
    pub ratio: f64,
    pub power: VolumePower,
    /// Set when the profile is the zero-filled fallback.
    pub degraded: bool,
}

impl VolumeProfile {
    /// Zero-filled buckets with the neutral ratio.
    pub fn neutral(len: usize) -> Self {
        Self {
            buy_volume: vec![0.0; len],
            sell_volume: vec![0.0; len],
            cum_buy_volume: vec![0.0; len],
            cum_sell_volume: vec![0.0; len],
            ratio: NEUTRAL_RATIO,
            power: VolumePower::zeros(len),
            degraded: true,
        }
    }

    pub fn len(&self) -> usize {
        self.buy_volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy_volume.is_empty()
    }

    pub fn total_buy(&self) -> f64 {
        self.cum_buy_volume.last().copied().unwrap_or(0.0)
    }

    pub fn total_sell(&self) -> f64 {
        self.cum_sell_volume.last().copied().unwrap_or(0.0)
    }
}

/// Split every bar's volume into a buy or sell bucket.
pub fn attribute_volume(frame: &PriceFrame) -> VolumeProfile {
    let n = frame.len();
    if n == 0 {
        warn!("volume attribution on empty frame, using neutral profile");
        return VolumeProfile::neutral(0);
    }

    let (Some(open), Some(close), Some(volume)) = (
        frame.column(Column::Open),
        frame.column(Column::Close),
        frame.column(Column::Volume),
    ) else {
        warn!(bars = n, "volume attribution needs Open, Close and Volume, using neutral profile");
        return VolumeProfile::neutral(n);
    };

    let mut buy_volume = Vec::with_capacity(n);
    let mut sell_volume = Vec::with_capacity(n);
    let mut skipped = 0usize;

    for ((&o, &c), &v) in open.iter().zip(close).zip(volume) {
        if !v.is_finite() {
            skipped += 1;
            buy_volume.push(0.0);
            sell_volume.push(0.0);
        } else if o.is_finite() && c.is_finite() && c >= o {
            buy_volume.push(v);
            sell_volume.push(0.0);
        } else {
            buy_volume.push(0.0);
            sell_volume.push(v);
        }
    }
    if skipped > 0 {
        debug!(skipped, "rows with non-numeric volume left out of attribution");
    }

    let cum_buy_volume = running_total(&buy_volume);
    let cum_sell_volume = running_total(&sell_volume);
    let ratio = buyer_seller_ratio(
        cum_buy_volume.last().copied().unwrap_or(0.0),
        cum_sell_volume.last().copied().unwrap_or(0.0),
    );
    let power = VolumePower::from_buckets(&buy_volume, &sell_volume);

    VolumeProfile {
        buy_volume,
        sell_volume,
        cum_buy_volume,
        cum_sell_volume,
        ratio,
        power,
        degraded: false,
    }
}

/// Overall buy/sell ratio. Without any selling the ratio is capped at
/// `ALL_BUY_RATIO`, also when there was no volume at all.
pub fn buyer_seller_ratio(total_buy: f64, total_sell: f64) -> f64 {
    if total_sell > 0.0 {
        total_buy / total_sell
    } else {
        ALL_BUY_RATIO
    }
}

fn running_total(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame(open: &[f64], close: &[f64], volume: &[f64]) -> PriceFrame {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let dates = (0..open.len()).map(|i| start + chrono::Days::new(i as u64)).collect();
        PriceFrame::new(dates)
            .unwrap()
            .with_column(Column::Open, open.to_vec())
            .unwrap()
            .with_column(Column::Close, close.to_vec())
            .unwrap()
            .with_column(Column::Volume, volume.to_vec())
            .unwrap()
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let volume = [100.0, 250.0, 75.0, 300.0];
        let f = frame(&[10.0, 11.0, 12.0, 12.0], &[11.0, 10.5, 12.0, 13.0], &volume);
        let p = attribute_volume(&f);
        for i in 0..volume.len() {
            assert_eq!(p.buy_volume[i] + p.sell_volume[i], volume[i]);
            assert!(p.buy_volume[i] == 0.0 || p.sell_volume[i] == 0.0);
        }
        // Flat bar (index 2) counts as buying.
        assert_eq!(p.buy_volume[2], 75.0);
        assert!(!p.degraded);
    }

    #[test]
    fn cumulative_totals_are_non_decreasing() {
        let f = frame(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0], &[10.0, 20.0, 30.0]);
        let p = attribute_volume(&f);
        assert_eq!(p.cum_buy_volume, vec![10.0, 10.0, 40.0]);
        assert_eq!(p.cum_sell_volume, vec![0.0, 20.0, 20.0]);
        assert!((p.ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn no_selling_gives_capped_ratio() {
        let f = frame(&[1.0, 2.0], &[2.0, 3.0], &[1000.0, 1000.0]);
        let p = attribute_volume(&f);
        assert_eq!(p.ratio, ALL_BUY_RATIO);
        assert_eq!(p.total_sell(), 0.0);
        assert_eq!(p.total_buy(), 2000.0);
    }

    #[test]
    fn no_volume_is_capped_not_neutral() {
        let f = frame(&[1.0, 2.0], &[2.0, 1.0], &[0.0, 0.0]);
        let p = attribute_volume(&f);
        assert_eq!(p.ratio, ALL_BUY_RATIO);
        assert!(!p.degraded);
    }

    #[test]
    fn empty_frame_is_neutral() {
        let p = attribute_volume(&PriceFrame::default());
        assert!(p.is_empty());
        assert_eq!(p.ratio, NEUTRAL_RATIO);
        assert!(p.degraded);
    }

    #[test]
    fn missing_volume_column_is_zero_filled() {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let f = PriceFrame::new(vec![start, start + chrono::Days::new(1)])
            .unwrap()
            .with_column(Column::Open, vec![1.0, 2.0])
            .unwrap()
            .with_column(Column::Close, vec![2.0, 3.0])
            .unwrap();
        let p = attribute_volume(&f);
        assert_eq!(p, VolumeProfile::neutral(2));
    }

    #[test]
    fn undecidable_direction_counts_as_selling() {
        let volume = [10.0, 20.0, 30.0, 40.0];
        let f = frame(
            &[1.0, f64::NAN, 3.0, 4.0],
            &[2.0, 2.0, 2.0, f64::NAN],
            &volume,
        );
        let p = attribute_volume(&f);
        assert_eq!(p.buy_volume, vec![10.0, 0.0, 0.0, 0.0]);
        assert_eq!(p.sell_volume, vec![0.0, 20.0, 30.0, 40.0]);
        for i in 0..volume.len() {
            assert_eq!(p.buy_volume[i] + p.sell_volume[i], volume[i], "bar {i}");
        }
        assert!((p.ratio - 10.0 / 90.0).abs() < 1e-12);
    }

    #[test]
    fn non_numeric_volume_goes_nowhere() {
        let f = frame(&[1.0, 2.0], &[2.0, 1.0], &[10.0, f64::NAN]);
        let p = attribute_volume(&f);
        assert_eq!(p.buy_volume, vec![10.0, 0.0]);
        assert_eq!(p.sell_volume, vec![0.0, 0.0]);
        assert_eq!(p.ratio, ALL_BUY_RATIO);
    }

    #[test]
    fn power_columns_are_aligned() {
        let f = frame(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0], &[10.0, 20.0, 30.0]);
        let p = attribute_volume(&f);
        assert_eq!(p.power.len(), 3);
        assert_eq!(p.power.net_volume, vec![10.0, -20.0, 30.0]);
        assert_eq!(VolumeProfile::neutral(4).power, VolumePower::zeros(4));
    }
}
