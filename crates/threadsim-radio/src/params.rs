//! RSSI/path-loss math shared by every [`crate::model::RadioModel`] variant
//! (SPEC_FULL §4.3). Grounded on the parameter-struct + threshold helper
//! idiom in `mcsim-link`'s link prediction module, adapted from terrain
//! path loss to the spec's log-distance indoor formula.

use serde::{Deserialize, Serialize};

/// RSSI sentinel meaning "no usable signal" — below receiver sensitivity
/// or out of the model's reachable disc.
pub const RSSI_MINUS_INFINITY: i8 = -127;

/// Meters of ideal-disc radius contributed by one unit of a node's
/// `radio_range` parameter (SPEC_FULL §4.3).
pub const IDEAL_DISC_METERS_PER_UNIT: f64 = 26.70;

/// Minimum distance, in meters, below which the log-distance path-loss
/// term is clamped to zero.
pub const PATH_LOSS_MIN_DISTANCE_M: f64 = 0.072;

const PATH_LOSS_EXPONENT_COEFF: f64 = 35.0;
const PATH_LOSS_REFERENCE_DB: f64 = 40.0;

/// Per-node static radio parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadioParams {
    pub tx_power_dbm: i8,
    pub rx_sensitivity_dbm: i8,
    /// Radio range in the caller's units; see [`IDEAL_DISC_METERS_PER_UNIT`].
    pub radio_range_units: f64,
}

impl Default for RadioParams {
    fn default() -> Self {
        RadioParams { tx_power_dbm: 0, rx_sensitivity_dbm: -100, radio_range_units: 100.0 }
    }
}

impl RadioParams {
    /// The ideal-disc reachability radius in meters.
    pub fn disc_radius_m(&self) -> f64 {
        self.radio_range_units * IDEAL_DISC_METERS_PER_UNIT
    }
}

/// A node's simulated physical position, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Log-distance indoor path loss in dB, per SPEC_FULL §4.3:
/// `L = 35*log10(d_m) + 40` for `d_m >= 0.072`, else `0`.
pub fn path_loss_db(distance_m: f64) -> f64 {
    if distance_m < PATH_LOSS_MIN_DISTANCE_M {
        0.0
    } else {
        PATH_LOSS_EXPONENT_COEFF * distance_m.log10() + PATH_LOSS_REFERENCE_DB
    }
}

/// Rounds half away from zero, matching the spec's rounding rule for RSSI.
pub fn round_half_away_from_zero(v: f64) -> i64 {
    if v >= 0.0 {
        (v + 0.5).floor() as i64
    } else {
        (v - 0.5).ceil() as i64
    }
}

/// Clamps a raw RSSI value into `[-126, 126]`.
pub fn clamp_rssi(v: i64) -> i8 {
    v.clamp(-126, 126) as i8
}

/// `RSSI = txPower - L`, rounded half-away-from-zero and clamped, with an
/// additional `shadow_fading_db` sample added before rounding (zero for
/// models without fading).
pub fn rssi_at_distance(tx_power_dbm: i8, distance_m: f64, shadow_fading_db: f64) -> i8 {
    let loss = path_loss_db(distance_m);
    let raw = tx_power_dbm as f64 - loss + shadow_fading_db;
    clamp_rssi(round_half_away_from_zero(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_loss_zero_below_min_distance() {
        assert_eq!(path_loss_db(0.01), 0.0);
    }

    #[test]
    fn path_loss_matches_formula_at_one_meter() {
        // 35*log10(1) + 40 == 40
        assert!((path_loss_db(1.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rssi_rounds_half_away_from_zero() {
        assert_eq!(round_half_away_from_zero(2.5), 3);
        assert_eq!(round_half_away_from_zero(-2.5), -3);
        assert_eq!(round_half_away_from_zero(2.4), 2);
    }

    #[test]
    fn rssi_clamped_to_bounds() {
        assert_eq!(clamp_rssi(200), 126);
        assert_eq!(clamp_rssi(-200), -126);
    }

    #[test]
    fn disc_radius_uses_meters_per_unit() {
        let p = RadioParams { tx_power_dbm: 0, rx_sensitivity_dbm: -100, radio_range_units: 10.0 };
        assert!((p.disc_radius_m() - 267.0).abs() < 1e-9);
    }
}
