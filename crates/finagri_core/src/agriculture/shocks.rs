//! Yield and price shocks
//!
//! Every function takes the generator explicitly so a scenario owns its
//! whole random stream.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::model::{HazardEvent, RiskEvent, WeatherObservation};

/// Yield cut at full sensitivity when rainfall is below threshold
pub const RAINFALL_DEFICIT_CUT: f64 = 0.3;
/// Yield cut at full sensitivity when temperature is above threshold
pub const HEAT_CUT: f64 = 0.15;
/// Chance per sensitivity unit that a triggered hazard destroys the cycle
pub const HAZARD_TOTAL_LOSS: f64 = 0.1;
/// Chance per sensitivity unit that an unfavorable year destroys the cycle
pub const SYSTEMIC_TOTAL_LOSS: f64 = 0.5;
pub const SEASONALITY_AMPLITUDE: f64 = 0.1;
pub const SEASONALITY_PERIOD: u32 = 5;

/// Apply the rainfall and heat thresholds.
///
/// Only applied when both rainfall and temperature are observed.
#[must_use]
pub fn weather_adjusted_yield(
    base_yield: f64,
    weather: Option<&WeatherObservation>,
    sensitivity: f64,
    low_rainfall: f64,
    high_temperature: f64,
) -> f64 {
    let Some(WeatherObservation {
        rainfall: Some(rain),
        temperature: Some(temp),
    }) = weather.copied()
    else {
        return base_yield;
    };

    let mut factor = 1.0;
    if rain < low_rainfall {
        factor *= 1.0 - RAINFALL_DEFICIT_CUT * sensitivity;
    }
    if temp > high_temperature {
        factor *= 1.0 - HEAT_CUT * sensitivity;
    }
    base_yield * factor
}

/// Cut `value` by the event impact with the event probability.
pub fn apply_risk<R: Rng + ?Sized>(value: f64, risk: &RiskEvent, rng: &mut R) -> f64 {
    if rng.random::<f64>() < risk.probability {
        value * (1.0 - risk.impact)
    } else {
        value
    }
}

/// Draw each hazard independently; a triggered hazard may wipe out the cycle.
pub fn apply_hazards<R: Rng + ?Sized>(
    crop_yield: f64,
    sensitivity: f64,
    hazards: &[HazardEvent],
    rng: &mut R,
) -> f64 {
    let mut factor = 1.0;
    for hazard in hazards {
        if rng.random::<f64>() < hazard.probability {
            factor *= 1.0 - hazard.impact * sensitivity;
            if rng.random::<f64>() < HAZARD_TOTAL_LOSS * sensitivity {
                return 0.0;
            }
        }
    }
    crop_yield * factor
}

/// System-wide unfavorable year: a sensitivity-scaled loss, possibly total.
pub fn apply_unfavorable_year<R: Rng + ?Sized>(
    crop_yield: f64,
    sensitivity: f64,
    unfavorable: bool,
    mean_impact: f64,
    rng: &mut R,
) -> f64 {
    if !unfavorable {
        return crop_yield;
    }
    let reduced = crop_yield * (1.0 - sensitivity * mean_impact);
    if rng.random::<f64>() < SYSTEMIC_TOTAL_LOSS * sensitivity {
        0.0
    } else {
        reduced
    }
}

/// Five-year sinusoidal price cycle, `1 ± 10%`
#[must_use]
pub fn seasonality(year: u32) -> f64 {
    let phase = f64::from(year % SEASONALITY_PERIOD) / f64::from(SEASONALITY_PERIOD);
    1.0 + SEASONALITY_AMPLITUDE * (2.0 * PI * phase).sin()
}

/// Realized price: a normal draw around `price` with relative volatility
/// `sigma`, then the idiosyncratic price risk, floored at zero.
pub fn fluctuated_price<R: Rng + ?Sized>(
    price: f64,
    sigma: f64,
    risk: &RiskEvent,
    rng: &mut R,
) -> f64 {
    let drawn = match Normal::new(price, (price * sigma).abs()) {
        Ok(dist) => dist.sample(rng),
        Err(_) => price,
    };
    apply_risk(drawn, risk, rng).max(0.0)
}
