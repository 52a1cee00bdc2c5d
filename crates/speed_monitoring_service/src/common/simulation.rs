/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const MAX_SIMULATED_SPEED_KMPH: f64 = 160.0;

/// Produces the next synthetic speed reading from the previous one and the active limit.
pub trait SpeedSource: Send {
    fn next_speed(&mut self, previous: SpeedInKmph, speed_limit: SpeedInKmph) -> SpeedInKmph;
}

/// Random walk with occasional deliberate excursions over the limit.
///
/// Each tick moves the speed by a delta drawn from `[-10, 20)` km/h, clamped to
/// `[0, 160]`. With probability `0.3` the walk is replaced by `limit + [0, 50)` so that the
/// overspeeding path is exercised regularly.
pub struct RandomSpeedSource<R: Rng + Send = StdRng> {
    rng: R,
    overspeed_probability: f64,
}

impl RandomSpeedSource<StdRng> {
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng + Send> RandomSpeedSource<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            overspeed_probability: 0.3,
        }
    }
}

impl<R: Rng + Send> SpeedSource for RandomSpeedSource<R> {
    fn next_speed(&mut self, previous: SpeedInKmph, speed_limit: SpeedInKmph) -> SpeedInKmph {
        let delta = self.rng.gen_range(-10.0..20.0);
        let mut speed = (previous.inner() as f64 + delta).clamp(0.0, MAX_SIMULATED_SPEED_KMPH);

        if self.rng.gen_bool(self.overspeed_probability) {
            speed = speed_limit.inner() as f64 + self.rng.gen_range(0.0..50.0);
        }

        SpeedInKmph(speed.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_walk_produces_both_compliant_and_overspeeding_values() {
        let mut source = RandomSpeedSource::from_seed(Some(7));
        let limit = SpeedInKmph(80);
        let mut speed = SpeedInKmph(0);
        let (mut under, mut over) = (0, 0);

        for _ in 0..500 {
            speed = source.next_speed(speed, limit);
            assert!(speed.inner() <= 160);
            if speed > limit {
                over += 1;
            } else {
                under += 1;
            }
        }

        assert!(under > 0);
        assert!(over > 0);
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RandomSpeedSource::from_seed(Some(42));
        let mut b = RandomSpeedSource::from_seed(Some(42));
        let limit = SpeedInKmph(100);
        let (mut sa, mut sb) = (SpeedInKmph(50), SpeedInKmph(50));
        for _ in 0..20 {
            sa = a.next_speed(sa, limit);
            sb = b.next_speed(sb, limit);
            assert_eq!(sa, sb);
        }
    }
}
