/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    Armed,
    Fired,
}

/// Fires once per session when the warning threshold is reached while the vehicle is
/// still overspeeding. Only `reset` re-arms it.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    threshold: u32,
    state: AlertState,
}

impl AlertPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            state: AlertState::Armed,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns `true` on the single tick that moves the policy from `Armed` to `Fired`.
    pub fn observe(&mut self, warning_count: u32, is_overspeeding: bool) -> bool {
        if self.state == AlertState::Armed && is_overspeeding && warning_count >= self.threshold
        {
            self.state = AlertState::Fired;
            return true;
        }
        false
    }

    pub fn warnings_until_alert(&self, warning_count: u32) -> u32 {
        self.threshold.saturating_sub(warning_count)
    }

    pub fn reset(&mut self) {
        self.state = AlertState::Armed;
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(super::DEFAULT_WARNING_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_threshold() {
        let mut policy = AlertPolicy::default();
        assert!(!policy.observe(1, true));
        assert!(!policy.observe(2, true));
        assert!(policy.observe(3, true));
        assert!(!policy.observe(4, true));
        assert!(!policy.observe(5, true));
        assert_eq!(policy.state(), AlertState::Fired);
    }

    #[test]
    fn does_not_fire_when_back_under_limit() {
        let mut policy = AlertPolicy::default();
        assert!(!policy.observe(3, false));
        assert_eq!(policy.state(), AlertState::Armed);
        assert!(policy.observe(4, true));
    }

    #[test]
    fn reset_rearms() {
        let mut policy = AlertPolicy::default();
        assert!(policy.observe(3, true));
        policy.reset();
        assert_eq!(policy.state(), AlertState::Armed);
        assert_eq!(policy.warnings_until_alert(0), 3);
        assert_eq!(policy.warnings_until_alert(7), 0);
    }
}
