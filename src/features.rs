//! Feature vectors for linear value-function approximation

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::GameState;

const DELTA_Y_EDGES: [f64; 17] = [
    -250.0, -150.0, -110.0, -80.0, -50.0, -20.0, 0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0, 150.0,
    180.0, 250.0, 350.0,
];
const VELOCITY_EDGES: [f64; 8] = [-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0];
const DISTANCE_EDGES: [f64; 15] = [
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
];

const SCREEN_HEIGHT: f64 = 512.0;
const SCREEN_WIDTH: f64 = 288.0;
const MAX_DROP_SPEED: f64 = 10.0;

/// Index of the bin `value` falls into: bin `i` covers `[edges[i-1], edges[i])`.
fn bin_index(value: f64, edges: &[f64]) -> usize {
    edges
        .iter()
        .position(|&edge| value < edge)
        .unwrap_or(edges.len())
}

fn bin_label(prefix: &str, edges: &[f64], index: usize) -> String {
    match (index.checked_sub(1).and_then(|i| edges.get(i)), edges.get(index)) {
        (None, Some(high)) => format!("{prefix}<{high}"),
        (Some(low), Some(high)) => format!("{prefix}[{low},{high})"),
        (Some(low), None) => format!("{prefix}>={low}"),
        (None, None) => prefix.to_string(),
    }
}

/// How a [`GameState`] is turned into a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSet {
    /// One-hot bins over gap offset, half-velocity and scaled distance
    #[default]
    Binned,
    /// Scaled raw observation plus a bias term
    Raw,
}

impl FeatureSet {
    /// Length of the vectors produced by [`FeatureSet::features`].
    pub const fn len(self) -> usize {
        match self {
            FeatureSet::Binned => {
                DELTA_Y_EDGES.len() + 1 + VELOCITY_EDGES.len() + 1 + DISTANCE_EDGES.len() + 1
            }
            FeatureSet::Raw => 5,
        }
    }

    /// Label of feature `index`, used when dumping weights.
    pub fn feature_name(self, index: usize) -> String {
        match self {
            FeatureSet::Raw => ["top_y", "player_y", "player_vel", "dist", "bias"]
                .get(index)
                .map_or_else(|| format!("f{index}"), |name| name.to_string()),
            FeatureSet::Binned => {
                let velocity_offset = DELTA_Y_EDGES.len() + 1;
                let distance_offset = velocity_offset + VELOCITY_EDGES.len() + 1;
                if index < velocity_offset {
                    bin_label("dy", &DELTA_Y_EDGES, index)
                } else if index < distance_offset {
                    bin_label("vel/2", &VELOCITY_EDGES, index - velocity_offset)
                } else {
                    bin_label("dist", &DISTANCE_EDGES, index - distance_offset)
                }
            }
        }
    }

    pub fn features(self, state: &GameState) -> Vec<f64> {
        match self {
            FeatureSet::Binned => binned(state),
            FeatureSet::Raw => vec![
                state.next_pipe_top_y / SCREEN_HEIGHT,
                state.player_y / SCREEN_HEIGHT,
                state.player_vel / MAX_DROP_SPEED,
                state.next_pipe_dist_to_player / SCREEN_WIDTH,
                1.0,
            ],
        }
    }
}

fn binned(state: &GameState) -> Vec<f64> {
    let mut features = vec![0.0; FeatureSet::Binned.len()];

    let dy = bin_index(state.delta_y(), &DELTA_Y_EDGES);
    features[dy] = 1.0;

    let velocity_offset = DELTA_Y_EDGES.len() + 1;
    let vel = bin_index(state.player_vel / 2.0, &VELOCITY_EDGES);
    features[velocity_offset + vel] = 1.0;

    let distance_offset = velocity_offset + VELOCITY_EDGES.len() + 1;
    let distance = state.next_pipe_dist_to_player * 15.0 / SCREEN_WIDTH;
    features[distance_offset + bin_index(distance, &DISTANCE_EDGES)] = 1.0;

    features
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSet::Binned => f.write_str("binned"),
            FeatureSet::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for FeatureSet {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binned" | "one-hot" => Ok(FeatureSet::Binned),
            "raw" | "linear" => Ok(FeatureSet::Raw),
            _ => Err(crate::Error::ParseFeatureSet {
                input: s.to_string(),
                expected: "binned, raw".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binned_length_and_activation() {
        assert_eq!(FeatureSet::Binned.len(), 43);
        let state = GameState {
            player_y: 200.0,
            player_vel: 3.0,
            next_pipe_top_y: 150.0,
            next_pipe_dist_to_player: 100.0,
            ..GameState::default()
        };
        let features = FeatureSet::Binned.features(&state);
        assert_eq!(features.len(), 43);
        assert_eq!(features.iter().sum::<f64>(), 3.0);

        // dy = 50 -> [40, 60) -> bin 9
        assert_eq!(features[9], 1.0);
        // vel/2 = 1.5 -> [1, 2) -> bin 5 -> 18 + 5
        assert_eq!(features[23], 1.0);
        // 100*15/288 = 5.2 -> [5, 6) -> bin 5 -> 27 + 5
        assert_eq!(features[32], 1.0);
    }

    #[test]
    fn test_binned_extremes() {
        let state = GameState {
            player_y: 0.0,
            player_vel: -20.0,
            next_pipe_top_y: 400.0,
            next_pipe_dist_to_player: 500.0,
            ..GameState::default()
        };
        let features = FeatureSet::Binned.features(&state);
        assert_eq!(features[0], 1.0);
        assert_eq!(features[18], 1.0);
        assert_eq!(features[42], 1.0);
    }

    #[test]
    fn test_raw_has_bias() {
        let features = FeatureSet::Raw.features(&GameState::default());
        assert_eq!(features.len(), FeatureSet::Raw.len());
        assert_eq!(features[4], 1.0);
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(FeatureSet::Binned.feature_name(0), "dy<-250");
        assert_eq!(FeatureSet::Binned.feature_name(9), "dy[40,60)");
        assert_eq!(FeatureSet::Binned.feature_name(17), "dy>=350");
        assert_eq!(FeatureSet::Binned.feature_name(18), "vel/2<-3");
        assert_eq!(FeatureSet::Binned.feature_name(42), "dist>=15");
        assert_eq!(FeatureSet::Raw.feature_name(4), "bias");
    }
}
