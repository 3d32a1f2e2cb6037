//! Row dumps of learned values
//!
//! Each row holds the per-action estimates of one discretized state together
//! with the state value `v = max_a Q(s,a)` and the greedy policy
//! (`pi = 1` when flapping is strictly preferred).

use serde::{Deserialize, Serialize};

use crate::{
    features::FeatureSet,
    linear::LinearWeights,
    monte_carlo::ReturnAverages,
    q_learning::QTable,
    types::{Action, DiscreteState},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub state: DiscreteState,
    pub q_flap: Option<f64>,
    pub q_noop: Option<f64>,
    pub v: f64,
    pub pi: u8,
}

impl ValueRow {
    fn new(state: DiscreteState, q_flap: Option<f64>, q_noop: Option<f64>) -> Option<Self> {
        let (v, pi) = match (q_flap, q_noop) {
            (Some(flap), Some(noop)) => (flap.max(noop), u8::from(flap > noop)),
            (Some(flap), None) => (flap, 1),
            (None, Some(noop)) => (noop, 0),
            (None, None) => return None,
        };
        Some(Self {
            state,
            q_flap,
            q_noop,
            v,
            pi,
        })
    }
}

/// Rows of a Q-table, ordered by state.
pub fn table_rows(table: &QTable) -> Vec<ValueRow> {
    let mut rows: Vec<ValueRow> = table
        .iter()
        .filter_map(|(state, values)| {
            ValueRow::new(
                state.clone(),
                Some(values[Action::Flap.index()]),
                Some(values[Action::Noop.index()]),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.state.cmp(&b.state));
    rows
}

/// Rows of Monte Carlo return averages; actions never tried stay empty.
pub fn average_rows(averages: &ReturnAverages) -> Vec<ValueRow> {
    averages
        .states()
        .into_iter()
        .filter_map(|state| {
            let flap = averages.mean(&state, Action::Flap);
            let noop = averages.mean(&state, Action::Noop);
            ValueRow::new(state, flap, noop)
        })
        .collect()
}

/// One feature of a linear agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRow {
    pub index: usize,
    pub feature: String,
    pub w_flap: f64,
    pub w_noop: f64,
}

pub fn weight_rows(weights: &LinearWeights, features: FeatureSet) -> Vec<WeightRow> {
    weights
        .for_action(Action::Flap)
        .iter()
        .zip(weights.for_action(Action::Noop))
        .enumerate()
        .map(|(index, (&w_flap, &w_noop))| WeightRow {
            index,
            feature: features.feature_name(index),
            w_flap,
            w_noop,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_learning::QInit;

    #[test]
    fn test_table_rows_sorted_with_policy() {
        let mut table = QTable::new(0.1, 1.0, QInit::default());
        table.set(DiscreteState::from([2, 0]), Action::Flap, 1.0);
        table.set(DiscreteState::from([1, 0]), Action::Noop, 3.0);

        let rows = table_rows(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state, DiscreteState::from([1, 0]));
        assert_eq!(rows[0].v, 3.0);
        assert_eq!(rows[0].pi, 0);
        assert_eq!(rows[1].pi, 1);
    }

    #[test]
    fn test_average_rows_keep_unknown_actions_empty() {
        let mut averages = ReturnAverages::default();
        averages.record((DiscreteState::from([4]), Action::Noop), -2.0);

        let rows = average_rows(&averages);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].q_flap, None);
        assert_eq!(rows[0].q_noop, Some(-2.0));
        assert_eq!(rows[0].v, -2.0);
        assert_eq!(rows[0].pi, 0);
    }

    #[test]
    fn test_weight_rows_cover_every_feature() {
        let mut weights = LinearWeights::zeros(FeatureSet::Raw.len());
        weights
            .step(Action::Flap, &[0.0, 0.0, 0.0, 0.0, 1.0], 2.0)
            .unwrap();
        let rows = weight_rows(&weights, FeatureSet::Raw);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].feature, "bias");
        assert_eq!(rows[4].w_flap, 2.0);
    }
}
