//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    exploration::preferred_action,
    types::{Action, DiscreteState},
};

/// One-step Q-learning update of a single estimate.
///
/// Q(s,a) ← Q(s,a) + α[r + γ·next - Q(s,a)]
///
/// `next` is the estimate bootstrapped from the successor state (the maximum
/// over actions for Q-learning, zero for terminal transitions).
pub fn bellman_update(
    current: f64,
    reward: f64,
    discount_factor: f64,
    learning_rate: f64,
    next: f64,
) -> f64 {
    let td_target = reward + discount_factor * next;
    current + learning_rate * (td_target - current)
}

/// Initial value for state-action pairs not seen before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QInit {
    /// Every new entry starts at this value
    Constant(f64),
    /// A new state draws one integer in `[low, high]` shared by both actions
    UniformInt { low: i32, high: i32 },
}

impl QInit {
    /// Value reported for states never touched.
    pub fn unseen_value(self) -> f64 {
        match self {
            QInit::Constant(value) => value,
            QInit::UniformInt { low, high } => (low as f64 + high as f64) / 2.0,
        }
    }

    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            QInit::Constant(value) => value,
            QInit::UniformInt { low, high } => rng.random_range(low.min(high)..=high.max(low)) as f64,
        }
    }
}

impl Default for QInit {
    fn default() -> Self {
        QInit::Constant(0.0)
    }
}

/// Q-table mapping discretized states to one value per action
///
/// The table grows as new states are encountered and is never pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    /// Q-values: state -> [Q(s, flap), Q(s, noop)]
    q_values: HashMap<DiscreteState, [f64; 2]>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
    /// Initial Q-value for unseen states
    q_init: QInit,
}

impl QTable {
    pub fn new(learning_rate: f64, discount_factor: f64, q_init: QInit) -> Self {
        Self {
            q_values: HashMap::new(),
            learning_rate,
            discount_factor,
            q_init,
        }
    }

    /// Q-value for a state-action pair
    pub fn get(&self, state: &DiscreteState, action: Action) -> f64 {
        self.values(state)[action.index()]
    }

    /// Both Q-values for a state
    pub fn values(&self, state: &DiscreteState) -> [f64; 2] {
        self.q_values.get(state).copied().unwrap_or_else(|| {
            let v = self.q_init.unseen_value();
            [v, v]
        })
    }

    /// Whether the state has an entry.
    pub fn contains(&self, state: &DiscreteState) -> bool {
        self.q_values.contains_key(state)
    }

    /// Materialise the row for `state`, drawing its initial value if needed.
    pub fn touch<R: Rng + ?Sized>(&mut self, state: &DiscreteState, rng: &mut R) -> [f64; 2] {
        if let Some(values) = self.q_values.get(state) {
            return *values;
        }
        let v = self.q_init.draw(rng);
        self.q_values.insert(state.clone(), [v, v]);
        [v, v]
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: DiscreteState, action: Action, value: f64) {
        let unseen = self.q_init.unseen_value();
        self.q_values.entry(state).or_insert([unseen, unseen])[action.index()] = value;
    }

    /// Maximum Q-value over both actions
    pub fn max_q(&self, state: &DiscreteState) -> f64 {
        let [flap, noop] = self.values(state);
        flap.max(noop)
    }

    /// Action with the strictly larger value, `None` on a tie
    pub fn greedy_action(&self, state: &DiscreteState) -> Option<Action> {
        preferred_action(self.values(state))
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Terminal transitions bootstrap from zero rather than the next state.
    pub fn q_learning_update(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f64,
        next_state: &DiscreteState,
        done: bool,
    ) -> f64 {
        let current_q = self.get(&state, action);
        let max_next_q = if done { 0.0 } else { self.max_q(next_state) };
        let new_q = bellman_update(
            current_q,
            reward,
            self.discount_factor,
            self.learning_rate,
            max_next_q,
        );
        self.set(state, action, new_q);
        new_q
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn q_init(&self) -> QInit {
        self.q_init
    }

    /// Iterate over all stored rows (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (&DiscreteState, &[f64; 2])> {
        self.q_values.iter()
    }

    /// Reset all Q-values
    pub fn reset(&mut self) {
        self.q_values.clear();
    }

    /// Number of states stored
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn state(components: [i32; 3]) -> DiscreteState {
        DiscreteState::from(components)
    }

    #[test]
    fn test_bellman_update_formula() {
        // 1 + 0.5 * (2 + 0.9 * 4 - 1) = 3.3
        let updated = bellman_update(1.0, 2.0, 0.9, 0.5, 4.0);
        assert!((updated - 3.3).abs() < 1e-12);
    }

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::new(0.1, 1.0, QInit::Constant(0.0));
        assert_eq!(qtable.get(&state([0, 0, 0]), Action::Flap), 0.0);
        assert!(qtable.is_empty());
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::new(0.1, 1.0, QInit::default());
        let s = state([1, 2, 3]);
        qtable.set(s.clone(), Action::Noop, 1.5);
        assert_eq!(qtable.get(&s, Action::Noop), 1.5);
        assert_eq!(qtable.get(&s, Action::Flap), 0.0);
        assert_eq!(qtable.len(), 1);
    }

    #[test]
    fn test_greedy_action() {
        let mut qtable = QTable::new(0.1, 1.0, QInit::default());
        let s = state([1, 2, 3]);
        assert_eq!(qtable.greedy_action(&s), None);
        qtable.set(s.clone(), Action::Flap, 0.5);
        assert_eq!(qtable.greedy_action(&s), Some(Action::Flap));
        assert_eq!(qtable.max_q(&s), 0.5);
    }

    #[test]
    fn test_q_learning_update() {
        let mut qtable = QTable::new(0.5, 0.99, QInit::default());
        let s = state([0, 0, 0]);
        let next = state([0, 1, 0]);
        qtable.set(next.clone(), Action::Flap, 1.0);
        qtable.set(next.clone(), Action::Noop, 2.0);

        qtable.q_learning_update(s.clone(), Action::Flap, 0.0, &next, false);

        // 0 + 0.5 * (0 + 0.99 * 2.0 - 0) = 0.99
        assert!((qtable.get(&s, Action::Flap) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_update_ignores_next_state() {
        let mut qtable = QTable::new(0.1, 1.0, QInit::default());
        let s = state([0, 0, 0]);
        let next = state([9, 9, 9]);
        qtable.set(next.clone(), Action::Noop, 100.0);

        qtable.q_learning_update(s.clone(), Action::Noop, -100.0, &next, true);
        assert!((qtable.get(&s, Action::Noop) + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_init_shares_value_across_actions() {
        let mut qtable = QTable::new(0.5, 1.0, QInit::UniformInt { low: -5, high: 5 });
        let mut rng = StdRng::seed_from_u64(42);
        let s = state([4, 4, 4]);
        let [flap, noop] = qtable.touch(&s, &mut rng);
        assert_eq!(flap, noop);
        assert!((-5.0..=5.0).contains(&flap));
        assert_eq!(flap.fract(), 0.0);
        // touching again keeps the drawn value
        assert_eq!(qtable.touch(&s, &mut rng), [flap, noop]);
    }
}
