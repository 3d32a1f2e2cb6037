//! Statistics over per-episode score histories

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean score of one consecutive block of episodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockAverage {
    /// Episodes played up to the end of this block
    pub episodes: usize,
    pub mean: f64,
}

/// Split `scores` into `blocks` equal chunks and average each one.
///
/// The chunk size is `scores.len() / blocks` and exactly `blocks` averages
/// are returned. Trailing episodes past the last block are ignored, even when
/// they would fill another whole chunk (12 scores in 5 blocks gives 5
/// averages of 2 episodes, not 6).
///
/// # Errors
///
/// Returns [`Error::EmptyScores`] for an empty history and
/// [`Error::InvalidConfiguration`] when `blocks` is zero or larger than the
/// history.
pub fn block_averages(scores: &[f64], blocks: usize) -> Result<Vec<BlockAverage>> {
    if scores.is_empty() {
        return Err(Error::EmptyScores);
    }
    if blocks == 0 || blocks > scores.len() {
        return Err(Error::InvalidConfiguration {
            message: format!(
                "cannot split {} scores into {blocks} blocks",
                scores.len()
            ),
        });
    }

    let size = scores.len() / blocks;
    Ok(scores
        .chunks_exact(size)
        .take(blocks)
        .enumerate()
        .map(|(i, chunk)| BlockAverage {
            episodes: (i + 1) * size,
            mean: chunk.iter().sum::<f64>() / size as f64,
        })
        .collect())
}

/// Headline numbers of a score history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub episodes: usize,
    pub mean: f64,
    pub best: f64,
    /// Episodes covered by `recent_mean`
    pub recent: usize,
    pub recent_mean: f64,
}

impl ScoreSummary {
    /// Summarize `scores`, averaging the last `recent` episodes separately.
    pub fn from_scores(scores: &[f64], recent: usize) -> Result<Self> {
        if scores.is_empty() {
            return Err(Error::EmptyScores);
        }

        let recent = recent.clamp(1, scores.len());
        let tail = &scores[scores.len() - recent..];
        Ok(Self {
            episodes: scores.len(),
            mean: scores.iter().sum::<f64>() / scores.len() as f64,
            best: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            recent,
            recent_mean: tail.iter().sum::<f64>() / recent as f64,
        })
    }
}
