//! CSV export of saved agents

use std::{fs::File, io::Write, path::Path};

use serde::Serialize;

use crate::{
    Error, Result,
    analysis::{BlockAverage, ValueRow, WeightRow, average_rows, table_rows, weight_rows},
    persistence::{AgentKind, SavedAgent},
};

/// What [`export_agent`] wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub kind: AgentKind,
    pub rows: usize,
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write value rows with one column per state component.
///
/// When `columns` does not match the length of a state, the state is written
/// as a single `state` column instead.
pub fn write_value_rows<W: Write>(writer: W, columns: &[&str], rows: &[ValueRow]) -> Result<()> {
    let split = rows.iter().all(|row| row.state.len() == columns.len()) && !columns.is_empty();

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = if split { columns.to_vec() } else { vec!["state"] };
    header.extend(["q_flap", "q_noop", "v", "pi"]);
    wtr.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = if split {
            row.state.components().iter().map(i32::to_string).collect()
        } else {
            vec![row.state.to_string()]
        };
        record.push(format_value(row.q_flap));
        record.push(format_value(row.q_noop));
        record.push(row.v.to_string());
        record.push(row.pi.to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_weight_rows<W: Write>(writer: W, rows: &[WeightRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_block_averages<W: Write>(writer: W, blocks: &[BlockAverage]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for block in blocks {
        wtr.serialize(block)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Dump the learned values of `saved` to a CSV file at `path`.
pub fn export_agent(saved: &SavedAgent, path: &Path) -> Result<ExportSummary> {
    let file = File::create(path).map_err(|source| Error::Io {
        operation: format!("create export file {path:?}"),
        source,
    })?;

    let columns = saved
        .encoder()
        .map(|encoder| encoder.component_names())
        .unwrap_or_default();

    let rows = if let Some(table) = saved.q_table() {
        let rows = table_rows(table);
        write_value_rows(file, columns, &rows)?;
        rows.len()
    } else if let Some(averages) = saved.return_averages() {
        let rows = average_rows(averages);
        write_value_rows(file, columns, &rows)?;
        rows.len()
    } else if let (Some(weights), Some(features)) = (saved.linear_weights(), saved.feature_set())
    {
        let rows = weight_rows(weights, features);
        write_weight_rows(file, &rows)?;
        rows.len()
    } else {
        0
    };

    Ok(ExportSummary {
        kind: saved.kind,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        analysis::block_averages,
        exploration::EpsilonSchedule,
        persistence::TrainingMetadata,
        q_learning::{QInit, QLearningAgent},
        ports::Learner,
        types::{Action, DiscreteState, GameState, Transition},
    };

    #[test]
    fn test_value_rows_split_components() {
        let rows = vec![ValueRow {
            state: DiscreteState::from([-1, 2, 7]),
            q_flap: Some(0.5),
            q_noop: None,
            v: 0.5,
            pi: 1,
        }];
        let mut out = Vec::new();
        write_value_rows(&mut out, &["delta_y", "player_vel", "dist"], &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "delta_y,player_vel,dist,q_flap,q_noop,v,pi");
        assert_eq!(lines[1], "-1,2,7,0.5,,0.5,1");
    }

    #[test]
    fn test_block_averages_csv() {
        let blocks = block_averages(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let mut out = Vec::new();
        write_block_averages(&mut out, &blocks).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "episodes,mean\n2,1.5\n4,3.5\n");
    }

    #[test]
    fn test_export_q_learning_agent() {
        let mut agent =
            QLearningAgent::new(0.5, 1.0, EpsilonSchedule::constant(0.0), QInit::default());
        let state = GameState {
            player_y: 300.0,
            next_pipe_top_y: 100.0,
            next_pipe_dist_to_player: 60.0,
            ..GameState::default()
        };
        agent
            .observe(&Transition {
                state,
                action: Action::Noop,
                reward: -4.0,
                next_state: state,
                terminal: true,
            })
            .unwrap();

        let saved = SavedAgent::from_learner(&agent, TrainingMetadata::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.csv");
        let summary = export_agent(&saved, &path).unwrap();
        assert_eq!(summary.rows, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "delta_y,player_vel,next_pipe_dist_to_player,q_flap,q_noop,v,pi"
        );
        // dy = 200 -> 200*15/512 = 5, vel 0, dist 60*15/512 = 1
        assert_eq!(lines[1], "5,0,1,0,-2,0,1");
    }
}
