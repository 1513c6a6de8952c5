//! Declarative bronze/silver/gold pipeline over in-memory JSON tables.
//!
//! Stages are plain data: named inputs, an output column list, data-quality
//! expectations and a transform function. `Pipeline::run` orders stages by
//! their input dependencies, runs each transform, then projects its output to
//! the declared columns and applies the expectations.

pub mod order_events;

pub use order_events::{events_to_table, order_events_pipeline};

use crate::core::errors::PipelineError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

pub type Row = Map<String, Value>;
pub type Table = Vec<Row>;

/// Builds a stage's output from its input tables, given in declared order
pub type Transform = fn(&[&Table]) -> Table;

pub type Predicate = fn(&Row) -> bool;

/// Column listing the expectations a kept row failed
pub const FLAGS_COLUMN: &str = "_expectation_failures";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

/// What happens to a row that fails an expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnFail {
    Drop,
    Flag,
}

#[derive(Debug, Clone)]
pub struct Expectation {
    pub name: String,
    pub predicate: Predicate,
    pub on_fail: OnFail,
}

impl Expectation {
    pub fn drop(name: &str, predicate: Predicate) -> Self {
        Self {
            name: name.to_string(),
            predicate,
            on_fail: OnFail::Drop,
        }
    }

    pub fn flag(name: &str, predicate: Predicate) -> Self {
        Self {
            name: name.to_string(),
            predicate,
            on_fail: OnFail::Flag,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub layer: Layer,
    pub inputs: Vec<String>,
    /// Output columns; an empty list keeps whatever the transform emits
    pub output_schema: Vec<String>,
    pub expectations: Vec<Expectation>,
    pub transform: Transform,
}

impl Stage {
    pub fn new(name: &str, layer: Layer, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            layer,
            inputs: Vec::new(),
            output_schema: Vec::new(),
            expectations: Vec::new(),
            transform,
        }
    }

    pub fn with_inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, columns: &[&str]) -> Self {
        self.output_schema = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    fn project(&self, mut row: Row) -> Row {
        if self.output_schema.is_empty() {
            return row;
        }
        self.output_schema
            .iter()
            .map(|column| (column.clone(), row.remove(column).unwrap_or(Value::Null)))
            .collect()
    }
}

/// Failure count of one expectation in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationOutcome {
    pub stage: String,
    pub expectation: String,
    pub on_fail: OnFail,
    pub failures: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub tables: HashMap<String, Table>,
    pub outcomes: Vec<ExpectationOutcome>,
}

impl PipelineRun {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn failures(&self, stage: &str, expectation: &str) -> Option<usize> {
        self.outcomes
            .iter()
            .find(|o| o.stage == stage && o.expectation == expectation)
            .map(|o| o.failures)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage indices in dependency order; independent stages keep their
    /// declaration order
    pub fn execution_order(&self, sources: &HashSet<String>) -> Result<Vec<usize>, PipelineError> {
        let mut producers: HashMap<&str, usize> = HashMap::new();
        for (idx, stage) in self.stages.iter().enumerate() {
            if producers.insert(stage.name.as_str(), idx).is_some() {
                return Err(PipelineError::DuplicateStage(stage.name.clone()));
            }
        }

        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); self.stages.len()];
        let mut in_degree = vec![0usize; self.stages.len()];
        for (idx, stage) in self.stages.iter().enumerate() {
            for input in &stage.inputs {
                match producers.get(input.as_str()) {
                    Some(&producer) => {
                        downstream[producer].push(idx);
                        in_degree[idx] += 1;
                    }
                    None if sources.contains(input) => {}
                    None => {
                        return Err(PipelineError::UnknownInput {
                            stage: stage.name.clone(),
                            input: input.clone(),
                        })
                    }
                }
            }
        }

        // Kahn's algorithm, lowest declaration index first
        let mut order = Vec::with_capacity(self.stages.len());
        let mut done = vec![false; self.stages.len()];
        while order.len() < self.stages.len() {
            let Some(next) = (0..self.stages.len()).find(|&i| !done[i] && in_degree[i] == 0) else {
                let remaining = (0..self.stages.len())
                    .filter(|&i| !done[i])
                    .map(|i| self.stages[i].name.clone())
                    .collect();
                return Err(PipelineError::Cycle(remaining));
            };
            done[next] = true;
            order.push(next);
            for &target in &downstream[next] {
                in_degree[target] -= 1;
            }
        }
        Ok(order)
    }

    /// Run every stage over `sources`; the result holds the sources and
    /// every stage output by name
    pub fn run(&self, sources: HashMap<String, Table>) -> Result<PipelineRun, PipelineError> {
        let source_names: HashSet<String> = sources.keys().cloned().collect();
        let order = self.execution_order(&source_names)?;

        let mut run = PipelineRun {
            tables: sources,
            outcomes: Vec::new(),
        };
        let empty = Table::new();

        for idx in order {
            let stage = &self.stages[idx];
            let inputs: Vec<&Table> = stage
                .inputs
                .iter()
                .map(|name| run.tables.get(name).unwrap_or(&empty))
                .collect();
            let produced = (stage.transform)(&inputs);
            let rows_in = produced.len();

            let mut failures = vec![0usize; stage.expectations.len()];
            let mut output = Table::with_capacity(rows_in);
            for row in produced {
                let mut row = stage.project(row);
                let mut dropped = false;
                let mut flagged = Vec::new();
                for (i, expectation) in stage.expectations.iter().enumerate() {
                    if (expectation.predicate)(&row) {
                        continue;
                    }
                    failures[i] += 1;
                    match expectation.on_fail {
                        OnFail::Drop => dropped = true,
                        OnFail::Flag => flagged.push(Value::String(expectation.name.clone())),
                    }
                }
                if dropped {
                    continue;
                }
                if !flagged.is_empty() {
                    row.insert(FLAGS_COLUMN.to_string(), Value::Array(flagged));
                }
                output.push(row);
            }

            info!(
                "Stage {} ({:?}): {} rows produced, {} kept",
                stage.name,
                stage.layer,
                rows_in,
                output.len()
            );
            for (expectation, failed) in stage.expectations.iter().zip(failures) {
                if failed > 0 {
                    warn!(
                        "Stage {}: expectation {} failed on {} rows ({:?})",
                        stage.name, expectation.name, failed, expectation.on_fail
                    );
                }
                run.outcomes.push(ExpectationOutcome {
                    stage: stage.name.clone(),
                    expectation: expectation.name.clone(),
                    on_fail: expectation.on_fail,
                    failures: failed,
                });
            }
            run.tables.insert(stage.name.clone(), output);
        }

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn numbers() -> Table {
        (0..10).map(|n| row(json!({"n": n, "noise": "x"}))).collect()
    }

    fn passthrough(inputs: &[&Table]) -> Table {
        inputs.iter().flat_map(|t| t.iter().cloned()).collect()
    }

    fn doubled(inputs: &[&Table]) -> Table {
        inputs[0]
            .iter()
            .map(|r| row(json!({"n": r["n"].as_i64().unwrap_or(0) * 2})))
            .collect()
    }

    fn is_even(r: &Row) -> bool {
        r["n"].as_i64().is_some_and(|n| n % 2 == 0)
    }

    fn is_small(r: &Row) -> bool {
        r["n"].as_i64().is_some_and(|n| n < 10)
    }

    #[test]
    fn test_drop_and_flag_expectations() {
        let pipeline = Pipeline::new().with_stage(
            Stage::new("bronze", Layer::Bronze, passthrough)
                .with_inputs(&["raw"])
                .with_schema(&["n"])
                .with_expectation(Expectation::drop("even", is_even))
                .with_expectation(Expectation::flag("small", |r| r["n"].as_i64().is_some_and(|n| n < 6))),
        );
        let run = pipeline.run(HashMap::from([("raw".to_string(), numbers())])).unwrap();

        let bronze = run.table("bronze").unwrap();
        assert_eq!(bronze.len(), 5);
        assert!(bronze.iter().all(|r| !r.contains_key("noise")));
        let flagged: Vec<i64> = bronze
            .iter()
            .filter(|r| r.contains_key(FLAGS_COLUMN))
            .filter_map(|r| r["n"].as_i64())
            .collect();
        assert_eq!(flagged, vec![6, 8]);
        assert_eq!(run.failures("bronze", "even"), Some(5));
        assert_eq!(run.failures("bronze", "small"), Some(4));
    }

    #[test]
    fn test_stages_run_in_dependency_order() {
        // Declared out of order: silver reads bronze's output
        let pipeline = Pipeline::new()
            .with_stage(
                Stage::new("silver", Layer::Silver, doubled)
                    .with_inputs(&["bronze"])
                    .with_expectation(Expectation::flag("small", is_small)),
            )
            .with_stage(Stage::new("bronze", Layer::Bronze, passthrough).with_inputs(&["raw"]));

        let sources = HashSet::from(["raw".to_string()]);
        assert_eq!(pipeline.execution_order(&sources).unwrap(), vec![1, 0]);

        let run = pipeline.run(HashMap::from([("raw".to_string(), numbers())])).unwrap();
        assert_eq!(run.table("silver").unwrap().len(), 10);
        assert_eq!(run.failures("silver", "small"), Some(5));
    }

    #[test]
    fn test_planning_errors() {
        let sources = HashSet::from(["raw".to_string()]);

        let unknown = Pipeline::new().with_stage(Stage::new("a", Layer::Bronze, passthrough).with_inputs(&["missing"]));
        assert!(matches!(unknown.execution_order(&sources), Err(PipelineError::UnknownInput { .. })));

        let duplicate = Pipeline::new()
            .with_stage(Stage::new("a", Layer::Bronze, passthrough))
            .with_stage(Stage::new("a", Layer::Silver, passthrough));
        assert_eq!(
            duplicate.execution_order(&sources),
            Err(PipelineError::DuplicateStage("a".to_string()))
        );

        let cycle = Pipeline::new()
            .with_stage(Stage::new("a", Layer::Silver, passthrough).with_inputs(&["b"]))
            .with_stage(Stage::new("b", Layer::Gold, passthrough).with_inputs(&["a"]));
        assert!(matches!(cycle.execution_order(&sources), Err(PipelineError::Cycle(names)) if names.len() == 2));
    }
}
