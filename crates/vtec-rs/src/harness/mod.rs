//! Scripted test-drive: feed a sequence of simulated issuances through
//! classify + commit and check the rendered products.

mod product;
mod script;

use serde::Serialize;

use crate::core::{
    ActiveTable, ClassifyOptions, EtnPool, Hazard, Office, Segment, Timestamp, classify, commit,
};
use crate::{Error, Result};

pub use product::render_product;
pub use script::{Script, ScriptHazard, Step};

/// Outcome of one issuance.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub label: String,
    pub issue_time: Timestamp,
    pub segments: Vec<Segment>,
    pub product: String,
    pub committed: usize,
}

impl StepOutcome {
    /// Every `expect` substring must appear in order; no `reject` substring may appear.
    pub fn verify(&self, step: &Step) -> Result<()> {
        let mut cursor = 0;
        for needle in &step.expect {
            match self.product[cursor..].find(needle.as_str()) {
                Some(at) => cursor += at + needle.len(),
                None => {
                    let reason = if self.product.contains(needle.as_str()) {
                        format!("`{needle}` appears out of order in:\n{}", self.product)
                    } else {
                        format!("missing `{needle}` in:\n{}", self.product)
                    };
                    return Err(self.failure(reason));
                }
            }
        }
        if let Some(needle) = step
            .reject
            .iter()
            .find(|needle| self.product.contains(needle.as_str()))
        {
            return Err(self.failure(format!("unexpected `{needle}` in:\n{}", self.product)));
        }
        Ok(())
    }

    fn failure(&self, reason: String) -> Error {
        Error::Expectation {
            step: self.label.clone(),
            reason,
        }
    }
}

/// Drives one office's issuances against a table and ETN pool.
pub struct Runner<T> {
    office: Office,
    table: T,
    pool: EtnPool,
    options: ClassifyOptions,
}

impl<T> Runner<T>
where
    T: ActiveTable,
    Error: From<T::Error>,
{
    pub fn new(office: Office, table: T, pool: EtnPool, options: ClassifyOptions) -> Self {
        Self {
            office,
            table,
            pool,
            options,
        }
    }

    /// Runs every step, stopping at the first failed expectation.
    pub fn run(&mut self, script: &Script) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = self.step(index, step, script.base_time)?;
            outcome.verify(step)?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Classifies one step and, when the step asks for it, commits the result.
    pub fn step(&mut self, index: usize, step: &Step, base: Timestamp) -> Result<StepOutcome> {
        let label = step.label(index);
        let issue_time = step.issue_time(base);
        let hazards = step
            .hazards
            .iter()
            .map(|hazard| hazard.to_hazard(base))
            .collect::<Result<Vec<Hazard>>>()?;
        let options = ClassifyOptions {
            correction: step.correction,
            routine: step.routine,
            ..self.options.clone()
        };

        let span = tracing::info_span!("step", step = %label, issue_time = %issue_time);
        let _guard = span.enter();

        let segments = classify(
            &self.office,
            &hazards,
            &self.table,
            &self.pool,
            issue_time,
            &options,
        )?;
        let committed = if step.commit {
            commit(
                &mut self.table,
                &mut self.pool,
                &self.office,
                issue_time,
                &segments,
            )?
        } else {
            0
        };
        let product = render_product(&self.office, issue_time, &segments);
        tracing::info!(segments = segments.len(), committed, "step issued");
        Ok(StepOutcome {
            label,
            issue_time,
            segments,
            product,
            committed,
        })
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn pool(&self) -> &EtnPool {
        &self.pool
    }

    pub fn into_table(self) -> T {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::MemoryActiveTable;

    fn runner() -> Runner<MemoryActiveTable> {
        Runner::new(
            Office::new("KTBW").unwrap(),
            MemoryActiveTable::new(),
            EtnPool::new(),
            ClassifyOptions::default(),
        )
    }

    const SCRIPT: &str = r#"{
        "base_time": "2010-01-01T00:00:00Z",
        "steps": [
            {
                "hazards": [{"phen_sig": "WI.Y", "zones": ["FLZ042"], "start": 6, "end": 12}],
                "expect": ["FLZ042-", "/O.NEW.KTBW.WI.Y.0001.100101T0600Z-100101T1200Z/", "$$"]
            },
            {
                "offset_hours": 1,
                "hazards": [{"phen_sig": "WI.Y", "zones": ["FLZ042"], "start": 6, "end": 12}],
                "expect": ["/O.CON.KTBW.WI.Y.0001.100101T0600Z-100101T1200Z/"],
                "reject": ["NEW"]
            }
        ]
    }"#;

    #[test]
    fn run_commits_between_steps() {
        let script = Script::from_json(SCRIPT).unwrap();
        let mut runner = runner();
        let outcomes = runner.run(&script).expect("script passes");
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].committed, 1);
        assert_eq!(runner.table().len(), 2);
        assert_eq!(runner.pool().len(), 1);
    }

    #[test]
    fn out_of_order_expectation_fails() {
        let mut script = Script::from_json(SCRIPT).unwrap();
        script.steps[0].expect.reverse();
        let err = runner().run(&script).unwrap_err();
        match err {
            Error::Expectation { step, reason } => {
                assert_eq!(step, "1");
                assert!(reason.contains("out of order"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn uncommitted_step_leaves_table_alone() {
        let mut script = Script::from_json(SCRIPT).unwrap();
        script.steps[0].commit = false;
        script.steps.truncate(1);
        let mut runner = runner();
        runner.run(&script).expect("script passes");
        assert!(runner.into_table().is_empty());
    }
}
