use super::DataCollector;
use crate::errors::EvalResult;
use crate::model::SampleContext;

#[derive(Debug, Default, Clone)]
pub struct DummyDataCollector;

impl DataCollector for DummyDataCollector {
    fn name(&self) -> &str {
        "dummy"
    }

    fn collect_sample_contexts(&self, sample_indices: &[usize]) -> EvalResult<Vec<SampleContext>> {
        Ok(sample_indices
            .iter()
            .map(|&index| SampleContext {
                index,
                reference: "Dummy response label".to_string(),
                turns: vec![
                    "Speaker A dummy question".to_string(),
                    "Speaker B dummy answer".to_string(),
                ],
                knowledge: vec![
                    "One dummy document".to_string(),
                    "Another dummy document".to_string(),
                ],
            })
            .collect())
    }
}
