/// One parsed sample. `outputs` is empty for input-only (predict) lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub inputs: Vec<f32>,
    pub outputs: Vec<f32>,
}

impl Record {
    pub fn new(inputs: Vec<f32>, outputs: Vec<f32>) -> Record {
        Record { inputs, outputs }
    }

    pub fn inputs_only(inputs: Vec<f32>) -> Record {
        Record { inputs, outputs: Vec::new() }
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}
