use serde::{Serialize, Deserialize};

/// Population statistics for one generation.
///
/// Field names serialize to the `Step,BacteriaCount` header of the stats file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Generation index, starting at 0 for the seeded grid.
    #[serde(rename = "Step")]
    pub step: u32,
    /// Number of Full cells on the whole lattice.
    #[serde(rename = "BacteriaCount")]
    pub bacteria_count: u64,
}

impl PopulationRecord {
    pub fn new(step: u32, bacteria_count: u64) -> Self {
        Self { step, bacteria_count }
    }
}
