pub mod population;
pub mod progress;
pub mod selection;

pub use population::{GenerationSummary, Population, PopulationConfig};
pub use progress::{GenerationReport, LogProgressCallback, ProgressCallback};
pub use selection::{normalize_scores, FitnessWheel, ZeroFitnessPolicy};
