pub mod bands;
pub mod catalog;
pub mod params;
pub mod protocol;
pub mod session;
pub mod solves;

pub use bands::{Band, Pick, SelectedProblem, bands, select};
pub use catalog::{Problem, ProblemKey, Problemset, index_catalog};
pub use params::{Mode, SelectionParams};
pub use session::{DuelRoom, SoloSession};
pub use solves::{DuelSolves, ProblemSolves, SolveRecord, Submission};
