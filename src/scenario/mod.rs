//! Test-definition documents and their typed representation

mod loader;
mod model;

pub use loader::{load, parse, Format};
pub use model::{
    Assertion, Comparison, Params, Scenario, Step, StepBody, Subject, ASSERT_KIND,
};
