//! Query preprocessing and domain identification (`spec.md` §4.4, §4.5).

pub mod identifier;
pub mod preprocessor;

pub use identifier::identify;
pub use preprocessor::preprocess;
