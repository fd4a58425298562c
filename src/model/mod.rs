pub mod classification;
pub mod config;
pub mod envelope;
pub mod extraction;
pub mod taxonomy;

pub use classification::*;
pub use config::{ClassifierConfig, Config};
pub use envelope::*;
pub use taxonomy::{SpecialistProfile, Taxonomy, TaxonomyError};
