pub mod accuracy;
pub mod consistency;

pub use accuracy::EvidenceFields;
