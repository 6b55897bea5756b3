//! Report slots, formatting, and assembly

mod assembler;
mod naming;
mod slots;

pub use assembler::{Report, ReportAssembler, SlotResult};
pub use naming::{display_value, score_attribute_key};
pub use slots::{DefaultFormatter, ReportLayout, SlotFormatter, SlotSpec};
