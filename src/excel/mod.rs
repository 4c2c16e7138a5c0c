//! Group sheet I/O
//!
//! - Writer: members list → one .xlsx per group (blank layout or template copy)
//! - Reader: graded .xlsx → members list + total score

mod group_reader;
mod group_writer;

pub use group_reader::{parse_members, parse_score, GroupSheet, GroupSheetReader};
pub use group_writer::{GroupSheetWriter, Template, TemplateSheet};
