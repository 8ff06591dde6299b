pub mod formatting;
pub mod parsing;

pub use formatting::{format_tag, node_value_to_string, spaced_keyword};
pub use parsing::{parse_value, value_conforms};
