mod compare;
mod layout;

pub use compare::run_compare;
pub use layout::run_layout;
