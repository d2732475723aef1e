pub mod model;
pub mod setter;
pub mod tokens;
pub mod value_variant;
pub mod visitor;
