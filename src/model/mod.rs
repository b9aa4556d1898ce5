pub mod activity;
pub mod links;
pub mod matrix;
pub mod signature;
