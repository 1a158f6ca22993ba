pub mod converters;
pub mod money;
pub mod scope;
pub mod window;
