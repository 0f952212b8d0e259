pub mod examine;
pub mod evaluate;
pub mod settings;
pub mod single;
