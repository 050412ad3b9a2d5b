pub mod catalog;
pub mod config;
pub mod duration;
pub mod run;
