pub mod plugin;
pub mod run;
