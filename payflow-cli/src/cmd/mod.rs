pub mod run;
pub mod validate;
pub mod workflows;
