pub mod prob;
pub mod pres;
pub mod samples;
