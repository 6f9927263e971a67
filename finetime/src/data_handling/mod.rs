pub mod bin_sizes;
pub mod pa_scan;
pub mod samples;
