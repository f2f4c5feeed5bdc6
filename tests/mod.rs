// Integration tests for the tidemark crate
// Each test module should be publicly declared here

mod analysis_tests;
mod difference_tests;
mod reference_tests;
