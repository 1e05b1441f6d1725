//! Test suites shared by every `ListSet` implementation.
//!
//! Integration tests instantiate these per set type through `rstest` cases.
