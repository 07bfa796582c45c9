// test_utils - fixtures shared by unit tests, integration tests and benches.

pub mod fixture_workspace;
