#[path = "../fixtures/mod.rs"]
mod fixtures;

mod import_test;
