mod clean_tests;
mod clone_tests;
mod common;
mod components_tests;
mod shell_tests;
