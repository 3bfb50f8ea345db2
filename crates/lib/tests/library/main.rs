mod cache_tests;
mod common;
mod config_tests;
mod workspace_tests;
