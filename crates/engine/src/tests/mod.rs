mod concurrency_tests;
mod helpers;
mod write_tests;
