pub mod config;
pub mod pages;
pub mod report;
pub mod utils;
pub mod workbook;
