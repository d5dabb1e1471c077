pub mod config;
pub mod ledger_file;
pub mod main_lib;
pub mod output;
