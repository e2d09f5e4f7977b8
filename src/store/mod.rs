pub mod output_log;

pub use output_log::OutputLog;
