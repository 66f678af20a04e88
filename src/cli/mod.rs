mod demo;
mod kinds;
mod root;

pub use root::Cli;
