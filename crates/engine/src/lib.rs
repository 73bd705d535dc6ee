pub mod cell;
pub mod clipboard;
pub mod column;
pub mod config;
pub mod datatype;
pub mod error;
pub mod filter;
pub mod footer;
pub mod grid;
pub mod history;
pub mod hooks;
pub mod matrix;
pub mod merge;
pub mod selection;
pub mod sort;

#[cfg(test)]
pub mod harness;
