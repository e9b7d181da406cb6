pub mod exports;
mod types;
