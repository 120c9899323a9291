pub mod tmp112;
pub mod zssc3123;
