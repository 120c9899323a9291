pub mod bridge;
pub mod onewire;
