pub mod order;
pub mod phone;
pub mod ports;
