pub mod cart_service;
pub mod cart_sweeper;
pub mod order_service;
