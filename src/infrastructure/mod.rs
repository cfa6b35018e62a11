pub mod cart_repo;
pub mod models;
pub mod order_repo;

#[cfg(test)]
pub(crate) mod test_support;
