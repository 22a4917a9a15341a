pub mod reconciler;
pub mod store;
pub mod summary;
pub mod upstream;

#[cfg(test)]
pub mod testing;
