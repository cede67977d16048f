pub mod binder;
pub mod paths;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
