pub mod locator;
pub mod resolver;
