//! Integration tests over the bundled platform game object

mod platform;
