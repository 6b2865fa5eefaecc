//! Configuration access port.

/// Section/key lookups with typed defaults; missing or unparsable values yield the default.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
