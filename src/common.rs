pub(crate) mod bucket;
pub(crate) mod concurrent;
pub(crate) mod constants;
pub(crate) mod error;
pub(crate) mod key;

#[cfg(test)]
pub(crate) mod test_utils;
