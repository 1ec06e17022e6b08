pub(crate) mod output;
pub(crate) mod sign;
