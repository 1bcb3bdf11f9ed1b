pub(crate) mod quad;
pub(crate) mod text;
