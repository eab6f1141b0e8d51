pub(crate) mod decode;
pub(crate) mod mask;
pub(crate) mod prepare;
pub(crate) mod source;
