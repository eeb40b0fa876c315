pub(crate) mod common;
mod lifecycle;
mod routing;
