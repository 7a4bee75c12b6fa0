pub(crate) mod interface;
