mod lock;

pub(crate) use lock::lock;
