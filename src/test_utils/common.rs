use crate::cluster::WriteOp;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// `n` plain documents targeting one index/type.
pub(crate) fn generate_write_ops(
    index: &str,
    n: usize,
) -> Vec<WriteOp> {
    (0..n)
        .map(|i| WriteOp::new(index, "doc", format!("id_{i}"), format!("{{\"seq\":{i}}}")))
        .collect()
}
