//! Wire formats spoken by `lanwake`.

pub mod magic;
