//! End-to-end tests for the `lanwake` crates, driven through test doubles for
//! the network edges.

#[cfg(test)]
mod support;

#[cfg(test)]
mod monitoring {
    mod integration;
}

#[cfg(test)]
mod wake {
    mod integration;
}
