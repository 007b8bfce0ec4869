pub mod data_generator;
pub mod stream_store;

#[cfg(test)]
mod layout;
