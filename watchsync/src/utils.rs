pub mod aborting_join_handle;
#[cfg(test)]
pub mod fake_history_writer;
