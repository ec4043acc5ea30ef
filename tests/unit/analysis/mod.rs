pub mod mark_correlation;
