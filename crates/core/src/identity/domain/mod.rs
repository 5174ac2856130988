pub mod reference_store;
