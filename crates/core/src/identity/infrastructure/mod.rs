pub mod directory_reference_store;
