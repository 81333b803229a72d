pub mod fiscal_document;
pub mod inconsistency;
pub mod nfe_import;
pub mod product_reference;
pub mod response;
pub mod stock_entry;
pub mod supplier;
