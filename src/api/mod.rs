pub mod fiscal_document_controller;
pub mod health_controller;
pub mod inconsistency_controller;
pub mod nfe_import_controller;
pub mod product_controller;
pub mod stock_controller;
pub mod supplier_controller;
