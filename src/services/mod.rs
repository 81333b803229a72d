pub mod fiscal_service;
pub mod functional_patterns;
pub mod inconsistency_service;
pub mod nfe_import_service;
pub mod nfe_parser;
pub mod stock_service;
