//! Route registration for the fiscal service.

use actix_web::web;

use crate::api::*;

pub fn config_services(cfg: &mut web::ServiceConfig) {
    log::info!("Configuring routes");
    cfg.service(health_controller::health).service(
        web::scope("/api")
            .service(
                web::scope("/fiscal")
                    .service(
                        web::resource("/importacao-nfe/xml")
                            .route(web::post().to(nfe_import_controller::import_nfe_xml)),
                    )
                    .service(
                        web::resource("/importacao-nfe/xml/completo")
                            .route(web::post().to(nfe_import_controller::import_nfe_xml_complete)),
                    )
                    .service(
                        web::resource("/inconsistencias")
                            .route(web::get().to(inconsistency_controller::list)),
                    ),
            )
            .service(
                web::resource("/notas-fiscais/{id}")
                    .route(web::get().to(fiscal_document_controller::find_by_id)),
            )
            .service(
                web::resource("/fornecedores/{id}")
                    .route(web::get().to(supplier_controller::find_by_id)),
            )
            .service(web::resource("/produtos").route(web::get().to(product_controller::list)))
            .service(
                web::scope("/estoque")
                    .service(web::resource("").route(web::get().to(stock_controller::list)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(stock_controller::find_by_id)),
                    )
                    .service(
                        web::resource("/{id}/ajuste")
                            .route(web::post().to(stock_controller::adjust)),
                    ),
            ),
    );
}
