//! NFe import pipeline.
//!
//! Orchestrates the whole flow of one uploaded XML: upload gates, parsing,
//! structural validation, supplier and product resolution, document and item
//! persistence, stock movements and inconsistency detection.
//!
//! The import attempt record (`importacoes_nfe`) is committed outside the
//! pipeline transaction so rejected uploads stay auditable. Everything that
//! mutates fiscal or stock state runs inside a single transaction: a failure
//! at any step leaves supplier, catalog, document and ledger untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::db::{Connection, Pool},
    constants,
    error::{ServiceError, ServiceResult},
    models::{
        fiscal_document::{
            operations as document_ops, FiscalDocument, FiscalDocumentItem, NewFiscalDocument,
            NewFiscalDocumentItem, STATUS_PROCESSADA,
        },
        inconsistency::operations as inconsistency_ops,
        nfe_import::{
            operations as import_ops, NewNfeImport, NfeImportOutcome, IMPORT_STATUS_CONCLUIDA,
            IMPORT_STATUS_ERRO, IMPORT_STATUS_PROCESSANDO,
        },
        product_reference::{operations as product_ops, NewProductReference, ProductReference},
        supplier::{operations as supplier_ops, NewSupplier, Supplier},
    },
    services::{
        functional_patterns::{run_query, QueryReader},
        inconsistency_service, nfe_parser,
        nfe_parser::{NfeData, NfeItem},
        stock_service,
    },
};

/// One uploaded file, already drained from the multipart stream.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Successful import result, serialized straight to the API response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAccepted {
    pub status: &'static str,
    pub arquivo: String,
    pub tamanho: i64,
    pub mensagem: String,
    pub importacao_id: i32,
    pub nota_fiscal_id: i32,
    pub fornecedor_id: i32,
    pub itens_processados: i32,
    pub inconsistencias_detectadas: i32,
    pub alertas: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

struct PipelineOutput {
    document: FiscalDocument,
    supplier: Supplier,
    itens_processados: i32,
    alertas: Vec<String>,
}

/// Runs the upload gates in order: content, extension, size.
///
/// File presence is checked by the controller while draining the multipart
/// stream, before this function is reached.
pub fn validate_upload(file: &UploadedFile) -> ServiceResult<()> {
    if file.bytes.is_empty() {
        return Err(
            ServiceError::bad_request(constants::MESSAGE_ARQUIVO_VAZIO.to_string())
                .with_tag("importacao"),
        );
    }

    if !file.filename.to_lowercase().ends_with(".xml") {
        return Err(
            ServiceError::bad_request(constants::MESSAGE_APENAS_XML.to_string())
                .with_context(|ctx| {
                    ctx.with_tag("importacao")
                        .with_metadata("arquivo", file.filename.clone())
                }),
        );
    }

    if file.bytes.len() > constants::MAX_NFE_FILE_SIZE {
        return Err(
            ServiceError::bad_request(constants::MESSAGE_ARQUIVO_MUITO_GRANDE.to_string())
                .with_context(|ctx| {
                    ctx.with_tag("importacao")
                        .with_metadata("tamanho", file.bytes.len().to_string())
                }),
        );
    }

    Ok(())
}

/// Imports one NFe XML file end to end.
///
/// On failure the import record is closed as `ERRO` and the error carries
/// the record's id in its metadata, so the caller can still reference the
/// attempt.
pub fn import_nfe(
    file: UploadedFile,
    observacoes: Option<String>,
    pool: &Pool,
) -> ServiceResult<ImportAccepted> {
    validate_upload(&file)?;

    let arquivo = file.filename.clone();
    let tamanho = file.bytes.len() as i64;

    let record = {
        let arquivo = arquivo.clone();
        run_query(
            QueryReader::new(move |conn| {
                import_ops::create_import_record(
                    NewNfeImport {
                        nome_arquivo: arquivo.clone(),
                        tamanho_arquivo: tamanho,
                        status: IMPORT_STATUS_PROCESSANDO.to_string(),
                        observacoes: observacoes.clone(),
                    },
                    conn,
                )
            }),
            pool,
        )?
    };
    let import_id = record.id;

    match run_pipeline(&file, import_id, pool) {
        Ok(output) => {
            let inconsistencias = output.alertas.len() as i32;
            close_import_record(
                import_id,
                NfeImportOutcome {
                    status: Some(IMPORT_STATUS_CONCLUIDA.to_string()),
                    log_processamento: Some(format!(
                        "Nota {} importada: {} itens, {} inconsistências",
                        output.document.chave_acesso, output.itens_processados, inconsistencias
                    )),
                    quantidade_itens_processados: Some(output.itens_processados),
                    quantidade_inconsistencias: Some(inconsistencias),
                    ..NfeImportOutcome::default()
                },
                pool,
            );

            let mensagem = if inconsistencias > 0 {
                format!(
                    "NFe importada com sucesso. {} inconsistência(s) detectada(s)",
                    inconsistencias
                )
            } else {
                "NFe importada com sucesso".to_string()
            };

            Ok(ImportAccepted {
                status: constants::STATUS_SUCESSO,
                arquivo,
                tamanho,
                mensagem,
                importacao_id: import_id,
                nota_fiscal_id: output.document.id,
                fornecedor_id: output.supplier.id,
                itens_processados: output.itens_processados,
                inconsistencias_detectadas: inconsistencias,
                alertas: output.alertas,
                timestamp: Utc::now(),
            })
        }
        Err(err) => {
            close_import_record(
                import_id,
                NfeImportOutcome {
                    status: Some(IMPORT_STATUS_ERRO.to_string()),
                    erros_processamento: Some(err.message().to_string()),
                    ..NfeImportOutcome::default()
                },
                pool,
            );

            Err(err
                .with_context(|ctx| ctx.with_metadata("importacao_id", import_id.to_string())))
        }
    }
}

fn run_pipeline(file: &UploadedFile, import_id: i32, pool: &Pool) -> ServiceResult<PipelineOutput> {
    let xml = String::from_utf8_lossy(&file.bytes).into_owned();
    let nfe = nfe_parser::parse_nfe_xml(&xml)?;
    nfe_parser::validate_structure(&nfe)?;

    run_query(
        QueryReader::new(move |conn| persist_nfe(&nfe, import_id, conn)).transaction(),
        pool,
    )
}

/// The transactional core of the pipeline. Runs on one connection inside a
/// transaction owned by the caller.
fn persist_nfe(
    nfe: &NfeData,
    import_id: i32,
    conn: &mut Connection,
) -> Result<PipelineOutput, ServiceError> {
    if document_ops::document_exists_by_chave_acesso(&nfe.chave_acesso, conn)? {
        return Err(
            ServiceError::conflict(constants::MESSAGE_NFE_DUPLICADA.to_string()).with_context(
                |ctx| {
                    ctx.with_tag("importacao")
                        .with_metadata("chave_acesso", nfe.chave_acesso.clone())
                },
            ),
        );
    }

    // validate_structure guarantees the issuer block is present
    let emitente = nfe.emitente.as_ref().ok_or_else(|| {
        ServiceError::bad_request(constants::MESSAGE_EMITENTE_OBRIGATORIO.to_string())
    })?;

    let supplier = supplier_ops::find_or_create_supplier(
        NewSupplier {
            cnpj: emitente.cnpj.clone(),
            razao_social: emitente.razao_social.clone(),
            nome_fantasia: emitente.nome_fantasia.clone(),
            inscricao_estadual: emitente.inscricao_estadual.clone(),
            endereco: emitente.endereco.clone(),
            telefone: emitente.telefone.clone(),
            email: emitente.email.clone(),
            status: None,
        },
        conn,
    )?;

    let tipo_operacao = nfe.tipo_operacao();

    let document = document_ops::create_fiscal_document(
        NewFiscalDocument {
            chave_acesso: nfe.chave_acesso.clone(),
            numero: nfe.numero.clone(),
            serie: nfe.serie.clone(),
            tipo_operacao: tipo_operacao.to_string(),
            status: STATUS_PROCESSADA.to_string(),
            valor_total: nfe.valor_total_declarado,
            data_emissao: nfe.data_emissao,
            fornecedor_id: supplier.id,
            importacao_id: Some(import_id),
        },
        conn,
    )?;

    let mut persisted_items: Vec<FiscalDocumentItem> = Vec::with_capacity(nfe.itens.len());
    let mut computed_total = Decimal::ZERO;

    for item in &nfe.itens {
        let product = resolve_product(item, conn)?;

        let persisted = document_ops::create_document_item(
            NewFiscalDocumentItem {
                nota_fiscal_id: document.id,
                produto_referencia_id: product.id,
                codigo_produto: item.codigo.clone(),
                ean: item.ean.clone(),
                descricao: item.descricao.clone(),
                ncm: item.ncm.clone(),
                cfop: item.cfop.clone(),
                unidade_medida: item.unidade.clone(),
                quantidade: item.quantidade,
                valor_unitario: item.valor_unitario,
                valor_total: item.valor_total,
                lote: item.lote.clone(),
                data_validade: item.data_validade,
            },
            conn,
        )?;

        stock_service::apply_item_movement(tipo_operacao, product.id, supplier.id, item, conn)?;

        computed_total += persisted.valor_total;
        persisted_items.push(persisted);
    }

    // The effective total is the item sum; the issuer's declared total is
    // kept only for divergence detection.
    let document = document_ops::update_document_total(document.id, computed_total, conn)?;

    let detected = inconsistency_service::detect_inconsistencies(
        document.id,
        nfe.data_emissao,
        nfe.valor_total_declarado,
        computed_total,
        &persisted_items,
    );
    let alertas: Vec<String> = detected.iter().map(|d| d.descricao.clone()).collect();
    inconsistency_ops::create_inconsistencies(detected, conn)?;

    Ok(PipelineOutput {
        document,
        supplier,
        itens_processados: persisted_items.len() as i32,
        alertas,
    })
}

/// Resolves the catalog entry for one invoice item.
///
/// Items with a usable EAN are matched against the catalog; items without
/// one fall back to the supplier's product code against the internal code.
/// Anything still unmatched gets a fresh entry, so resolution never fails
/// the import. The new entry is keyed by whatever a later import will look
/// it up under: an EAN-carrying product keeps its EAN as the natural key and
/// gets a generated internal code, a codeless product is catalogued under
/// the supplier's product code itself.
fn resolve_product(
    item: &NfeItem,
    conn: &mut Connection,
) -> Result<ProductReference, ServiceError> {
    let usable_ean = item
        .ean
        .as_deref()
        .map(str::trim)
        .filter(|ean| !ean.is_empty() && *ean != constants::EAN_SEM_GTIN);

    if let Some(ean) = usable_ean {
        if let Some(product) = product_ops::find_product_by_ean(ean, conn)? {
            return Ok(product);
        }
    } else if let Some(product) = product_ops::find_product_by_codigo(&item.codigo, conn)? {
        return Ok(product);
    }

    product_ops::create_product_reference(
        NewProductReference {
            codigo_interno: internal_code_for(item, usable_ean.is_some()),
            ean: usable_ean.map(str::to_string),
            nome: item.descricao.clone(),
            ncm: item.ncm.clone(),
            unidade_medida: item.unidade.clone().unwrap_or_else(|| "UN".to_string()),
            status: None,
        },
        conn,
    )
}

fn internal_code_for(item: &NfeItem, has_usable_ean: bool) -> String {
    if !has_usable_ean && !item.codigo.trim().is_empty() {
        item.codigo.clone()
    } else {
        format!("AUTO-{}-{}", Utc::now().timestamp_millis(), item.codigo)
    }
}

fn close_import_record(import_id: i32, outcome: NfeImportOutcome, pool: &Pool) {
    let result = run_query(
        QueryReader::new(move |conn| {
            import_ops::finish_import_record(import_id, outcome.clone(), conn)
        }),
        pool,
    );
    if let Err(err) = result {
        log::error!(
            "Failed to close import record {}: {}",
            import_id,
            err.message()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn empty_file_is_rejected_before_extension() {
        let err = validate_upload(&file("nota.pdf", b"")).unwrap_err();
        assert_eq!(err.message(), constants::MESSAGE_ARQUIVO_VAZIO);
    }

    #[test]
    fn non_xml_extension_is_rejected() {
        let err = validate_upload(&file("nota.txt", b"<xml/>")).unwrap_err();
        assert_eq!(err.message(), constants::MESSAGE_APENAS_XML);
    }

    #[test]
    fn xml_extension_is_case_insensitive() {
        assert!(validate_upload(&file("NOTA.XML", b"<xml/>")).is_ok());
        assert!(validate_upload(&file("nota.Xml", b"<xml/>")).is_ok());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let big = vec![b'x'; constants::MAX_NFE_FILE_SIZE + 1];
        let err = validate_upload(&file("nota.xml", &big)).unwrap_err();
        assert_eq!(err.message(), constants::MESSAGE_ARQUIVO_MUITO_GRANDE);
    }

    #[test]
    fn ean_products_get_a_generated_internal_code() {
        let item = NfeItem {
            codigo: "P001".to_string(),
            ..NfeItem::default()
        };
        let code = internal_code_for(&item, true);
        assert!(code.starts_with("AUTO-"));
        assert!(code.ends_with("-P001"));
    }

    #[test]
    fn codeless_products_are_catalogued_under_the_supplier_code() {
        // the stored internal code must equal the key a later import looks up
        let item = NfeItem {
            codigo: "P001".to_string(),
            ..NfeItem::default()
        };
        assert_eq!(internal_code_for(&item, false), item.codigo);

        let blank = NfeItem {
            codigo: "  ".to_string(),
            ..NfeItem::default()
        };
        assert!(internal_code_for(&blank, false).starts_with("AUTO-"));
    }
}
