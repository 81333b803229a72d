//! Upload endpoints of the NFe import pipeline.
//!
//! `POST /api/fiscal/importacao-nfe/xml` answers with a summary of the
//! import; the `/completo` variant returns the full result, including the
//! alert list, and accepts an `observacoes` form field that is stored on the
//! import record.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::Serialize;

use crate::{
    config::db::Pool,
    constants,
    error::{ServiceError, ServiceResult},
    services::nfe_import_service::{self, ImportAccepted, UploadedFile},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    status: &'static str,
    arquivo: String,
    tamanho: i64,
    mensagem: String,
    importacao_id: i32,
    nota_fiscal_id: i32,
    timestamp: DateTime<Utc>,
}

impl From<ImportAccepted> for ImportSummary {
    fn from(full: ImportAccepted) -> Self {
        ImportSummary {
            status: full.status,
            arquivo: full.arquivo,
            tamanho: full.tamanho,
            mensagem: full.mensagem,
            importacao_id: full.importacao_id,
            nota_fiscal_id: full.nota_fiscal_id,
            timestamp: full.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportRejected {
    status: &'static str,
    mensagem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    importacao_id: Option<i32>,
    timestamp: DateTime<Utc>,
}

impl ImportRejected {
    fn from_error(err: &ServiceError) -> Self {
        ImportRejected {
            status: constants::STATUS_ERRO,
            mensagem: err.message().to_string(),
            importacao_id: err
                .context()
                .metadata
                .get("importacao_id")
                .and_then(|raw| raw.parse().ok()),
            timestamp: Utc::now(),
        }
    }
}

/// POST api/fiscal/importacao-nfe/xml
pub async fn import_nfe_xml(
    pool: web::Data<Pool>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let (file, observacoes) = read_upload(payload).await?;
    Ok(respond(
        nfe_import_service::import_nfe(file, observacoes, pool.get_ref()),
        |accepted| HttpResponse::Ok().json(ImportSummary::from(accepted)),
    ))
}

/// POST api/fiscal/importacao-nfe/xml/completo
pub async fn import_nfe_xml_complete(
    pool: web::Data<Pool>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let (file, observacoes) = read_upload(payload).await?;
    Ok(respond(
        nfe_import_service::import_nfe(file, observacoes, pool.get_ref()),
        |accepted| HttpResponse::Ok().json(accepted),
    ))
}

fn respond<F>(result: ServiceResult<ImportAccepted>, on_success: F) -> HttpResponse
where
    F: FnOnce(ImportAccepted) -> HttpResponse,
{
    match result {
        Ok(accepted) => on_success(accepted),
        Err(err) => {
            HttpResponse::build(err.status_code()).json(ImportRejected::from_error(&err))
        }
    }
}

/// Drains the multipart stream into the uploaded file plus the optional
/// `observacoes` field.
///
/// The file is stored up to one byte past the size limit; past that point
/// chunks are drained and discarded so the size gate still fires in its
/// place in the validation order.
async fn read_upload(
    mut payload: Multipart,
) -> Result<(UploadedFile, Option<String>), ServiceError> {
    let mut file: Option<UploadedFile> = None;
    let mut observacoes: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        match field.name() {
            "file" | "arquivo" => {
                let filename = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or(constants::EMPTY)
                    .to_string();

                let mut bytes: Vec<u8> = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
                    if bytes.len() <= constants::MAX_NFE_FILE_SIZE {
                        bytes.extend_from_slice(&chunk);
                    }
                }
                bytes.truncate(constants::MAX_NFE_FILE_SIZE + 1);

                file = Some(UploadedFile { filename, bytes });
            }
            "observacoes" => {
                let mut text: Vec<u8> = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
                    text.extend_from_slice(&chunk);
                }
                let text = String::from_utf8_lossy(&text).trim().to_string();
                if !text.is_empty() {
                    observacoes = Some(text);
                }
            }
            _ => {
                // unknown fields are drained and ignored
                while field.try_next().await.map_err(multipart_error)?.is_some() {}
            }
        }
    }

    let file = file.ok_or_else(|| {
        ServiceError::bad_request(constants::MESSAGE_ARQUIVO_OBRIGATORIO.to_string())
            .with_tag("importacao")
    })?;

    Ok((file, observacoes))
}

fn multipart_error(err: actix_multipart::MultipartError) -> ServiceError {
    ServiceError::bad_request("Falha ao ler o upload".to_string())
        .with_context(|ctx| ctx.with_tag("importacao").with_detail(err.to_string()))
}
