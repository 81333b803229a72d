//! Detection of fiscal inconsistencies on imported documents.
//!
//! Detection is advisory. It runs after the document and its items are
//! persisted and never fails the import that raised it.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    config::db::Pool,
    constants,
    error::ServiceResult,
    models::{
        fiscal_document::FiscalDocumentItem,
        inconsistency::{
            operations, Inconsistency, NewInconsistency, SEVERIDADE_ALTA, SEVERIDADE_BAIXA,
            SEVERIDADE_MEDIA,
        },
    },
    services::functional_patterns::{run_query, QueryReader},
};

pub const TIPO_NCM_INVALIDO: &str = "NCM_INVALIDO";
pub const TIPO_CFOP_INVALIDO: &str = "CFOP_INVALIDO";
pub const TIPO_EAN_INVALIDO: &str = "EAN_INVALIDO";
pub const TIPO_DIVERGENCIA_VALOR: &str = "DIVERGENCIA_VALOR";
pub const TIPO_NOTA_ANTIGA: &str = "NOTA_ANTIGA";
pub const TIPO_DATA_FUTURA: &str = "DATA_FUTURA";
pub const TIPO_LOTE_OBRIGATORIO: &str = "LOTE_OBRIGATORIO";
pub const TIPO_VALIDADE_CURTA: &str = "VALIDADE_CURTA";
pub const TIPO_QUANTIDADE_INVALIDA: &str = "QUANTIDADE_INVALIDA";
pub const TIPO_VALOR_INVALIDO: &str = "VALOR_INVALIDO";

// Issuer-declared total may differ from the item sum by rounding only.
const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

const MAX_EMISSION_AGE_DAYS: i64 = 30;
const MIN_SHELF_LIFE_DAYS: i64 = 180;

/// NCM chapter 30 is pharmaceutical products; those items carry extra
/// traceability requirements.
const NCM_CAPITULO_FARMACO: &str = "30";

/// Lists inconsistencies, optionally restricted to one fiscal document.
pub fn list_inconsistencies(
    document_id: Option<i32>,
    pool: &Pool,
) -> ServiceResult<Vec<Inconsistency>> {
    run_query(
        QueryReader::new(move |conn| operations::list_inconsistencies(document_id, conn)),
        pool,
    )
}

/// Runs every detection rule against a freshly imported document.
pub fn detect_inconsistencies(
    document_id: i32,
    data_emissao: Option<DateTime<Utc>>,
    declared_total: Decimal,
    computed_total: Decimal,
    items: &[FiscalDocumentItem],
) -> Vec<NewInconsistency> {
    let mut found = Vec::new();

    for item in items {
        found.extend(detect_item_inconsistencies(document_id, item));
    }

    if (declared_total - computed_total).abs() > TOTAL_TOLERANCE {
        found.push(NewInconsistency::new(
            document_id,
            None,
            TIPO_DIVERGENCIA_VALOR,
            format!(
                "Valor total declarado ({}) diverge da soma dos itens ({})",
                declared_total, computed_total
            ),
            SEVERIDADE_ALTA,
        ));
    }

    if let Some(emissao) = data_emissao {
        let now = Utc::now();
        if emissao > now {
            found.push(NewInconsistency::new(
                document_id,
                None,
                TIPO_DATA_FUTURA,
                format!("Data de emissão no futuro: {}", emissao.to_rfc3339()),
                SEVERIDADE_MEDIA,
            ));
        } else if now - emissao > Duration::days(MAX_EMISSION_AGE_DAYS) {
            found.push(NewInconsistency::new(
                document_id,
                None,
                TIPO_NOTA_ANTIGA,
                format!(
                    "Nota emitida há mais de {} dias: {}",
                    MAX_EMISSION_AGE_DAYS,
                    emissao.to_rfc3339()
                ),
                SEVERIDADE_BAIXA,
            ));
        }
    }

    found
}

fn detect_item_inconsistencies(
    document_id: i32,
    item: &FiscalDocumentItem,
) -> Vec<NewInconsistency> {
    let mut found = Vec::new();
    let item_ref = Some(item.id);

    if let Some(ncm) = item.ncm.as_deref() {
        if !is_all_digits(ncm, 8) {
            found.push(NewInconsistency::new(
                document_id,
                item_ref,
                TIPO_NCM_INVALIDO,
                format!("NCM inválido para o item {}: {}", item.codigo_produto, ncm),
                SEVERIDADE_MEDIA,
            ));
        }
    }

    if let Some(cfop) = item.cfop.as_deref() {
        if !is_all_digits(cfop, 4) {
            found.push(NewInconsistency::new(
                document_id,
                item_ref,
                TIPO_CFOP_INVALIDO,
                format!("CFOP inválido para o item {}: {}", item.codigo_produto, cfop),
                SEVERIDADE_MEDIA,
            ));
        }
    }

    if let Some(ean) = item.ean.as_deref() {
        if ean != constants::EAN_SEM_GTIN && !is_valid_ean13(ean) {
            found.push(NewInconsistency::new(
                document_id,
                item_ref,
                TIPO_EAN_INVALIDO,
                format!("EAN inválido para o item {}: {}", item.codigo_produto, ean),
                SEVERIDADE_MEDIA,
            ));
        }
    }

    if item.quantidade <= Decimal::ZERO {
        found.push(NewInconsistency::new(
            document_id,
            item_ref,
            TIPO_QUANTIDADE_INVALIDA,
            format!(
                "Quantidade não positiva para o item {}: {}",
                item.codigo_produto, item.quantidade
            ),
            SEVERIDADE_MEDIA,
        ));
    }

    if item.valor_unitario <= Decimal::ZERO {
        found.push(NewInconsistency::new(
            document_id,
            item_ref,
            TIPO_VALOR_INVALIDO,
            format!(
                "Valor unitário não positivo para o item {}: {}",
                item.codigo_produto, item.valor_unitario
            ),
            SEVERIDADE_MEDIA,
        ));
    }

    let is_pharma = item
        .ncm
        .as_deref()
        .map(|ncm| ncm.starts_with(NCM_CAPITULO_FARMACO))
        .unwrap_or(false);

    if is_pharma {
        if item.lote.as_deref().map(str::trim).unwrap_or("").is_empty() {
            found.push(NewInconsistency::new(
                document_id,
                item_ref,
                TIPO_LOTE_OBRIGATORIO,
                format!(
                    "Item farmacêutico sem lote informado: {}",
                    item.codigo_produto
                ),
                SEVERIDADE_ALTA,
            ));
        }

        if let Some(validade) = item.data_validade {
            let limit = Utc::now().date_naive() + Duration::days(MIN_SHELF_LIFE_DAYS);
            if validade < limit {
                found.push(NewInconsistency::new(
                    document_id,
                    item_ref,
                    TIPO_VALIDADE_CURTA,
                    format!(
                        "Validade inferior a {} dias para o item {}: {}",
                        MIN_SHELF_LIFE_DAYS, item.codigo_produto, validade
                    ),
                    SEVERIDADE_MEDIA,
                ));
            }
        }
    }

    found
}

fn is_all_digits(value: &str, expected_len: usize) -> bool {
    value.len() == expected_len && value.chars().all(|c| c.is_ascii_digit())
}

/// EAN-13 checksum: digits in odd positions weigh 1, even positions weigh 3,
/// and the 13th digit must complete the sum to a multiple of ten.
pub fn is_valid_ean13(ean: &str) -> bool {
    if ean.len() != 13 || !ean.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = ean.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { *d * 3 })
        .sum();
    let check = (10 - (sum % 10)) % 10;
    check == digits[12]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(codigo: &str) -> FiscalDocumentItem {
        FiscalDocumentItem {
            id: 1,
            nota_fiscal_id: 1,
            produto_referencia_id: 1,
            codigo_produto: codigo.to_string(),
            ean: Some("7891234567895".to_string()),
            descricao: "Dipirona 500mg".to_string(),
            ncm: Some("30049099".to_string()),
            cfop: Some("1102".to_string()),
            unidade_medida: Some("CX".to_string()),
            quantidade: dec!(10),
            valor_unitario: dec!(5),
            valor_total: dec!(50),
            lote: Some("L2026A".to_string()),
            data_validade: Some(Utc::now().date_naive() + Duration::days(365)),
        }
    }

    #[test]
    fn ean13_check_digit() {
        assert!(is_valid_ean13("7891234567895"));
        assert!(!is_valid_ean13("7891234567890"));
        assert!(!is_valid_ean13("789123456789"));
        assert!(!is_valid_ean13("78912345678AB"));
    }

    #[test]
    fn clean_item_raises_nothing() {
        let found = detect_inconsistencies(1, Some(Utc::now()), dec!(50), dec!(50), &[item("P1")]);
        assert!(found.is_empty());
    }

    #[test]
    fn detects_bad_ncm_and_cfop() {
        let mut bad = item("P1");
        bad.ncm = Some("3004".to_string());
        bad.cfop = Some("11".to_string());
        let found = detect_inconsistencies(1, None, dec!(50), dec!(50), &[bad]);
        let tipos: Vec<&str> = found.iter().map(|f| f.tipo.as_str()).collect();
        assert!(tipos.contains(&TIPO_NCM_INVALIDO));
        assert!(tipos.contains(&TIPO_CFOP_INVALIDO));
    }

    #[test]
    fn detects_total_divergence_beyond_tolerance() {
        let found = detect_inconsistencies(1, None, dec!(50.02), dec!(50), &[item("P1")]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tipo, TIPO_DIVERGENCIA_VALOR);
        assert_eq!(found[0].severidade, SEVERIDADE_ALTA);

        let within = detect_inconsistencies(1, None, dec!(50.01), dec!(50), &[item("P1")]);
        assert!(within.is_empty());
    }

    #[test]
    fn detects_old_and_future_emission_dates() {
        let old = detect_inconsistencies(
            1,
            Some(Utc::now() - Duration::days(31)),
            dec!(50),
            dec!(50),
            &[item("P1")],
        );
        assert_eq!(old[0].tipo, TIPO_NOTA_ANTIGA);

        let future = detect_inconsistencies(
            1,
            Some(Utc::now() + Duration::days(2)),
            dec!(50),
            dec!(50),
            &[item("P1")],
        );
        assert_eq!(future[0].tipo, TIPO_DATA_FUTURA);
    }

    #[test]
    fn pharma_item_requires_lote_and_shelf_life() {
        let mut no_lote = item("P1");
        no_lote.lote = None;
        no_lote.data_validade = Some(Utc::now().date_naive() + Duration::days(30));
        let found = detect_inconsistencies(1, None, dec!(50), dec!(50), &[no_lote]);
        let tipos: Vec<&str> = found.iter().map(|f| f.tipo.as_str()).collect();
        assert!(tipos.contains(&TIPO_LOTE_OBRIGATORIO));
        assert!(tipos.contains(&TIPO_VALIDADE_CURTA));
    }

    #[test]
    fn detects_non_positive_quantity_and_value() {
        let mut bad = item("P1");
        bad.quantidade = dec!(0);
        bad.valor_unitario = dec!(-1);
        let found = detect_inconsistencies(1, None, dec!(50), dec!(50), &[bad]);
        let tipos: Vec<&str> = found.iter().map(|f| f.tipo.as_str()).collect();
        assert!(tipos.contains(&TIPO_QUANTIDADE_INVALIDA));
        assert!(tipos.contains(&TIPO_VALOR_INVALIDO));
    }

    #[test]
    fn sem_gtin_is_not_an_invalid_ean() {
        let mut sem_gtin = item("P1");
        sem_gtin.ean = Some(constants::EAN_SEM_GTIN.to_string());
        let found = detect_inconsistencies(1, None, dec!(50), dec!(50), &[sem_gtin]);
        assert!(found.is_empty());
    }
}
