//! Streaming parser for NFe XML (modelo 55, layout 4.00).
//!
//! Walks the document once with `quick_xml`, tracking the element path, and
//! collects only the fields the import pipeline consumes. Namespace prefixes
//! and unknown elements are ignored.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use rust_decimal::Decimal;

use crate::{
    constants,
    error::{ServiceError, ServiceResult},
    models::fiscal_document::{OPERACAO_COMPRA, OPERACAO_VENDA},
};

/// Issuer block (`emit`) of the invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NfeEmitente {
    pub cnpj: String,
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub endereco: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
}

/// One `det/prod` line of the invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NfeItem {
    pub codigo: String,
    pub ean: Option<String>,
    pub descricao: String,
    pub ncm: Option<String>,
    pub cfop: Option<String>,
    pub unidade: Option<String>,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub lote: Option<String>,
    pub data_validade: Option<NaiveDate>,
}

/// Everything the pipeline needs from one NFe document.
#[derive(Debug, Clone, Default)]
pub struct NfeData {
    pub chave_acesso: String,
    pub numero: String,
    pub serie: Option<String>,
    pub data_emissao: Option<DateTime<Utc>>,
    /// `total/ICMSTot/vNF` as declared by the issuer. The pipeline recomputes
    /// the effective total from the items and only uses this for divergence
    /// detection.
    pub valor_total_declarado: Decimal,
    pub emitente: Option<NfeEmitente>,
    pub itens: Vec<NfeItem>,
}

impl NfeData {
    /// Operation type derived from the first item's CFOP.
    ///
    /// CFOPs starting with 5, 6 or 7 are outbound operations (sale); the
    /// 1xxx/2xxx/3xxx groups are inbound (purchase). A document with no CFOP
    /// at all defaults to purchase, which is the common case for invoices
    /// received from suppliers.
    pub fn tipo_operacao(&self) -> &'static str {
        let first_digit = self
            .itens
            .iter()
            .filter_map(|item| item.cfop.as_deref())
            .filter_map(|cfop| cfop.chars().next())
            .next();
        match first_digit {
            Some('5') | Some('6') | Some('7') => OPERACAO_VENDA,
            _ => OPERACAO_COMPRA,
        }
    }
}

#[derive(Default)]
struct NfeParsed {
    chave_acesso: Option<String>,
    numero: Option<String>,
    serie: Option<String>,
    data_emissao_raw: Option<String>,
    valor_total_declarado: Option<String>,
    emitente: Option<NfeEmitente>,
    itens: Vec<NfeItem>,
    current_item: Option<NfeItem>,
    ender_logradouro: Option<String>,
    ender_numero: Option<String>,
    ender_municipio: Option<String>,
    ender_uf: Option<String>,
}

/// Parses one NFe XML document.
///
/// Returns `ServiceError::BadRequest` on malformed XML or unparseable
/// numeric fields. Structural requirements (access key length, mandatory
/// issuer) are checked separately by [`validate_structure`].
pub fn parse_nfe_xml(xml: &str) -> ServiceResult<NfeData> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = NfeParsed::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());

                if name == "infNFe" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"Id" {
                            let raw = String::from_utf8_lossy(&attr.value).to_string();
                            p.chave_acesso =
                                Some(raw.strip_prefix("NFe").unwrap_or(&raw).to_string());
                        }
                    }
                }

                if name == "det" {
                    p.current_item = Some(NfeItem::default());
                }

                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if !text.is_empty() {
                    p.handle_text(&path, &text)?;
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                if ended == "det" {
                    if let Some(item) = p.current_item.take() {
                        p.itens.push(item);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ServiceError::bad_request(
                    constants::MESSAGE_XML_INVALIDO.to_string(),
                )
                .with_context(|ctx| ctx.with_tag("nfe_parser").with_detail(e.to_string())));
            }
            _ => {}
        }
    }

    p.into_nfe_data()
}

static CHAVE_ACESSO_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{44}$").unwrap());

/// Checks the structural requirements an NFe must meet before the pipeline
/// touches the database.
pub fn validate_structure(nfe: &NfeData) -> ServiceResult<()> {
    if !CHAVE_ACESSO_REGEX.is_match(&nfe.chave_acesso) {
        return Err(ServiceError::bad_request(
            constants::MESSAGE_CHAVE_ACESSO_INVALIDA.to_string(),
        )
        .with_context(|ctx| {
            ctx.with_tag("nfe_parser")
                .with_metadata("chave_acesso", nfe.chave_acesso.clone())
        }));
    }

    match &nfe.emitente {
        Some(emitente) if !emitente.cnpj.trim().is_empty() => Ok(()),
        _ => Err(ServiceError::bad_request(
            constants::MESSAGE_EMITENTE_OBRIGATORIO.to_string(),
        )
        .with_context(|ctx| ctx.with_tag("nfe_parser"))),
    }
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.to_string(),
    }
}

fn parse_decimal(field: &str, value: &str) -> ServiceResult<Decimal> {
    value.trim().parse::<Decimal>().map_err(|e| {
        ServiceError::bad_request(constants::MESSAGE_XML_INVALIDO.to_string()).with_context(|ctx| {
            ctx.with_tag("nfe_parser")
                .with_metadata("campo", field.to_string())
                .with_detail(e.to_string())
        })
    })
}

impl NfeParsed {
    fn handle_text(&mut self, path: &[String], text: &str) -> ServiceResult<()> {
        let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
        let in_ide = path.iter().any(|p| p == "ide");
        let in_emit = path.iter().any(|p| p == "emit");
        let in_ender_emit = path.iter().any(|p| p == "enderEmit");
        let in_prod = path.iter().any(|p| p == "prod");
        let in_rastro = path.iter().any(|p| p == "rastro");
        let in_icms_tot = path.iter().any(|p| p == "ICMSTot");

        if in_ide {
            match leaf {
                "nNF" => self.numero = Some(text.to_string()),
                "serie" => self.serie = Some(text.to_string()),
                "dhEmi" => self.data_emissao_raw = Some(text.to_string()),
                _ => {}
            }
            return Ok(());
        }

        if in_emit {
            let emitente = self.emitente.get_or_insert_with(NfeEmitente::default);
            if in_ender_emit {
                match leaf {
                    "xLgr" => self.ender_logradouro = Some(text.to_string()),
                    "nro" => self.ender_numero = Some(text.to_string()),
                    "xMun" => self.ender_municipio = Some(text.to_string()),
                    "UF" => self.ender_uf = Some(text.to_string()),
                    "fone" => emitente.telefone = Some(text.to_string()),
                    _ => {}
                }
            } else {
                match leaf {
                    "CNPJ" => emitente.cnpj = text.to_string(),
                    "xNome" => emitente.razao_social = text.to_string(),
                    "xFant" => emitente.nome_fantasia = Some(text.to_string()),
                    "IE" => emitente.inscricao_estadual = Some(text.to_string()),
                    "email" => emitente.email = Some(text.to_string()),
                    _ => {}
                }
            }
            return Ok(());
        }

        if in_prod {
            if let Some(item) = self.current_item.as_mut() {
                if in_rastro {
                    match leaf {
                        "nLote" => item.lote = Some(text.to_string()),
                        "dVal" => {
                            item.data_validade =
                                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
                        }
                        _ => {}
                    }
                } else {
                    match leaf {
                        "cProd" => item.codigo = text.to_string(),
                        "cEAN" => item.ean = Some(text.to_string()),
                        "xProd" => item.descricao = text.to_string(),
                        "NCM" => item.ncm = Some(text.to_string()),
                        "CFOP" => item.cfop = Some(text.to_string()),
                        "uCom" => item.unidade = Some(text.to_string()),
                        "qCom" => item.quantidade = parse_decimal("qCom", text)?,
                        "vUnCom" => item.valor_unitario = parse_decimal("vUnCom", text)?,
                        "vProd" => item.valor_total = parse_decimal("vProd", text)?,
                        _ => {}
                    }
                }
            }
            return Ok(());
        }

        if in_icms_tot && leaf == "vNF" {
            self.valor_total_declarado = Some(text.to_string());
        }

        Ok(())
    }

    fn into_nfe_data(mut self) -> ServiceResult<NfeData> {
        let chave_acesso = self.chave_acesso.take().ok_or_else(|| {
            ServiceError::bad_request(constants::MESSAGE_XML_INVALIDO.to_string())
                .with_context(|ctx| ctx.with_tag("nfe_parser").with_detail("infNFe sem atributo Id"))
        })?;

        if let Some(emitente) = self.emitente.as_mut() {
            emitente.endereco = match (&self.ender_logradouro, &self.ender_municipio) {
                (Some(logradouro), Some(municipio)) => {
                    let numero = self.ender_numero.as_deref().unwrap_or("S/N");
                    let uf = self.ender_uf.as_deref().unwrap_or("");
                    Some(format!("{}, {} - {}/{}", logradouro, numero, municipio, uf))
                }
                _ => None,
            };
        }

        let valor_total_declarado = match self.valor_total_declarado {
            Some(raw) => parse_decimal("vNF", &raw)?,
            None => Decimal::ZERO,
        };

        let data_emissao = self
            .data_emissao_raw
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(NfeData {
            chave_acesso,
            numero: self.numero.unwrap_or_default(),
            serie: self.serie,
            data_emissao,
            valor_total_declarado,
            emitente: self.emitente,
            itens: self.itens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PURCHASE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe">
  <NFe>
    <infNFe Id="NFe35170811222333000144550010000001231000001234" versao="4.00">
      <ide>
        <nNF>123</nNF>
        <serie>1</serie>
        <dhEmi>2026-08-20T10:00:00-03:00</dhEmi>
      </ide>
      <emit>
        <CNPJ>11222333000144</CNPJ>
        <xNome>Distribuidora Farma Ltda</xNome>
        <xFant>FarmaDist</xFant>
        <IE>123456789</IE>
        <enderEmit>
          <xLgr>Rua das Flores</xLgr>
          <nro>100</nro>
          <xMun>Sao Paulo</xMun>
          <UF>SP</UF>
          <fone>1133334444</fone>
        </enderEmit>
      </emit>
      <det nItem="1">
        <prod>
          <cProd>P001</cProd>
          <cEAN>7891234567890</cEAN>
          <xProd>Dipirona 500mg</xProd>
          <NCM>30049099</NCM>
          <CFOP>1102</CFOP>
          <uCom>CX</uCom>
          <qCom>50.0000</qCom>
          <vUnCom>10.00</vUnCom>
          <vProd>500.00</vProd>
          <rastro>
            <nLote>L2026A</nLote>
            <dVal>2027-08-20</dVal>
          </rastro>
        </prod>
      </det>
      <det nItem="2">
        <prod>
          <cProd>P002</cProd>
          <cEAN>7891234567891</cEAN>
          <xProd>Paracetamol 750mg</xProd>
          <NCM>30049099</NCM>
          <CFOP>1102</CFOP>
          <uCom>CX</uCom>
          <qCom>30.0000</qCom>
          <vUnCom>8.50</vUnCom>
          <vProd>255.00</vProd>
          <rastro>
            <nLote>L2026B</nLote>
            <dVal>2027-06-15</dVal>
          </rastro>
        </prod>
      </det>
      <total>
        <ICMSTot>
          <vNF>755.00</vNF>
        </ICMSTot>
      </total>
    </infNFe>
  </NFe>
</nfeProc>"#;

    #[test]
    fn parses_purchase_nfe() {
        let nfe = parse_nfe_xml(PURCHASE_XML).unwrap();

        assert_eq!(
            nfe.chave_acesso,
            "35170811222333000144550010000001231000001234"
        );
        assert_eq!(nfe.numero, "123");
        assert_eq!(nfe.serie.as_deref(), Some("1"));
        assert_eq!(nfe.valor_total_declarado, dec!(755.00));
        assert_eq!(nfe.tipo_operacao(), OPERACAO_COMPRA);
        assert!(nfe.data_emissao.is_some());

        let emitente = nfe.emitente.as_ref().unwrap();
        assert_eq!(emitente.cnpj, "11222333000144");
        assert_eq!(emitente.razao_social, "Distribuidora Farma Ltda");
        assert_eq!(
            emitente.endereco.as_deref(),
            Some("Rua das Flores, 100 - Sao Paulo/SP")
        );

        assert_eq!(nfe.itens.len(), 2);
        let first = &nfe.itens[0];
        assert_eq!(first.codigo, "P001");
        assert_eq!(first.ean.as_deref(), Some("7891234567890"));
        assert_eq!(first.quantidade, dec!(50.0000));
        assert_eq!(first.valor_unitario, dec!(10.00));
        assert_eq!(first.lote.as_deref(), Some("L2026A"));
        assert_eq!(
            first.data_validade,
            NaiveDate::from_ymd_opt(2027, 8, 20)
        );
        assert!(validate_structure(&nfe).is_ok());
    }

    #[test]
    fn cfop_5xxx_is_a_sale() {
        let xml = PURCHASE_XML.replace("<CFOP>1102</CFOP>", "<CFOP>5102</CFOP>");
        let nfe = parse_nfe_xml(&xml).unwrap();
        assert_eq!(nfe.tipo_operacao(), OPERACAO_VENDA);
    }

    #[test]
    fn missing_issuer_fails_structural_validation() {
        let start = PURCHASE_XML.find("<emit>").unwrap();
        let end = PURCHASE_XML.find("</emit>").unwrap() + "</emit>".len();
        let xml = format!("{}{}", &PURCHASE_XML[..start], &PURCHASE_XML[end..]);

        let nfe = parse_nfe_xml(&xml).unwrap();
        let err = validate_structure(&nfe).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest { .. }));
        assert_eq!(err.message(), crate::constants::MESSAGE_EMITENTE_OBRIGATORIO);
    }

    #[test]
    fn short_access_key_fails_structural_validation() {
        let xml = PURCHASE_XML.replace(
            "NFe35170811222333000144550010000001231000001234",
            "NFe12345",
        );
        let nfe = parse_nfe_xml(&xml).unwrap();
        let err = validate_structure(&nfe).unwrap_err();
        assert_eq!(
            err.message(),
            crate::constants::MESSAGE_CHAVE_ACESSO_INVALIDA
        );
    }

    #[test]
    fn malformed_xml_is_a_bad_request() {
        let err = parse_nfe_xml("<nfeProc><NFe><infNFe").unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest { .. }));
    }

    #[test]
    fn nfe_prefix_is_stripped_from_access_key() {
        let nfe = parse_nfe_xml(PURCHASE_XML).unwrap();
        assert!(!nfe.chave_acesso.starts_with("NFe"));
        assert_eq!(nfe.chave_acesso.len(), 44);
    }
}
