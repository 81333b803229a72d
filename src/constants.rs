// Messages
pub const MESSAGE_OK: &str = "ok";
pub const MESSAGE_INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const MESSAGE_TOKEN_MISSING: &str = "Token is missing";
pub const MESSAGE_INVALID_TOKEN: &str = "Invalid token, please login again";

// Import pipeline messages (API contract is Portuguese, like the NFe domain)
pub const MESSAGE_ARQUIVO_OBRIGATORIO: &str = "Arquivo é obrigatório";
pub const MESSAGE_ARQUIVO_VAZIO: &str = "Arquivo XML não pode ser vazio";
pub const MESSAGE_APENAS_XML: &str = "Apenas arquivos XML são aceitos";
pub const MESSAGE_ARQUIVO_MUITO_GRANDE: &str =
    "Arquivo muito grande. Tamanho máximo permitido: 10MB";
pub const MESSAGE_XML_INVALIDO: &str = "XML da NFe inválido";
pub const MESSAGE_EMITENTE_OBRIGATORIO: &str = "Dados do emitente são obrigatórios";
pub const MESSAGE_CHAVE_ACESSO_INVALIDA: &str = "Chave de acesso inválida";
pub const MESSAGE_NFE_DUPLICADA: &str = "NFe já importada";
pub const MESSAGE_ESTOQUE_INSUFICIENTE: &str = "Estoque insuficiente";
pub const MESSAGE_TIPO_AJUSTE_INVALIDO: &str = "Tipo de ajuste inválido. Esperado: ENTRADA ou SAIDA";

// Import result statuses
pub const STATUS_SUCESSO: &str = "SUCESSO";
pub const STATUS_ERRO: &str = "ERRO";

// Upload limits
pub const MAX_NFE_FILE_SIZE: usize = 10 * 1024 * 1024;

// EAN sentinel used by issuers for products without a GTIN
pub const EAN_SEM_GTIN: &str = "SEM GTIN";

// Headers
pub const AUTHORIZATION: &str = "Authorization";

// Misc
pub const EMPTY: &str = "";

// Routes the authentication middleware lets through
pub const IGNORE_ROUTES: [&str; 1] = ["/health"];
