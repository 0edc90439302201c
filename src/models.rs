use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role stored on `morador.papel` as TEXT.
#[derive(sqlx::Type, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Papel {
    Sindico,
    Morador,
}

/// TEXT-backed yes/no flag used by `despesa.pago` and `notificacao.lida`.
#[derive(sqlx::Type, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SimNao {
    Sim,
    Nao,
}

impl SimNao {
    pub fn as_str(self) -> &'static str {
        match self {
            SimNao::Sim => "SIM",
            SimNao::Nao => "NAO",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Apartamento {
    pub id: i64,
    pub numero: String,
    pub bloco: Option<String>,
    pub andar: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Morador {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub profissao: Option<String>,
    #[serde(skip_serializing)]
    pub senha_hash: String,
    pub papel: Papel,
    pub apartamento_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Despesa {
    pub id: i64,
    pub descricao: String,
    pub valor_centavos: i64,
    pub vencimento: String,
    pub pago: SimNao,
    pub apartamento_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Pagamento {
    pub id: i64,
    pub despesa_id: i64,
    pub morador_id: i64,
    pub valor_pago_centavos: i64,
    pub pago_em: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Notificacao {
    pub id: i64,
    pub morador_id: i64,
    pub titulo: String,
    pub mensagem: String,
    pub criada_em: String,
    pub lida: SimNao,
}

/// Listing row for the apartments page; blank strings instead of NULLs so the
/// templates never see a null, plus the `numero-bloco` label used by selects.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct ApartamentoLinha {
    pub id: i64,
    pub numero: String,
    pub bloco: String,
    pub andar: String,
    pub rotulo: String,
}

/// Listing row for the residents page with the joined apartment label.
/// `apartamento_id` is 0 when unassigned so template comparisons stay typed.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct MoradorLinha {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub profissao: String,
    pub papel: Papel,
    pub apartamento_id: i64,
    pub apartamento: String,
}

/// Listing row for the expenses page and both report formats.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct DespesaLinha {
    pub id: i64,
    pub descricao: String,
    pub valor_centavos: i64,
    pub valor: String,
    pub vencimento: String,
    pub pago: SimNao,
    pub apartamento_id: i64,
    pub apartamento: String,
}

/// Admin history row: every notification joined with the recipient's name.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct NotificacaoLinha {
    pub id: i64,
    pub morador: String,
    pub titulo: String,
    pub mensagem: String,
    pub criada_em: String,
    pub lida: SimNao,
}

/// Fields accepted when creating a new resident. The plaintext password is
/// hashed before anything touches the database.
#[derive(Debug, Clone)]
pub struct NovoMorador {
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub profissao: Option<String>,
    pub senha: String,
    pub papel: Papel,
    pub apartamento_id: Option<i64>,
}

/// Editable resident fields; the password is not updatable through this path.
#[derive(Debug, Clone)]
pub struct MoradorAtualizado {
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub profissao: Option<String>,
    pub papel: Papel,
    pub apartamento_id: Option<i64>,
}
