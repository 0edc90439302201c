use actix_identity::Identity;
use serde::Serialize;

use crate::{db, errors::AppError, models::Papel, AppState};

/// Explicit session context built per request from the cookie identity.
/// Handlers receive this instead of reaching into any global login state.
#[derive(Debug, Clone, Serialize)]
pub struct Sessao {
    pub id: i64,
    pub nome: String,
    pub papel: Papel,
}

/// Resolves the cookie identity to a fresh database row. A stale or garbled
/// identity yields `None`, which pages treat as not logged in.
pub async fn current_user(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Option<Sessao>, AppError> {
    let Some(identity) = identity else {
        return Ok(None);
    };
    let id = match identity.id()?.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };
    let morador = db::get_morador(state, id).await?;
    Ok(morador.map(|m| Sessao {
        id: m.id,
        nome: m.nome,
        papel: m.papel,
    }))
}

/// The single authorization gate for admin-only operations.
pub fn require_sindico(sessao: &Sessao) -> Result<(), AppError> {
    if sessao.papel == Papel::Sindico {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sindico_passes_the_gate() {
        let sessao = Sessao {
            id: 1,
            nome: "Gru".into(),
            papel: Papel::Sindico,
        };
        assert!(require_sindico(&sessao).is_ok());
    }

    #[test]
    fn morador_is_denied() {
        let sessao = Sessao {
            id: 2,
            nome: "Ana".into(),
            papel: Papel::Morador,
        };
        assert!(matches!(
            require_sindico(&sessao).unwrap_err(),
            AppError::AccessDenied
        ));
    }
}
