use crate::{
    errors::AppError,
    models::{
        Apartamento, ApartamentoLinha, Despesa, DespesaLinha, Morador, MoradorAtualizado,
        MoradorLinha, Notificacao, NotificacaoLinha, NovoMorador, Pagamento,
    },
    utils, AppState,
};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn now_utc() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// Apartamentos

pub async fn list_apartamentos(state: &AppState) -> Result<Vec<ApartamentoLinha>, AppError> {
    let pool = state.db_pool.clone();
    let linhas = sqlx::query_as::<_, ApartamentoLinha>(
        r#"
        SELECT id,
               numero,
               COALESCE(bloco, '') AS bloco,
               COALESCE(CAST(andar AS TEXT), '') AS andar,
               numero || '-' || COALESCE(bloco, '') AS rotulo
        FROM apartamento
        ORDER BY numero, bloco
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(linhas)
}

pub async fn create_apartamento(
    state: &AppState,
    numero: String,
    bloco: Option<String>,
    andar: Option<i64>,
) -> Result<Apartamento, AppError> {
    if numero.trim().is_empty() {
        return Err(AppError::Validation("Informe o número.".into()));
    }
    let pool = state.db_pool.clone();
    let apartamento = sqlx::query_as::<_, Apartamento>(
        "INSERT INTO apartamento (numero, bloco, andar) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(numero)
    .bind(bloco)
    .bind(andar)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Uniqueness("Número + Bloco deve ser único".into())
        } else {
            AppError::Database(e)
        }
    })?;
    log::info!("Apartamento created: {:?}", apartamento);
    Ok(apartamento)
}

pub async fn update_apartamento(
    state: &AppState,
    id: i64,
    numero: String,
    bloco: Option<String>,
    andar: Option<i64>,
) -> Result<Apartamento, AppError> {
    let pool = state.db_pool.clone();
    let apartamento = sqlx::query_as::<_, Apartamento>(
        "UPDATE apartamento SET numero = $1, bloco = $2, andar = $3 WHERE id = $4 RETURNING *",
    )
    .bind(numero)
    .bind(bloco)
    .bind(andar)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Uniqueness("Número + Bloco deve ser único".into())
        } else {
            AppError::Database(e)
        }
    })?
    .ok_or(AppError::NotFound)?;
    Ok(apartamento)
}

/// Cascades to the apartment's moradores and despesas, and through them to
/// pagamentos and notificacoes. Enforced by the store (foreign_keys = ON).
pub async fn delete_apartamento(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    sqlx::query("DELETE FROM apartamento WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    log::info!("Apartamento with id {} deleted", id);
    Ok(())
}

// Moradores

pub async fn list_moradores(state: &AppState) -> Result<Vec<MoradorLinha>, AppError> {
    let pool = state.db_pool.clone();
    let linhas = sqlx::query_as::<_, MoradorLinha>(
        r#"
        SELECT m.id,
               m.nome,
               m.email,
               COALESCE(m.telefone, '') AS telefone,
               COALESCE(m.profissao, '') AS profissao,
               m.papel,
               COALESCE(m.apartamento_id, 0) AS apartamento_id,
               CASE WHEN a.id IS NULL THEN '-'
                    ELSE a.numero || '-' || COALESCE(a.bloco, '')
               END AS apartamento
        FROM morador m
        LEFT JOIN apartamento a ON a.id = m.apartamento_id
        ORDER BY m.id
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(linhas)
}

pub async fn get_morador(state: &AppState, id: i64) -> Result<Option<Morador>, AppError> {
    let pool = state.db_pool.clone();
    let morador = sqlx::query_as::<_, Morador>("SELECT * FROM morador WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(morador)
}

pub async fn find_morador_by_email(
    state: &AppState,
    email: &str,
) -> Result<Option<Morador>, AppError> {
    let pool = state.db_pool.clone();
    let morador = sqlx::query_as::<_, Morador>("SELECT * FROM morador WHERE email = $1")
        .bind(email)
        .fetch_optional(&pool)
        .await?;
    Ok(morador)
}

pub async fn create_morador(state: &AppState, novo: NovoMorador) -> Result<Morador, AppError> {
    if novo.nome.trim().is_empty() || novo.email.trim().is_empty() || novo.senha.is_empty() {
        return Err(AppError::Validation("Preencha nome, e-mail e senha.".into()));
    }
    let senha_hash = utils::hash_password(&novo.senha)?;
    let pool = state.db_pool.clone();
    let morador = sqlx::query_as::<_, Morador>(
        r#"
        INSERT INTO morador (nome, email, telefone, profissao, senha_hash, papel, apartamento_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(novo.nome)
    .bind(novo.email)
    .bind(novo.telefone)
    .bind(novo.profissao)
    .bind(senha_hash)
    .bind(novo.papel)
    .bind(novo.apartamento_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Uniqueness("E-mail já existente.".into())
        } else {
            AppError::Database(e)
        }
    })?;
    log::info!("Morador created: id={} email={}", morador.id, morador.email);
    Ok(morador)
}

/// Edits everything except the password; the stored hash is left untouched.
pub async fn update_morador(
    state: &AppState,
    id: i64,
    campos: MoradorAtualizado,
) -> Result<Morador, AppError> {
    let pool = state.db_pool.clone();
    let morador = sqlx::query_as::<_, Morador>(
        r#"
        UPDATE morador
        SET nome = $1, email = $2, telefone = $3, profissao = $4, papel = $5, apartamento_id = $6
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(campos.nome)
    .bind(campos.email)
    .bind(campos.telefone)
    .bind(campos.profissao)
    .bind(campos.papel)
    .bind(campos.apartamento_id)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Uniqueness("E-mail já existente para outro morador.".into())
        } else {
            AppError::Database(e)
        }
    })?
    .ok_or(AppError::NotFound)?;
    Ok(morador)
}

/// Cascades to the resident's notificacoes and pagamentos.
pub async fn delete_morador(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    sqlx::query("DELETE FROM morador WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    log::info!("Morador with id {} deleted", id);
    Ok(())
}

// Despesas

pub async fn list_despesas(state: &AppState) -> Result<Vec<DespesaLinha>, AppError> {
    let pool = state.db_pool.clone();
    let linhas = sqlx::query_as::<_, DespesaLinha>(
        r#"
        SELECT d.id,
               d.descricao,
               d.valor_centavos,
               printf('%.2f', d.valor_centavos / 100.0) AS valor,
               d.vencimento,
               d.pago,
               COALESCE(d.apartamento_id, 0) AS apartamento_id,
               CASE WHEN a.id IS NULL THEN '-'
                    ELSE a.numero || '-' || COALESCE(a.bloco, '')
               END AS apartamento
        FROM despesa d
        LEFT JOIN apartamento a ON a.id = d.apartamento_id
        ORDER BY d.id
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(linhas)
}

pub async fn create_despesa(
    state: &AppState,
    descricao: String,
    valor_centavos: i64,
    vencimento: String,
    apartamento_id: Option<i64>,
) -> Result<Despesa, AppError> {
    if valor_centavos < 0 {
        return Err(AppError::Validation("Valor inválido.".into()));
    }
    let pool = state.db_pool.clone();
    let despesa = sqlx::query_as::<_, Despesa>(
        r#"
        INSERT INTO despesa (descricao, valor_centavos, vencimento, pago, apartamento_id)
        VALUES ($1, $2, $3, 'NAO', $4)
        RETURNING *
        "#,
    )
    .bind(descricao)
    .bind(valor_centavos)
    .bind(vencimento)
    .bind(apartamento_id)
    .fetch_one(&pool)
    .await?;
    log::info!("Despesa created: {:?}", despesa);
    Ok(despesa)
}

pub async fn update_despesa(
    state: &AppState,
    id: i64,
    descricao: String,
    valor_centavos: i64,
    vencimento: String,
    apartamento_id: Option<i64>,
) -> Result<Despesa, AppError> {
    if valor_centavos < 0 {
        return Err(AppError::Validation("Valor inválido.".into()));
    }
    let pool = state.db_pool.clone();
    let despesa = sqlx::query_as::<_, Despesa>(
        r#"
        UPDATE despesa
        SET descricao = $1, valor_centavos = $2, vencimento = $3, apartamento_id = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(descricao)
    .bind(valor_centavos)
    .bind(vencimento)
    .bind(apartamento_id)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(despesa)
}

pub async fn delete_despesa(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    sqlx::query("DELETE FROM despesa WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    log::info!("Despesa with id {} deleted", id);
    Ok(())
}

/// Settles an expense: flips `pago` and records one pagamento for the full
/// amount, attributed to `morador_id`, in a single transaction. The UPDATE is
/// guarded on `pago = 'NAO'`, so a stale id or an already-paid expense (or the
/// loser of a concurrent settle) fails before anything is written, and any
/// later failure rolls the flip back.
pub async fn settle_despesa(
    state: &AppState,
    despesa_id: i64,
    morador_id: i64,
) -> Result<Pagamento, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let despesa = sqlx::query_as::<_, Despesa>(
        "UPDATE despesa SET pago = 'SIM' WHERE id = $1 AND pago = 'NAO' RETURNING *",
    )
    .bind(despesa_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(despesa) = despesa else {
        // Dropping the transaction rolls it back.
        return Err(AppError::NotFoundOrAlreadyPaid);
    };

    let pagamento = sqlx::query_as::<_, Pagamento>(
        r#"
        INSERT INTO pagamento (despesa_id, morador_id, valor_pago_centavos, pago_em)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(despesa.id)
    .bind(morador_id)
    .bind(despesa.valor_centavos)
    .bind(now_utc())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    log::info!(
        "Despesa {} quitada por morador {} (pagamento {})",
        despesa.id,
        morador_id,
        pagamento.id
    );
    Ok(pagamento)
}

// Notificacoes

pub async fn send_notificacao(
    state: &AppState,
    morador_id: i64,
    titulo: String,
    mensagem: String,
) -> Result<Notificacao, AppError> {
    let pool = state.db_pool.clone();
    let notificacao = sqlx::query_as::<_, Notificacao>(
        r#"
        INSERT INTO notificacao (morador_id, titulo, mensagem, criada_em, lida)
        VALUES ($1, $2, $3, $4, 'NAO')
        RETURNING *
        "#,
    )
    .bind(morador_id)
    .bind(titulo)
    .bind(mensagem)
    .bind(now_utc())
    .fetch_one(&pool)
    .await?;
    Ok(notificacao)
}

/// Every notification with the recipient's name, newest first (admin history).
pub async fn list_notificacoes_historico(
    state: &AppState,
) -> Result<Vec<NotificacaoLinha>, AppError> {
    let pool = state.db_pool.clone();
    let linhas = sqlx::query_as::<_, NotificacaoLinha>(
        r#"
        SELECT n.id,
               m.nome AS morador,
               n.titulo,
               n.mensagem,
               strftime('%d/%m/%Y %H:%M', n.criada_em) AS criada_em,
               n.lida
        FROM notificacao n
        JOIN morador m ON m.id = n.morador_id
        ORDER BY n.criada_em DESC, n.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(linhas)
}

pub async fn list_notificacoes_do_morador(
    state: &AppState,
    morador_id: i64,
) -> Result<Vec<Notificacao>, AppError> {
    let pool = state.db_pool.clone();
    let notas = sqlx::query_as::<_, Notificacao>(
        r#"
        SELECT id, morador_id, titulo, mensagem,
               strftime('%d/%m/%Y %H:%M', criada_em) AS criada_em,
               lida
        FROM notificacao
        WHERE morador_id = $1
        ORDER BY criada_em DESC, id DESC
        "#,
    )
    .bind(morador_id)
    .fetch_all(&pool)
    .await?;
    Ok(notas)
}

/// Silent no-op unless `morador_id` owns the notification.
pub async fn mark_notificacao_lida(
    state: &AppState,
    id: i64,
    morador_id: i64,
) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    sqlx::query("UPDATE notificacao SET lida = 'SIM' WHERE id = $1 AND morador_id = $2")
        .bind(id)
        .bind(morador_id)
        .execute(&pool)
        .await?;
    Ok(())
}

pub async fn delete_notificacao(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    sqlx::query("DELETE FROM notificacao WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    Ok(())
}

// Bootstrap

/// Idempotent: creates the fixed síndico account only when none exists yet.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM morador WHERE papel = 'SINDICO' LIMIT 1")
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        log::info!("Síndico já existe, nada a fazer.");
        return Ok(());
    }
    let senha_hash = utils::hash_password("1234")?;
    sqlx::query(
        "INSERT INTO morador (nome, email, senha_hash, papel) VALUES ($1, $2, $3, 'SINDICO')",
    )
    .bind("Gru")
    .bind("admin@condo.local")
    .bind(senha_hash)
    .execute(&pool)
    .await?;
    log::info!("Usuário síndico criado (email: admin@condo.local)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Papel, SimNao};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn test_state() -> AppState {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        // One connection: an in-memory database exists per connection.
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .unwrap();
        sqlx::migrate!().run(&db_pool).await.unwrap();
        AppState { db_pool }
    }

    async fn count(state: &AppState, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&state.db_pool)
            .await
            .unwrap()
    }

    fn novo_morador(nome: &str, email: &str, apartamento_id: Option<i64>) -> NovoMorador {
        NovoMorador {
            nome: nome.into(),
            email: email.into(),
            telefone: None,
            profissao: None,
            senha: "1234".into(),
            papel: Papel::Morador,
            apartamento_id,
        }
    }

    #[tokio::test]
    async fn duplicate_numero_bloco_is_rejected() {
        let state = test_state().await;
        create_apartamento(&state, "101".into(), Some("A".into()), Some(1))
            .await
            .unwrap();
        let err = create_apartamento(&state, "101".into(), Some("A".into()), Some(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Uniqueness(_)));
        assert_eq!(count(&state, "apartamento").await, 1);
    }

    #[tokio::test]
    async fn same_numero_in_another_bloco_is_fine() {
        let state = test_state().await;
        create_apartamento(&state, "101".into(), Some("A".into()), None)
            .await
            .unwrap();
        create_apartamento(&state, "101".into(), Some("B".into()), None)
            .await
            .unwrap();
        assert_eq!(count(&state, "apartamento").await, 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let state = test_state().await;
        let primeiro = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let err = create_morador(&state, novo_morador("Beto", "a@x.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Uniqueness(_)));
        let intacto = get_morador(&state, primeiro.id).await.unwrap().unwrap();
        assert_eq!(intacto.nome, "Ana");
        assert_eq!(count(&state, "morador").await, 1);
    }

    #[tokio::test]
    async fn morador_requires_nome_email_senha() {
        let state = test_state().await;
        let sem_nome = novo_morador("", "a@x.com", None);
        assert!(matches!(
            create_morador(&state, sem_nome).await.unwrap_err(),
            AppError::Validation(_)
        ));
        let mut sem_senha = novo_morador("Ana", "a@x.com", None);
        sem_senha.senha = String::new();
        assert!(matches!(
            create_morador(&state, sem_senha).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert_eq!(count(&state, "morador").await, 0);
    }

    #[tokio::test]
    async fn plaintext_password_is_never_stored() {
        let state = test_state().await;
        let m = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        assert_ne!(m.senha_hash, "1234");
        assert!(utils::verify_password("1234", &m.senha_hash));
    }

    #[tokio::test]
    async fn update_morador_email_collision_with_other_row() {
        let state = test_state().await;
        create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let beto = create_morador(&state, novo_morador("Beto", "b@x.com", None))
            .await
            .unwrap();
        let campos = MoradorAtualizado {
            nome: "Beto".into(),
            email: "a@x.com".into(),
            telefone: None,
            profissao: None,
            papel: Papel::Morador,
            apartamento_id: None,
        };
        let err = update_morador(&state, beto.id, campos).await.unwrap_err();
        assert!(matches!(err, AppError::Uniqueness(_)));
    }

    #[tokio::test]
    async fn settle_flips_flag_and_records_one_payment() {
        let state = test_state().await;
        let apt = create_apartamento(&state, "101".into(), Some("A".into()), None)
            .await
            .unwrap();
        let morador = create_morador(&state, novo_morador("Ana", "a@x.com", Some(apt.id)))
            .await
            .unwrap();
        let despesa = create_despesa(
            &state,
            "Taxa condominial".into(),
            15000,
            "2024-01-05".into(),
            Some(apt.id),
        )
        .await
        .unwrap();
        assert_eq!(despesa.pago, SimNao::Nao);

        let pagamento = settle_despesa(&state, despesa.id, morador.id).await.unwrap();
        assert_eq!(pagamento.despesa_id, despesa.id);
        assert_eq!(pagamento.morador_id, morador.id);
        assert_eq!(pagamento.valor_pago_centavos, 15000);
        assert_eq!(count(&state, "pagamento").await, 1);

        let linhas = list_despesas(&state).await.unwrap();
        assert_eq!(linhas[0].pago, SimNao::Sim);
    }

    #[tokio::test]
    async fn settle_twice_fails_and_adds_no_payment() {
        let state = test_state().await;
        let morador = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let despesa = create_despesa(&state, "Luz".into(), 5000, "2024-02-01".into(), None)
            .await
            .unwrap();
        settle_despesa(&state, despesa.id, morador.id).await.unwrap();
        let err = settle_despesa(&state, despesa.id, morador.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrAlreadyPaid));
        assert_eq!(count(&state, "pagamento").await, 1);
    }

    #[tokio::test]
    async fn settle_unknown_despesa_fails() {
        let state = test_state().await;
        let morador = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let err = settle_despesa(&state, 999, morador.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrAlreadyPaid));
        assert_eq!(count(&state, "pagamento").await, 0);
    }

    #[tokio::test]
    async fn settle_rolls_back_flag_when_payment_insert_fails() {
        let state = test_state().await;
        let despesa = create_despesa(&state, "Água".into(), 8000, "2024-03-01".into(), None)
            .await
            .unwrap();
        // A payer id that violates the foreign key makes the insert fail
        // after the flag was already flipped inside the transaction.
        let err = settle_despesa(&state, despesa.id, 999).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(count(&state, "pagamento").await, 0);
        let linhas = list_despesas(&state).await.unwrap();
        assert_eq!(linhas[0].pago, SimNao::Nao);
    }

    #[tokio::test]
    async fn mark_lida_by_non_owner_is_a_no_op() {
        let state = test_state().await;
        let ana = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let beto = create_morador(&state, novo_morador("Beto", "b@x.com", None))
            .await
            .unwrap();
        let nota = send_notificacao(&state, ana.id, "Aviso".into(), "Reunião às 19h".into())
            .await
            .unwrap();
        assert_eq!(nota.lida, SimNao::Nao);

        mark_notificacao_lida(&state, nota.id, beto.id).await.unwrap();
        let notas = list_notificacoes_do_morador(&state, ana.id).await.unwrap();
        assert_eq!(notas[0].lida, SimNao::Nao);

        mark_notificacao_lida(&state, nota.id, ana.id).await.unwrap();
        let notas = list_notificacoes_do_morador(&state, ana.id).await.unwrap();
        assert_eq!(notas[0].lida, SimNao::Sim);
    }

    #[tokio::test]
    async fn historico_joins_recipient_name_newest_first() {
        let state = test_state().await;
        let ana = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        send_notificacao(&state, ana.id, "Primeiro".into(), "m1".into())
            .await
            .unwrap();
        send_notificacao(&state, ana.id, "Segundo".into(), "m2".into())
            .await
            .unwrap();
        let historico = list_notificacoes_historico(&state).await.unwrap();
        assert_eq!(historico.len(), 2);
        assert_eq!(historico[0].titulo, "Segundo");
        assert_eq!(historico[0].morador, "Ana");
    }

    #[tokio::test]
    async fn deleting_apartamento_leaves_no_orphans() {
        let state = test_state().await;
        let apt = create_apartamento(&state, "101".into(), Some("A".into()), None)
            .await
            .unwrap();
        let morador = create_morador(&state, novo_morador("Ana", "a@x.com", Some(apt.id)))
            .await
            .unwrap();
        let despesa = create_despesa(&state, "Gás".into(), 3000, "2024-04-01".into(), Some(apt.id))
            .await
            .unwrap();
        settle_despesa(&state, despesa.id, morador.id).await.unwrap();
        send_notificacao(&state, morador.id, "Aviso".into(), "msg".into())
            .await
            .unwrap();

        delete_apartamento(&state, apt.id).await.unwrap();

        for table in ["apartamento", "morador", "despesa", "pagamento", "notificacao"] {
            assert_eq!(count(&state, table).await, 0, "orphan rows in {table}");
        }
    }

    #[tokio::test]
    async fn deleting_morador_cascades_to_their_rows() {
        let state = test_state().await;
        let morador = create_morador(&state, novo_morador("Ana", "a@x.com", None))
            .await
            .unwrap();
        let despesa = create_despesa(&state, "Luz".into(), 100, "2024-05-01".into(), None)
            .await
            .unwrap();
        settle_despesa(&state, despesa.id, morador.id).await.unwrap();
        send_notificacao(&state, morador.id, "Aviso".into(), "msg".into())
            .await
            .unwrap();

        delete_morador(&state, morador.id).await.unwrap();

        assert_eq!(count(&state, "pagamento").await, 0);
        assert_eq!(count(&state, "notificacao").await, 0);
        // The expense itself belongs to the apartment, not the resident.
        assert_eq!(count(&state, "despesa").await, 1);
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let state = test_state().await;
        seed_admin(&state).await.unwrap();
        seed_admin(&state).await.unwrap();
        let sindicos: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM morador WHERE papel = 'SINDICO'")
                .fetch_one(&state.db_pool)
                .await
                .unwrap();
        assert_eq!(sindicos, 1);

        let admin = find_morador_by_email(&state, "admin@condo.local")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.papel, Papel::Sindico);
        assert!(utils::verify_password("1234", &admin.senha_hash));
    }
}
