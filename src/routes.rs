use actix_identity::Identity;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use serde::Deserialize;
use tera::Context;

use crate::{
    db,
    errors::AppError,
    models::{MoradorAtualizado, NovoMorador, Papel},
    money, reports,
    session::{self, Sessao},
    utils, AppState, TEMPLATES,
};

fn redirect(to: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", to))
        .finish()
}

fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::Template(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

fn base_context(title: &str, sessao: Option<&Sessao>, erro: Option<&str>) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("sessao", &sessao);
    context.insert("erro", &erro);
    context
}

fn opt_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Form selects submit "" or "0" for "no apartment".
fn opt_id(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().filter(|id| *id != 0)
}

#[get("/")]
pub async fn index_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    match sessao.papel {
        Papel::Sindico => Ok(redirect("/apartamentos")),
        Papel::Morador => Ok(redirect("/notificacoes")),
    }
}

// Login

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    senha: String,
}

#[get("/login")]
pub async fn login_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    if session::current_user(&state, identity).await?.is_some() {
        return Ok(redirect("/"));
    }
    let context = base_context("Login", None, None);
    render("login.html", &context)
}

#[post("/login")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let morador = db::find_morador_by_email(&state, form.email.trim()).await?;
    match morador {
        Some(m) if utils::verify_password(&form.senha, &m.senha_hash) => {
            Identity::login(&request.extensions(), m.id.to_string())
                .map_err(|e| AppError::Session(e.to_string()))?;
            log::info!("Login: morador {} ({:?})", m.id, m.papel);
            Ok(redirect("/"))
        }
        _ => {
            let mut context = base_context("Login", None, Some("Credenciais inválidas."));
            context.insert("email", &form.email);
            render("login.html", &context)
        }
    }
}

#[post("/logout")]
pub async fn logout_handler(user: Identity) -> impl Responder {
    user.logout();
    redirect("/login")
}

// Apartamentos (síndico only)

#[derive(Deserialize)]
pub struct ApartamentoForm {
    numero: String,
    bloco: String,
    andar: String,
}

async fn render_apartamentos(
    state: &AppState,
    sessao: &Sessao,
    erro: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let apartamentos = db::list_apartamentos(state).await?;
    let mut context = base_context("Apartamentos", Some(sessao), erro);
    context.insert("apartamentos", &apartamentos);
    render("apartamentos.html", &context)
}

#[get("/apartamentos")]
pub async fn apartamentos_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    render_apartamentos(&state, &sessao, None).await
}

#[post("/apartamentos")]
pub async fn apartamento_create_handler(
    web::Form(form): web::Form<ApartamentoForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let andar = form.andar.trim().parse::<i64>().ok();
    match db::create_apartamento(&state, form.numero, opt_text(form.bloco), andar).await {
        Ok(_) => Ok(redirect("/apartamentos")),
        Err(e) if e.is_recoverable() => {
            render_apartamentos(&state, &sessao, Some(&e.to_string())).await
        }
        Err(e) => Err(e),
    }
}

#[post("/apartamentos/{id}")]
pub async fn apartamento_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<ApartamentoForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let andar = form.andar.trim().parse::<i64>().ok();
    match db::update_apartamento(
        &state,
        path.into_inner(),
        form.numero,
        opt_text(form.bloco),
        andar,
    )
    .await
    {
        Ok(_) => Ok(redirect("/apartamentos")),
        Err(e) if e.is_recoverable() => {
            render_apartamentos(&state, &sessao, Some(&e.to_string())).await
        }
        Err(e) => Err(e),
    }
}

#[post("/apartamentos/{id}/excluir")]
pub async fn apartamento_delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    db::delete_apartamento(&state, path.into_inner()).await?;
    Ok(redirect("/apartamentos"))
}

// Moradores (síndico only)

#[derive(Deserialize)]
pub struct MoradorForm {
    nome: String,
    email: String,
    telefone: String,
    profissao: String,
    senha: String,
    papel: Papel,
    apartamento_id: String,
}

#[derive(Deserialize)]
pub struct MoradorEditForm {
    nome: String,
    email: String,
    telefone: String,
    profissao: String,
    papel: Papel,
    apartamento_id: String,
}

async fn render_moradores(
    state: &AppState,
    sessao: &Sessao,
    erro: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let moradores = db::list_moradores(state).await?;
    let apartamentos = db::list_apartamentos(state).await?;
    let mut context = base_context("Moradores", Some(sessao), erro);
    context.insert("moradores", &moradores);
    context.insert("apartamentos", &apartamentos);
    render("moradores.html", &context)
}

#[get("/moradores")]
pub async fn moradores_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    render_moradores(&state, &sessao, None).await
}

#[post("/moradores")]
pub async fn morador_create_handler(
    web::Form(form): web::Form<MoradorForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let novo = NovoMorador {
        nome: form.nome,
        email: form.email,
        telefone: opt_text(form.telefone),
        profissao: opt_text(form.profissao),
        senha: form.senha,
        papel: form.papel,
        apartamento_id: opt_id(&form.apartamento_id),
    };
    match db::create_morador(&state, novo).await {
        Ok(_) => Ok(redirect("/moradores")),
        Err(e) if e.is_recoverable() => {
            render_moradores(&state, &sessao, Some(&e.to_string())).await
        }
        Err(e) => Err(e),
    }
}

#[post("/moradores/{id}")]
pub async fn morador_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<MoradorEditForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let campos = MoradorAtualizado {
        nome: form.nome,
        email: form.email,
        telefone: opt_text(form.telefone),
        profissao: opt_text(form.profissao),
        papel: form.papel,
        apartamento_id: opt_id(&form.apartamento_id),
    };
    match db::update_morador(&state, path.into_inner(), campos).await {
        Ok(_) => Ok(redirect("/moradores")),
        Err(e) if e.is_recoverable() => {
            render_moradores(&state, &sessao, Some(&e.to_string())).await
        }
        Err(e) => Err(e),
    }
}

#[post("/moradores/{id}/excluir")]
pub async fn morador_delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    db::delete_morador(&state, path.into_inner()).await?;
    Ok(redirect("/moradores"))
}

// Despesas (síndico only)

#[derive(Deserialize)]
pub struct DespesaForm {
    descricao: String,
    valor: String,
    vencimento: String,
    apartamento_id: String,
}

#[derive(Deserialize)]
pub struct ExportarQuery {
    formato: String,
}

async fn render_despesas(
    state: &AppState,
    sessao: &Sessao,
    erro: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let despesas = db::list_despesas(state).await?;
    let apartamentos = db::list_apartamentos(state).await?;
    let mut context = base_context("Despesas", Some(sessao), erro);
    context.insert("despesas", &despesas);
    context.insert("apartamentos", &apartamentos);
    render("despesas.html", &context)
}

#[get("/despesas")]
pub async fn despesas_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    render_despesas(&state, &sessao, None).await
}

#[post("/despesas")]
pub async fn despesa_create_handler(
    web::Form(form): web::Form<DespesaForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let Some(valor_centavos) = money::parse_centavos(&form.valor) else {
        return render_despesas(&state, &sessao, Some("Valor inválido.")).await;
    };
    match db::create_despesa(
        &state,
        form.descricao,
        valor_centavos,
        form.vencimento,
        opt_id(&form.apartamento_id),
    )
    .await
    {
        Ok(_) => Ok(redirect("/despesas")),
        Err(e) if e.is_recoverable() => render_despesas(&state, &sessao, Some(&e.to_string())).await,
        Err(e) => Err(e),
    }
}

#[post("/despesas/{id}")]
pub async fn despesa_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<DespesaForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let Some(valor_centavos) = money::parse_centavos(&form.valor) else {
        return render_despesas(&state, &sessao, Some("Valor inválido.")).await;
    };
    match db::update_despesa(
        &state,
        path.into_inner(),
        form.descricao,
        valor_centavos,
        form.vencimento,
        opt_id(&form.apartamento_id),
    )
    .await
    {
        Ok(_) => Ok(redirect("/despesas")),
        Err(e) if e.is_recoverable() => render_despesas(&state, &sessao, Some(&e.to_string())).await,
        Err(e) => Err(e),
    }
}

#[post("/despesas/{id}/excluir")]
pub async fn despesa_delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    db::delete_despesa(&state, path.into_inner()).await?;
    Ok(redirect("/despesas"))
}

#[post("/despesas/{id}/quitar")]
pub async fn despesa_quitar_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    // The payment is attributed to whoever settled the expense.
    match db::settle_despesa(&state, path.into_inner(), sessao.id).await {
        Ok(_) => Ok(redirect("/despesas")),
        Err(e) if e.is_recoverable() => render_despesas(&state, &sessao, Some(&e.to_string())).await,
        Err(e) => Err(e),
    }
}

#[get("/despesas/exportar")]
pub async fn despesas_export_handler(
    query: web::Query<ExportarQuery>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    let despesas = db::list_despesas(&state).await?;
    let (nome_arquivo, caminho) = match query.formato.as_str() {
        "CSV" => {
            let caminho = std::env::temp_dir().join("despesas.csv");
            reports::despesas_csv(&despesas, &caminho)?;
            ("despesas.csv", caminho)
        }
        "PDF" => {
            let caminho = std::env::temp_dir().join("despesas.pdf");
            reports::despesas_pdf(&despesas, &caminho)?;
            ("despesas.pdf", caminho)
        }
        _ => return Err(AppError::Validation("Formato desconhecido.".into())),
    };
    let bytes = std::fs::read(&caminho)?;
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .append_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", nome_arquivo),
        ))
        .body(bytes))
}

// Notificações (both roles; content depends on papel)

#[derive(Deserialize)]
pub struct NotificacaoForm {
    morador_id: i64,
    titulo: String,
    mensagem: String,
}

async fn render_notificacoes(
    state: &AppState,
    sessao: &Sessao,
    erro: Option<&str>,
) -> Result<HttpResponse, AppError> {
    let mut context = base_context("Notificações", Some(sessao), erro);
    match sessao.papel {
        Papel::Sindico => {
            context.insert("moradores", &db::list_moradores(state).await?);
            context.insert("historico", &db::list_notificacoes_historico(state).await?);
        }
        Papel::Morador => {
            context.insert(
                "notas",
                &db::list_notificacoes_do_morador(state, sessao.id).await?,
            );
        }
    }
    render("notificacoes.html", &context)
}

#[get("/notificacoes")]
pub async fn notificacoes_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    render_notificacoes(&state, &sessao, None).await
}

#[post("/notificacoes")]
pub async fn notificacao_send_handler(
    web::Form(form): web::Form<NotificacaoForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    db::send_notificacao(&state, form.morador_id, form.titulo, form.mensagem).await?;
    Ok(redirect("/notificacoes"))
}

#[post("/notificacoes/{id}/lida")]
pub async fn notificacao_lida_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    // Ownership is enforced by the update itself; a mismatch is a no-op.
    db::mark_notificacao_lida(&state, path.into_inner(), sessao.id).await?;
    Ok(redirect("/notificacoes"))
}

#[post("/notificacoes/{id}/excluir")]
pub async fn notificacao_delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(sessao) = session::current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    session::require_sindico(&sessao)?;
    db::delete_notificacao(&state, path.into_inner()).await?;
    Ok(redirect("/notificacoes"))
}
