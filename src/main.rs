#[macro_use]
extern crate lazy_static;

use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};

use std::{env, str::FromStr};
use tera::Tera;

use actix_files::{Files, NamedFile};
use actix_web::{
    cookie::Key,
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

mod db;
mod errors;
mod models;
mod money;
mod reports;
mod routes;
mod session;
mod utils;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html", ".sql"]);
        tera
    };
}

fn get_session_key() -> Key {
    let key_str = env::var("SESSION_KEY").unwrap_or_else(|_| {
        log::error!("FATAL: SESSION_KEY environment variable not set");
        std::process::exit(1);
    });
    Key::from(key_str.as_bytes())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url = "sqlite://condominio.db".to_string();

    let opts = SqliteConnectOptions::from_str(&database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // Cascade deletes depend on SQLite actually enforcing foreign keys.
        .foreign_keys(true)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Database migrated successfully");

    let state = AppState {
        db_pool: db_pool.clone(),
    };
    db::seed_admin(&state).await?;

    info!("Starting HTTP server on http://localhost:8080/");

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                get_session_key(),
            ))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .service(routes::index_handler)
            .service(routes::login_handler)
            .service(routes::login_form_handler)
            .service(routes::logout_handler)
            .service(routes::apartamentos_handler)
            .service(routes::apartamento_create_handler)
            .service(routes::apartamento_update_handler)
            .service(routes::apartamento_delete_handler)
            .service(routes::moradores_handler)
            .service(routes::morador_create_handler)
            .service(routes::morador_update_handler)
            .service(routes::morador_delete_handler)
            .service(routes::despesas_handler)
            .service(routes::despesa_create_handler)
            // literal path must come before the {id} routes
            .service(routes::despesas_export_handler)
            .service(routes::despesa_update_handler)
            .service(routes::despesa_delete_handler)
            .service(routes::despesa_quitar_handler)
            .service(routes::notificacoes_handler)
            .service(routes::notificacao_send_handler)
            .service(routes::notificacao_lida_handler)
            .service(routes::notificacao_delete_handler)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
            }))
            .default_service(web::to(default_handler))
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
