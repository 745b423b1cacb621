use actix_web::{middleware, web, App, HttpServer};

use deckmark::{db, handlers, mirror, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    std::fs::create_dir_all("data").expect("Failed to create data directory");

    let pool = db::init_pool("data/app.db");
    db::run_migrations(&pool);

    let mirror_pool = mirror::init_pool("data/mirror.db");
    mirror::run_migrations(&mirror_pool);

    let state = AppState {
        pool,
        mirror: mirror_pool,
    };

    log::info!("Starting server at http://127.0.0.1:8080");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .route("/", web::get().to(handlers::presentation_handlers::index))
            .route(
                "/presentations",
                web::post().to(handlers::presentation_handlers::upload),
            )
            .route(
                "/presentations/{id}",
                web::get().to(handlers::presentation_handlers::review),
            )
            .route(
                "/presentations/{id}/annotations",
                web::get().to(handlers::presentation_handlers::annotations),
            )
            .route(
                "/presentations/{id}/submit",
                web::post().to(handlers::presentation_handlers::submit),
            )
            .route(
                "/slides/{id}/image",
                web::get().to(handlers::slide_handlers::image),
            )
            .route(
                "/slides/{id}/annotations",
                web::post().to(handlers::slide_handlers::save_annotations),
            )
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound()
                    .content_type("text/html; charset=utf-8")
                    .body("<h1>404 Not Found</h1>")
            }))
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}
