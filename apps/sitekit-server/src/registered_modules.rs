// Compiled-in module catalog.
// Every module the server can load is declared here; requesting anything else fails
// at composition time with `UnknownModule`.

use http::Method;
use modkit::config::DATABASE_PATH;
use modkit::{CompositionError, ModuleCtx, ModuleDecl, ModuleRegistry, Route};

/// Build the catalog of site modules.
///
/// # Errors
/// Returns `CompositionError` if a declaration is invalid.
pub fn catalog() -> Result<ModuleRegistry, CompositionError> {
    let mut builder = ModuleRegistry::builder();
    builder
        .register(database())
        .register(auth())
        .register(dashboard())
        .register(main_pages())
        .register(chat())
        .register(blog())
        .register(gallery())
        .register(contact());
    builder.build()
}

fn database() -> ModuleDecl {
    ModuleDecl::new("database").on_register(|ctx: &ModuleCtx<'_>| {
        let path = ctx.config().get_str(DATABASE_PATH).unwrap_or("app.db");
        tracing::info!(path, "Database backend ready");
        Ok(())
    })
}

fn auth() -> ModuleDecl {
    ModuleDecl::new("auth")
        .depends_on(["database"])
        .route(Route::get("/register", "register").method(Method::POST))
        .route(Route::get("/login", "login").method(Method::POST))
        .route(Route::get("/logout", "logout"))
        .default("SESSION_COOKIE_NAME", "sitekit_session")
}

fn dashboard() -> ModuleDecl {
    ModuleDecl::new("dashboard")
        .route(Route::get("/dashboard", "dashboard"))
        .route(Route::get("/", "dashboard"))
        .on_register(|ctx: &ModuleCtx<'_>| {
            let variant = ctx
                .config()
                .get_str(modkit::config::DASHBOARD_TYPE)
                .unwrap_or(modkit::config::DEFAULT_DASHBOARD_TYPE);
            tracing::info!(variant, "Dashboard variant selected");
            Ok(())
        })
}

fn main_pages() -> ModuleDecl {
    ModuleDecl::new("main")
        .route(Route::get("/", "index"))
        .route(Route::get("/home", "index"))
        .route(Route::get("/about", "about"))
}

fn chat() -> ModuleDecl {
    ModuleDecl::new("chat")
        .depends_on(["database"])
        .route(Route::get("/chat", "chat_home"))
        .route(Route::get("/chat/room/<int:room_id>", "chat_room"))
        .route(Route::post("/chat/api/send", "send_message"))
        .route(Route::get("/chat/direct", "direct_messages"))
        .default("CHAT_DEFAULT_ROOM", 1)
}

fn blog() -> ModuleDecl {
    ModuleDecl::new("blog")
        .depends_on(["auth", "database"])
        .route(Route::get("/blog", "blog_home"))
        .route(Route::get("/blog/post/<int:post_id>", "blog_post"))
        .route(Route::get("/blog/category/<category_name>", "blog_category"))
        .route(Route::get("/blog/write", "blog_write").method(Method::POST))
        .route(Route::get("/blog/search", "blog_search"))
        .default("BLOG_POSTS_PER_PAGE", 10)
        .on_register(|ctx: &ModuleCtx<'_>| {
            if !ctx.capabilities().is_active("auth") {
                anyhow::bail!("blog requires the auth module to be active");
            }
            Ok(())
        })
}

fn gallery() -> ModuleDecl {
    ModuleDecl::new("gallery")
        .depends_on(["database"])
        .route(Route::get("/gallery", "gallery_home"))
        .route(Route::get("/gallery/image/<int:image_id>", "gallery_image"))
}

fn contact() -> ModuleDecl {
    ModuleDecl::new("contact").route(Route::get("/contact", "contact").method(Method::POST))
}
